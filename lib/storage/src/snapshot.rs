// Compiled dataset snapshots: gzip-compressed JSON with a SHA-256 checksum
use anyhow::{anyhow, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::loader::{Dataset, DatasetLoader};

const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Snapshots kept in the directory unless configured otherwise
pub const DEFAULT_MAX_SNAPSHOTS: usize = 5;

/// Snapshot description for listings and status output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// On-disk payload
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotData {
    name: String,
    created_at: DateTime<Utc>,
    dataset: Dataset,
}

pub struct SnapshotManager {
    snapshot_dir: PathBuf,
    // `None` keeps every snapshot
    max_snapshots: Option<usize>,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self {
            snapshot_dir,
            max_snapshots: Some(DEFAULT_MAX_SNAPSHOTS),
        })
    }

    /// Keep at most `max_snapshots` files after each write; `None` disables pruning
    #[must_use]
    pub fn with_retention(mut self, max_snapshots: Option<usize>) -> Self {
        self.max_snapshots = max_snapshots.map(|n| n.max(1));
        self
    }

    #[inline]
    pub fn max_snapshots(&self) -> Option<usize> {
        self.max_snapshots
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Generate snapshot filename with timestamp
    fn generate_snapshot_name(name: &str, now: DateTime<Utc>) -> String {
        format!("{}-{}.{}", name, now.format("%Y-%m-%d-%H-%M-%S-%9f"), SNAPSHOT_EXTENSION)
    }

    fn checksum(path: &Path) -> Result<String> {
        let file_data = fs::read(path)?;
        Ok(format!("{:x}", Sha256::digest(&file_data)))
    }

    fn describe(path: &Path, name: &str) -> Result<SnapshotDescription> {
        let metadata = fs::metadata(path)?;
        let creation_time = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%dT%H:%M:%SZ").to_string());

        Ok(SnapshotDescription {
            name: name.to_string(),
            creation_time,
            size: metadata.len(),
            checksum: Some(Self::checksum(path)?),
        })
    }

    /// Write `dataset` as a new snapshot; the file appears atomically
    pub fn create_snapshot(&self, name: &str, dataset: &Dataset) -> Result<SnapshotDescription> {
        let now = Utc::now();
        let snapshot_name = Self::generate_snapshot_name(name, now);
        let snapshot_path = self.snapshot_dir.join(&snapshot_name);

        let data = SnapshotData {
            name: name.to_string(),
            created_at: now,
            dataset: dataset.clone(),
        };
        let json_data = serde_json::to_vec(&data)?;

        AtomicFile::new(&snapshot_path, AllowOverwrite).write(|file| {
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            encoder.write_all(&json_data)?;
            encoder.finish()?.flush()
        })?;

        let description = Self::describe(&snapshot_path, &snapshot_name)?;
        info!(
            snapshot = %description.name,
            size = description.size,
            records = dataset.records.len(),
            "snapshot written"
        );

        self.prune()?;
        Ok(description)
    }

    /// Delete the oldest snapshots beyond the retention limit; returns how many went
    pub fn prune(&self) -> Result<usize> {
        let Some(max) = self.max_snapshots else {
            return Ok(0);
        };
        let mut removed = 0;
        for old in self.list_snapshots()?.iter().skip(max) {
            if self.delete_snapshot(&old.name)? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, kept = max, "old snapshots pruned");
        }
        Ok(removed)
    }

    /// List snapshots, newest first
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotDescription>> {
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                snapshots.push(Self::describe(&path, name)?);
            }
        }

        // names carry the timestamp
        snapshots.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(snapshots)
    }

    /// Load a snapshot's dataset by file name
    pub fn load_snapshot(&self, snapshot_name: &str) -> Result<Dataset> {
        let snapshot_path = self.snapshot_path(snapshot_name)
            .ok_or_else(|| anyhow!("Snapshot '{}' not found", snapshot_name))?;

        let file = File::open(&snapshot_path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut json_data = Vec::new();
        decoder.read_to_end(&mut json_data)?;

        let data: SnapshotData = serde_json::from_slice(&json_data)?;
        Ok(data.dataset)
    }

    /// Load the newest snapshot, if any
    pub fn load_latest(&self) -> Result<Option<Dataset>> {
        match self.list_snapshots()?.first() {
            Some(latest) => self.load_snapshot(&latest.name).map(Some),
            None => Ok(None),
        }
    }

    pub fn delete_snapshot(&self, snapshot_name: &str) -> Result<bool> {
        match self.snapshot_path(snapshot_name) {
            Some(path) => {
                fs::remove_file(&path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Path of an existing snapshot; names with path separators are rejected
    pub fn snapshot_path(&self, snapshot_name: &str) -> Option<PathBuf> {
        if snapshot_name.contains(['/', '\\']) || snapshot_name.starts_with('.') {
            return None;
        }
        let path = self.snapshot_dir.join(snapshot_name);
        path.exists().then_some(path)
    }
}

/// Serves a dataset from a snapshot file instead of the source tables
pub struct SnapshotLoader {
    manager: SnapshotManager,
    // `None` picks the newest snapshot on every load
    snapshot_name: Option<String>,
}

impl SnapshotLoader {
    pub fn new(manager: SnapshotManager, snapshot_name: Option<String>) -> Self {
        Self {
            manager,
            snapshot_name,
        }
    }
}

impl DatasetLoader for SnapshotLoader {
    fn load(&self) -> Result<Dataset> {
        match &self.snapshot_name {
            Some(name) => self.manager.load_snapshot(name),
            None => self
                .manager
                .load_latest()?
                .ok_or_else(|| anyhow!("no snapshots in {}", self.manager.dir().display())),
        }
    }

    fn describe(&self) -> String {
        match &self.snapshot_name {
            Some(name) => format!("snapshot {}", name),
            None => format!("latest snapshot in {}", self.manager.dir().display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phenorank_core::{AnnotationRecord, DiseaseEntry, FrequencyBand};
    use tempfile::TempDir;

    fn dataset() -> Dataset {
        Dataset {
            records: vec![
                AnnotationRecord::new("HP:1", "Headache", "OMIM:101", FrequencyBand::VeryFrequent),
                AnnotationRecord::new("HP:2", "Rash", "OMIM:202", FrequencyBand::Occasional)
                    .with_disease_name("Eczema"),
            ],
            titles: vec![DiseaseEntry::new("101", "MIGRAINE")],
            ontology_edges: vec![("HP:1".to_string(), "HP:0".to_string())],
            disease_phenotypes: Vec::new(),
        }
    }

    #[test]
    fn test_snapshot_write_list_load() {
        let dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        let original = dataset();

        let description = manager.create_snapshot("catalog", &original).unwrap();
        assert!(description.name.starts_with("catalog-"));
        assert!(description.size > 0);
        assert_eq!(description.checksum.as_ref().map(String::len), Some(64));

        let listed = manager.list_snapshots().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].checksum, description.checksum);

        let restored = manager.load_snapshot(&description.name).unwrap();
        assert_eq!(restored, original);
        assert_eq!(manager.load_latest().unwrap(), Some(original));
    }

    #[test]
    fn test_retention_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap().with_retention(Some(2));

        let names: Vec<String> = (0..4)
            .map(|_| manager.create_snapshot("catalog", &dataset()).unwrap().name)
            .collect();

        let listed: Vec<String> = manager.list_snapshots().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(listed, vec![names[3].clone(), names[2].clone()]);

        let unbounded = SnapshotManager::new(dir.path()).unwrap().with_retention(None);
        unbounded.create_snapshot("catalog", &dataset()).unwrap();
        assert_eq!(unbounded.list_snapshots().unwrap().len(), 3);
        assert_eq!(manager.prune().unwrap(), 1);
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        assert!(manager.load_snapshot("nope.snapshot").is_err());
        assert!(manager.load_snapshot("../etc/passwd").is_err());
        assert_eq!(manager.load_latest().unwrap(), None);
        assert!(!manager.delete_snapshot("nope.snapshot").unwrap());
    }

    #[test]
    fn test_snapshot_loader() {
        let dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        let written = manager.create_snapshot("catalog", &dataset()).unwrap();

        let latest = SnapshotLoader::new(SnapshotManager::new(dir.path()).unwrap(), None);
        assert_eq!(latest.load().unwrap().records.len(), 2);

        let named = SnapshotLoader::new(manager, Some(written.name));
        assert_eq!(named.load().unwrap(), dataset());

        let empty = TempDir::new().unwrap();
        let none = SnapshotLoader::new(SnapshotManager::new(empty.path()).unwrap(), None);
        assert!(none.load().is_err());
    }
}
