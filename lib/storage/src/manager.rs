use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use phenorank_core::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::loader::DatasetLoader;
use crate::snapshot::SnapshotManager;

const SNAPSHOT_NAME: &str = "catalog";

enum CatalogState {
    Ready(Arc<Catalog>),
    // startup failure, reported on every request until a reload succeeds
    Unavailable(String),
}

/// Catalog counts or the reason it is unavailable
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub available: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub terms: usize,
    pub records: usize,
    pub diseases: usize,
    pub titles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Owns the current catalog and swaps it on reload
pub struct CatalogManager {
    loader: Arc<dyn DatasetLoader>,
    snapshots: Option<SnapshotManager>,
    state: RwLock<CatalogState>,
}

impl CatalogManager {
    /// Load the initial catalog. A failure is cached, not returned.
    pub fn new(loader: Arc<dyn DatasetLoader>) -> Self {
        Self::with_snapshots(loader, None)
    }

    /// Like [`CatalogManager::new`], also writing a snapshot after every successful load
    pub fn with_snapshots(loader: Arc<dyn DatasetLoader>, snapshots: Option<SnapshotManager>) -> Self {
        let manager = Self {
            loader,
            snapshots,
            state: RwLock::new(CatalogState::Unavailable("catalog not loaded".to_string())),
        };

        match manager.build() {
            Ok(catalog) => *manager.state.write() = CatalogState::Ready(catalog),
            Err(e) => {
                warn!(source = %manager.loader.describe(), error = %e, "dataset unavailable");
                *manager.state.write() = CatalogState::Unavailable(e.to_string());
            }
        }
        manager
    }

    fn build(&self) -> anyhow::Result<Arc<Catalog>> {
        let dataset = self.loader.load()?;

        if let Some(snapshots) = &self.snapshots {
            // a failed snapshot write never blocks serving the fresh data
            if let Err(e) = snapshots.create_snapshot(SNAPSHOT_NAME, &dataset) {
                warn!(error = %e, "failed to write catalog snapshot");
            }
        }

        Ok(Arc::new(Catalog::build(dataset, &self.loader.describe())))
    }

    /// Current catalog handle, or `DatasetUnavailable`
    pub fn current(&self) -> Result<Arc<Catalog>> {
        match &*self.state.read() {
            CatalogState::Ready(catalog) => Ok(Arc::clone(catalog)),
            CatalogState::Unavailable(reason) => Err(Error::DatasetUnavailable(reason.clone())),
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(&*self.state.read(), CatalogState::Ready(_))
    }

    /// Rebuild from the loader and swap; on failure the previous state stays
    pub fn reload(&self) -> Result<Arc<Catalog>> {
        info!(source = %self.loader.describe(), "reloading catalog");
        match self.build() {
            Ok(catalog) => {
                *self.state.write() = CatalogState::Ready(Arc::clone(&catalog));
                info!("catalog reloaded");
                Ok(catalog)
            }
            Err(e) => {
                warn!(error = %e, "reload failed, keeping previous catalog");
                Err(Error::DatasetUnavailable(e.to_string()))
            }
        }
    }

    pub fn status(&self) -> CatalogStatus {
        match &*self.state.read() {
            CatalogState::Ready(catalog) => CatalogStatus {
                available: true,
                source: catalog.source().to_string(),
                reason: None,
                terms: catalog.index().len(),
                records: catalog.store().len(),
                diseases: catalog.store().disease_count(),
                titles: catalog.titles().len(),
                loaded_at: Some(catalog.loaded_at()),
            },
            CatalogState::Unavailable(reason) => CatalogStatus {
                available: false,
                source: self.loader.describe(),
                reason: Some(reason.clone()),
                terms: 0,
                records: 0,
                diseases: 0,
                titles: 0,
                loaded_at: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use phenorank_core::{AnnotationRecord, FrequencyBand};
    use tempfile::TempDir;

    /// Hands out queued results, one per load
    struct ScriptedLoader {
        results: Mutex<Vec<anyhow::Result<Dataset>>>,
    }

    impl ScriptedLoader {
        fn new(mut results: Vec<anyhow::Result<Dataset>>) -> Arc<Self> {
            results.reverse();
            Arc::new(Self {
                results: Mutex::new(results),
            })
        }
    }

    impl DatasetLoader for ScriptedLoader {
        fn load(&self) -> anyhow::Result<Dataset> {
            self.results
                .lock()
                .pop()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn dataset(rows: usize) -> Dataset {
        Dataset {
            records: (0..rows)
                .map(|i| {
                    AnnotationRecord::new(
                        &format!("HP:{}", i),
                        &format!("term {}", i),
                        "OMIM:1",
                        FrequencyBand::Frequent,
                    )
                })
                .collect(),
            ..Dataset::default()
        }
    }

    #[test]
    fn test_failed_startup_is_cached() {
        let manager = CatalogManager::new(ScriptedLoader::new(vec![Err(anyhow!("file missing"))]));
        assert!(!manager.is_available());
        for _ in 0..3 {
            match manager.current() {
                Err(Error::DatasetUnavailable(reason)) => assert!(reason.contains("file missing")),
                other => panic!("unexpected: {:?}", other.map(|_| ())),
            }
        }
        let status = manager.status();
        assert!(!status.available);
        assert_eq!(status.records, 0);
    }

    #[test]
    fn test_reload_swaps_catalog() {
        let manager = CatalogManager::new(ScriptedLoader::new(vec![Ok(dataset(1)), Ok(dataset(3))]));
        let before = manager.current().unwrap();
        assert_eq!(before.store().len(), 1);

        manager.reload().unwrap();
        assert_eq!(manager.current().unwrap().store().len(), 3);
        // the old handle is still a complete snapshot
        assert_eq!(before.store().len(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let manager = CatalogManager::new(ScriptedLoader::new(vec![Ok(dataset(2)), Err(anyhow!("bad file"))]));
        assert!(matches!(manager.reload(), Err(Error::DatasetUnavailable(_))));
        assert_eq!(manager.current().unwrap().store().len(), 2);
        assert!(manager.status().available);
    }

    #[test]
    fn test_reload_recovers_from_failed_startup() {
        let manager = CatalogManager::new(ScriptedLoader::new(vec![Err(anyhow!("not yet")), Ok(dataset(2))]));
        assert!(manager.current().is_err());
        manager.reload().unwrap();
        assert_eq!(manager.status().terms, 2);
    }

    #[test]
    fn test_snapshot_written_on_load() {
        let dir = TempDir::new().unwrap();
        let snapshots = SnapshotManager::new(dir.path()).unwrap();
        let manager = CatalogManager::with_snapshots(ScriptedLoader::new(vec![Ok(dataset(2))]), Some(snapshots));
        assert!(manager.is_available());

        let listed = SnapshotManager::new(dir.path()).unwrap().list_snapshots().unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_reloads_respect_snapshot_retention() {
        let dir = TempDir::new().unwrap();
        let snapshots = SnapshotManager::new(dir.path()).unwrap().with_retention(Some(2));
        let loader = ScriptedLoader::new((1..=4).map(|n| Ok(dataset(n))).collect());
        let manager = CatalogManager::with_snapshots(loader, Some(snapshots));
        for _ in 0..3 {
            manager.reload().unwrap();
        }

        let reader = SnapshotManager::new(dir.path()).unwrap();
        assert_eq!(reader.list_snapshots().unwrap().len(), 2);
        assert_eq!(reader.load_latest().unwrap().map(|d| d.records.len()), Some(4));
    }
}
