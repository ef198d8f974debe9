// Dataset ingestion from tab-separated source tables
use anyhow::{anyhow, Context, Result};
use phenorank_core::{AnnotationRecord, DiseaseEntry, Error, FrequencyBand};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything a catalog is built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<AnnotationRecord>,
    pub titles: Vec<DiseaseEntry>,
    /// `(child, parent)` is-a edges
    pub ontology_edges: Vec<(String, String)>,
    /// `(disease_id, phenotype_id)` pairs fed to the scorer
    pub disease_phenotypes: Vec<(String, String)>,
}

impl Dataset {
    /// Scorer annotations, falling back to the annotation table's own pairs
    pub fn scoring_annotations(&self) -> Vec<(String, String)> {
        if !self.disease_phenotypes.is_empty() {
            return self.disease_phenotypes.clone();
        }
        self.records
            .iter()
            .map(|r| (r.disease_id.clone(), r.phenotype_id.clone()))
            .collect()
    }
}

/// Source of a [`Dataset`]; called once at startup and on every reload
pub trait DatasetLoader: Send + Sync {
    fn load(&self) -> Result<Dataset>;

    /// Short human-readable origin for logs and status output
    fn describe(&self) -> String;
}

/// Loader over an already built dataset
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    dataset: Dataset,
}

impl InMemoryLoader {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

impl DatasetLoader for InMemoryLoader {
    fn load(&self) -> Result<Dataset> {
        Ok(self.dataset.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} records)", self.dataset.records.len())
    }
}

const COL_TERM: &str = "hpo term";
const COL_ID: &str = "hpo id";
const COL_FREQUENCY: &str = "frequency";
const COL_DISEASE_ID: &str = "disease id";
const COL_DISEASE_NAME: &str = "disease name";

/// Reads the annotation table, MIM titles and optional ontology files
#[derive(Debug, Clone)]
pub struct TsvDatasetLoader {
    annotations: PathBuf,
    mim_titles: PathBuf,
    ontology: Option<PathBuf>,
    disease_phenotypes: Option<PathBuf>,
}

impl TsvDatasetLoader {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(annotations: P, mim_titles: Q) -> Self {
        Self {
            annotations: annotations.as_ref().to_path_buf(),
            mim_titles: mim_titles.as_ref().to_path_buf(),
            ontology: None,
            disease_phenotypes: None,
        }
    }

    #[must_use]
    pub fn with_ontology<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.ontology = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_disease_phenotypes<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.disease_phenotypes = Some(path.as_ref().to_path_buf());
        self
    }

    fn open(path: &Path) -> Result<File> {
        File::open(path).with_context(|| format!("cannot open {}", path.display()))
    }

    /// Tab-separated reader: quoted cells, ragged rows and trimmed fields
    fn tsv_reader<R: Read>(reader: R, has_headers: bool, comments: bool) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(comments.then_some(b'#'))
            .from_reader(reader)
    }

    /// Parse the annotation table; the header row decides the column layout
    pub fn read_annotations<R: Read>(reader: R, source_name: &str) -> Result<Vec<AnnotationRecord>> {
        let mut rdr = Self::tsv_reader(reader, true, false);
        let columns: Vec<String> = rdr.headers()?.iter().map(|c| clean(c).to_lowercase()).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Ok(Vec::new());
        }

        let position = |name: &str| columns.iter().position(|c| c == name);
        let missing = |name: &str| Error::Parse {
            source_name: source_name.to_string(),
            line: 1,
            message: format!("missing required column '{}'", name),
        };

        let term_col = position(COL_TERM).ok_or_else(|| missing(COL_TERM))?;
        let id_col = position(COL_ID).ok_or_else(|| missing(COL_ID))?;
        let freq_col = position(COL_FREQUENCY).ok_or_else(|| missing(COL_FREQUENCY))?;
        let disease_id_col = position(COL_DISEASE_ID);
        let disease_name_col = position(COL_DISEASE_NAME);
        if disease_id_col.is_none() && disease_name_col.is_none() {
            return Err(missing("disease id' or 'disease name").into());
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rdr.records() {
            let row = row.with_context(|| format!("reading {}", source_name))?;
            if row.iter().all(str::is_empty) {
                continue;
            }
            let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).unwrap_or("");

            let term = cell(Some(term_col));
            let phenotype_id = cell(Some(id_col));
            let disease_name = cell(disease_name_col);
            let disease_id = match cell(disease_id_col) {
                "" => disease_name,
                id => id,
            };
            if term.is_empty() || phenotype_id.is_empty() || disease_id.is_empty() {
                let line = row.position().map_or(0, |p| p.line());
                warn!(source = source_name, line, "skipping incomplete annotation row");
                skipped += 1;
                continue;
            }

            let band = FrequencyBand::from_cell(cell(Some(freq_col)));
            records.push(
                AnnotationRecord::new(phenotype_id, term, disease_id, band).with_disease_name(disease_name),
            );
        }

        if skipped > 0 {
            warn!(source = source_name, skipped, "annotation rows skipped");
        }
        Ok(records)
    }

    /// Parse `Prefix, MIM Number, Preferred Title, ...` rows; `#` lines are comments
    pub fn read_mim_titles<R: Read>(reader: R) -> Result<Vec<DiseaseEntry>> {
        let mut titles = Vec::new();
        for row in Self::tsv_reader(reader, false, true).records() {
            let row = row?;
            let (Some(mim), Some(title)) = (row.get(1), row.get(2)) else {
                continue;
            };
            if mim.is_empty() {
                continue;
            }
            titles.push(DiseaseEntry::new(mim, title));
        }
        Ok(titles)
    }

    /// Parse two-column `left\tright` rows, e.g. DAG edges or disease annotations
    pub fn read_pairs<R: Read>(reader: R, source_name: &str) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        for row in Self::tsv_reader(reader, false, true).records() {
            let row = row.with_context(|| format!("reading {}", source_name))?;
            if row.iter().all(str::is_empty) {
                continue;
            }
            match (row.get(0).map(clean), row.get(1)) {
                (Some(left), Some(right)) if !left.is_empty() && !right.is_empty() => {
                    pairs.push((left.to_string(), right.to_string()));
                }
                _ => {
                    return Err(Error::Parse {
                        source_name: source_name.to_string(),
                        line: row.position().map_or(0, |p| p.line() as usize),
                        message: "expected two tab-separated columns".to_string(),
                    }
                    .into())
                }
            }
        }
        Ok(pairs)
    }
}

/// Drop a leading byte order mark left on the first cell of a file
fn clean(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

impl DatasetLoader for TsvDatasetLoader {
    fn load(&self) -> Result<Dataset> {
        let name = self.annotations.display().to_string();
        let records = Self::read_annotations(Self::open(&self.annotations)?, &name)?;
        if records.is_empty() {
            return Err(anyhow!("annotation table {} has no usable rows", name));
        }

        let titles = Self::read_mim_titles(Self::open(&self.mim_titles)?)
            .with_context(|| format!("reading {}", self.mim_titles.display()))?;

        let ontology_edges = match &self.ontology {
            Some(path) => Self::read_pairs(Self::open(path)?, &path.display().to_string())?,
            None => Vec::new(),
        };
        let disease_phenotypes = match &self.disease_phenotypes {
            Some(path) => Self::read_pairs(Self::open(path)?, &path.display().to_string())?,
            None => Vec::new(),
        };

        info!(
            records = records.len(),
            titles = titles.len(),
            edges = ontology_edges.len(),
            annotations = disease_phenotypes.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            records,
            titles,
            ontology_edges,
            disease_phenotypes,
        })
    }

    fn describe(&self) -> String {
        self.annotations.display().to_string()
    }
}
