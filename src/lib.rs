//! # PhenoRank
//!
//! Phenotype-driven disease candidate ranking.
//!
//! PhenoRank answers three questions over a phenotype-to-disease annotation
//! table: which phenotype terms start with this text, which diseases best
//! explain this patient's phenotypes, and which further phenotypes are worth
//! checking for.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! phenorank --annotations data/hpo_disorders.tsv --mim-titles data/mimTitles.txt \
//!     --hpo-dag data/hpodag.txt --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use phenorank::prelude::*;
//! use std::sync::Arc;
//!
//! let dataset = Dataset {
//!     records: vec![
//!         AnnotationRecord::new("HP:0002315", "Headache", "OMIM:101", FrequencyBand::VeryFrequent),
//!         AnnotationRecord::new("HP:0001250", "Seizure", "OMIM:101", FrequencyBand::Frequent),
//!         AnnotationRecord::new("HP:0000988", "Rash", "OMIM:202", FrequencyBand::Occasional),
//!     ],
//!     titles: vec![DiseaseEntry::new("101", "MIGRAINE, FAMILIAL")],
//!     ..Dataset::default()
//! };
//! let manager = Arc::new(CatalogManager::new(Arc::new(InMemoryLoader::new(dataset))));
//! let service = PhenotypeService::new(manager, ServiceConfig::default());
//!
//! assert_eq!(service.prefix_search("sei").unwrap()[0].phenotype_id, "HP:0001250");
//!
//! if let RankOutcome::Ranking(ranking) = service.rank_diseases(&["headache"], &[] as &[&str]).unwrap() {
//!     assert_eq!(ranking[0].disease_id, "101");
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `phenorank-core` - Vocabulary trie, record store, filters, ontology, TF-IDF
//! - `phenorank-similarity` - Information-content scorer, top-K ranker, suggestions
//! - `phenorank-storage` - Dataset loaders, immutable catalog, reload, snapshots
//! - `phenorank-api` - Boundary operations and the REST adapter

// Re-export core types
pub use phenorank_core::{
    AnnotationRecord, DiseaseEntry, FrequencyBand, PhenotypeTerm,
    VocabularyIndex, TermEntry,
    RecordStore, SymptomQuery, FilterOutcome, PatientPhenotypeSet,
    PhenotypeOntology, TfIdfModel,
    Error, Result,
};

// Re-export similarity
pub use phenorank_similarity::{
    PhenotypeScorer, InformationContentScorer,
    DiseaseRanker, DiseaseDirectory, RankedCandidate,
    SuggestionEngine, Suggestion,
};

// Re-export storage
pub use phenorank_storage::{
    Dataset, DatasetLoader, InMemoryLoader, TsvDatasetLoader,
    Catalog, CatalogManager, CatalogStatus,
    SnapshotManager, SnapshotLoader,
};

// Re-export API
pub use phenorank_api::{DetectOutcome, PhenotypeService, RankOutcome, ServiceConfig, TermMatch, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AnnotationRecord, DiseaseEntry, FrequencyBand,
        VocabularyIndex, RecordStore, SymptomQuery, PatientPhenotypeSet,
        PhenotypeScorer, DiseaseRanker, SuggestionEngine,
        Dataset, DatasetLoader, InMemoryLoader, TsvDatasetLoader,
        CatalogManager,
        PhenotypeService, RankOutcome, DetectOutcome, ServiceConfig,
        Error, Result,
    };
}
