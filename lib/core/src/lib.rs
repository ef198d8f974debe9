//! # PhenoRank Core
//!
//! Core data structures for phenotype-driven disease ranking.
//!
//! - [`VocabularyIndex`] - prefix trie over normalized phenotype labels
//! - [`RecordStore`] - read-only phenotype-to-disease annotation table
//! - [`SymptomQuery`] - label fragment and frequency band filtering
//! - [`PhenotypeOntology`] - is-a DAG over phenotype ids
//! - [`TfIdfModel`] - TF-IDF vectors over per-disease documents
//!
//! ## Example
//!
//! ```rust
//! use phenorank_core::{AnnotationRecord, FrequencyBand, RecordStore, SymptomQuery, VocabularyIndex};
//!
//! let store = RecordStore::new(vec![
//!     AnnotationRecord::new("HP:0002315", "Headache", "OMIM:101", FrequencyBand::VeryFrequent),
//!     AnnotationRecord::new("HP:0001250", "Seizure", "OMIM:101", FrequencyBand::Frequent),
//! ]);
//! let index = VocabularyIndex::from_terms(store.terms());
//! assert_eq!(index.search("HEAD")[0].phenotype_id, "HP:0002315");
//!
//! let query = SymptomQuery::new(&["seiz"], &[]);
//! let patient = query.apply(&store).patient_phenotypes();
//! assert!(patient.contains("HP:0001250"));
//! ```

pub mod error;
pub mod phenotype;
pub mod trie;
pub mod store;
pub mod filter;
pub mod ontology;
pub mod tfidf;
pub mod vector;

pub use error::{Error, Result};
pub use phenotype::{normalize, AnnotationRecord, DiseaseEntry, FrequencyBand, PhenotypeTerm};
pub use trie::{TermEntry, VocabularyIndex};
pub use store::RecordStore;
pub use filter::{Filter, FilterCondition, FilterOutcome, PatientPhenotypeSet, RecordFilter, SymptomQuery};
pub use ontology::PhenotypeOntology;
pub use tfidf::TfIdfModel;
pub use vector::SparseVector;
