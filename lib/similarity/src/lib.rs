//! # PhenoRank Similarity
//!
//! Disease ranking and phenotype suggestion on top of the core store.
//!
//! ## Features
//!
//! - **Pluggable scoring**: rankers depend on the [`PhenotypeScorer`] trait
//! - **Information content**: [`InformationContentScorer`] weighs shared ontology nodes by rarity
//! - **Top-K ranking**: [`DiseaseRanker`] trims, titles and rounds the scorer output
//! - **Suggestions**: [`SuggestionEngine`] proposes co-occurring phenotypes via TF-IDF
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Ontology   │────>│   Scorer    │────>│   Ranker    │
//! │ (is-a DAG)  │     │ (IC, rayon) │     │ (top-K)     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ RecordStore │────>│ Suggestion  │     │  Disease    │
//! │ (per disease│     │ (TF-IDF)    │     │  Directory  │
//! │  documents) │     └─────────────┘     └─────────────┘
//! └─────────────┘
//! ```

pub mod scorer;
pub mod rank;
pub mod suggest;

pub use scorer::{sort_scores, InformationContentScorer, PhenotypeScorer};
pub use rank::{
    round_score, DiseaseDirectory, DiseaseRanker, RankedCandidate, DEFAULT_NAMESPACE_PREFIX,
    DEFAULT_TOP_K,
};
pub use suggest::{Suggestion, SuggestionEngine, DEFAULT_SUGGESTIONS};
