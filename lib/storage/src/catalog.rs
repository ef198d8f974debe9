use chrono::{DateTime, Utc};
use phenorank_core::{PhenotypeOntology, RecordStore, VocabularyIndex};
use phenorank_similarity::{DiseaseDirectory, InformationContentScorer, PhenotypeScorer, SuggestionEngine};
use std::sync::Arc;
use tracing::info;

use crate::loader::Dataset;

/// Immutable, process-wide view of one loaded dataset.
///
/// Requests hold an `Arc<Catalog>` for their whole duration, so a reload
/// never changes data under a running request.
pub struct Catalog {
    store: RecordStore,
    index: VocabularyIndex,
    titles: DiseaseDirectory,
    scorer: Arc<dyn PhenotypeScorer>,
    suggestions: SuggestionEngine,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Build with the information-content scorer over the dataset's ontology
    pub fn build(dataset: Dataset, source: &str) -> Self {
        let ontology = PhenotypeOntology::from_edges(dataset.ontology_edges.iter().cloned());
        let scorer = InformationContentScorer::new(ontology, dataset.scoring_annotations());
        Self::with_scorer(dataset, source, Arc::new(scorer))
    }

    /// Build around a caller-supplied scorer
    pub fn with_scorer(dataset: Dataset, source: &str, scorer: Arc<dyn PhenotypeScorer>) -> Self {
        let Dataset { records, titles, .. } = dataset;

        let store = RecordStore::new(records);
        let index = VocabularyIndex::from_terms(store.terms());
        let titles = DiseaseDirectory::new(titles);
        let suggestions = SuggestionEngine::new(&store);

        info!(
            source,
            records = store.len(),
            terms = index.len(),
            diseases = store.disease_count(),
            scored = scorer.disease_count(),
            titles = titles.len(),
            "catalog built"
        );

        Self {
            store,
            index,
            titles,
            scorer,
            suggestions,
            source: source.to_string(),
            loaded_at: Utc::now(),
        }
    }

    #[inline]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    #[inline]
    pub fn index(&self) -> &VocabularyIndex {
        &self.index
    }

    #[inline]
    pub fn titles(&self) -> &DiseaseDirectory {
        &self.titles
    }

    #[inline]
    pub fn scorer(&self) -> &Arc<dyn PhenotypeScorer> {
        &self.scorer
    }

    #[inline]
    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("source", &self.source)
            .field("records", &self.store.len())
            .field("terms", &self.index.len())
            .field("diseases", &self.store.disease_count())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}
