// Content-based phenotype suggestion over per-disease label documents
use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use phenorank_core::{normalize, RecordStore, TfIdfModel};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub phenotype_id: String,
    pub term: String,
}

/// Proposes phenotypes that co-occur with the selected ones.
///
/// Each disease contributes one document made of its annotated labels.
/// The corpus never changes after load, so the TF-IDF model is fitted
/// once here instead of per request.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    // corpus order, ascending disease id
    disease_ids: Vec<String>,
    disease_labels: Vec<Vec<String>>,
    // label -> first phenotype id it was ingested with
    label_ids: AHashMap<String, String>,
    model: Option<TfIdfModel>,
}

impl SuggestionEngine {
    pub fn new(store: &RecordStore) -> Self {
        let mut disease_ids = Vec::with_capacity(store.disease_count());
        let mut disease_labels = Vec::with_capacity(store.disease_count());
        let mut documents = Vec::with_capacity(store.disease_count());

        for disease in store.diseases() {
            let mut seen = AHashSet::new();
            let records = store.get_by_disease(disease);
            let labels: Vec<String> = records
                .iter()
                .filter(|r| seen.insert(r.phenotype_label.as_str()))
                .map(|r| r.phenotype_label.clone())
                .collect();
            // the document keeps every row, repeated labels included
            let document = records
                .iter()
                .map(|r| r.phenotype_label.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            disease_ids.push(disease.to_string());
            disease_labels.push(labels);
            documents.push(document);
        }

        let mut label_ids = AHashMap::new();
        for term in store.terms() {
            label_ids
                .entry(term.label.clone())
                .or_insert_with(|| term.id.clone());
        }

        let model = TfIdfModel::fit(&documents);
        if model.is_none() {
            debug!("suggestion corpus has no usable tokens");
        }

        Self {
            disease_ids,
            disease_labels,
            label_ids,
            model,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        self.disease_ids.len()
    }

    /// Suggest up to `top_n` phenotypes related to `selected` labels.
    /// Never fails; an empty or unrecognized selection yields nothing.
    pub fn suggest<S: AsRef<str>>(&self, selected: &[S], top_n: usize) -> Vec<Suggestion> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        if selected.is_empty() || top_n == 0 {
            return Vec::new();
        }

        let excluded: AHashSet<String> = selected.iter().map(|s| normalize(s.as_ref())).collect();
        let joined = selected
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        let query = model.transform(&joined);
        if query.is_zero() {
            return Vec::new();
        }

        let similarities = model.similarities(&query);
        let mut related: Vec<(usize, f32)> = similarities
            .into_iter()
            .enumerate()
            .filter(|(_, sim)| *sim > 0.0)
            .collect();
        // stable: equal similarities keep corpus order
        related.sort_by_key(|(_, sim)| std::cmp::Reverse(OrderedFloat(*sim)));
        related.truncate(top_n);

        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut suggestions = Vec::with_capacity(top_n);
        for (doc, _) in related {
            for label in &self.disease_labels[doc] {
                if excluded.contains(label) || !seen.insert(label.as_str()) {
                    continue;
                }
                let Some(id) = self.label_ids.get(label) else {
                    continue;
                };
                suggestions.push(Suggestion {
                    phenotype_id: id.clone(),
                    term: label.clone(),
                });
                if suggestions.len() == top_n {
                    return suggestions;
                }
            }
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phenorank_core::{AnnotationRecord, FrequencyBand};

    fn store() -> RecordStore {
        let rows = [
            ("HP:1", "Headache", "OMIM:101"),
            ("HP:2", "Seizure", "OMIM:101"),
            ("HP:3", "Ataxia", "OMIM:101"),
            ("HP:2", "Seizure", "OMIM:102"),
            ("HP:4", "Hypotonia", "OMIM:102"),
            ("HP:5", "Rash", "OMIM:202"),
            ("HP:6", "Pruritus", "OMIM:202"),
        ];
        RecordStore::new(
            rows.iter()
                .map(|(pid, label, did)| AnnotationRecord::new(pid, label, did, FrequencyBand::Frequent))
                .collect(),
        )
    }

    #[test]
    fn test_suggests_co_occurring_phenotypes() {
        let engine = SuggestionEngine::new(&store());
        let suggestions = engine.suggest(&["Seizure"], 5);
        let terms: Vec<&str> = suggestions.iter().map(|s| s.term.as_str()).collect();

        assert!(terms.contains(&"hypotonia"));
        assert!(terms.contains(&"headache"));
        assert!(!terms.contains(&"seizure"));
        assert!(!terms.contains(&"rash"));
        let hypotonia = suggestions.iter().find(|s| s.term == "hypotonia").unwrap();
        assert_eq!(hypotonia.phenotype_id, "HP:4");
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        let engine = SuggestionEngine::new(&store());
        assert!(engine.suggest::<&str>(&[], 5).is_empty());
        assert!(engine.suggest(&[""], 5).is_empty());
    }

    #[test]
    fn test_unknown_terms_yield_nothing() {
        let engine = SuggestionEngine::new(&store());
        assert!(engine.suggest(&["zebra stripes"], 5).is_empty());
    }

    #[test]
    fn test_respects_top_n_without_duplicates() {
        let engine = SuggestionEngine::new(&store());
        let suggestions = engine.suggest(&["Seizure"], 2);
        assert_eq!(suggestions.len(), 2);
        assert_ne!(suggestions[0].term, suggestions[1].term);

        let all = engine.suggest(&["Seizure", "Rash"], 10);
        let mut terms: Vec<&str> = all.iter().map(|s| s.term.as_str()).collect();
        let before = terms.len();
        terms.sort_unstable();
        terms.dedup();
        assert_eq!(terms.len(), before);
    }

    #[test]
    fn test_selected_labels_are_excluded_case_insensitively() {
        let engine = SuggestionEngine::new(&store());
        let suggestions = engine.suggest(&["  RASH "], 5);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].term, "pruritus");
    }

    #[test]
    fn test_empty_store_is_not_ready() {
        let engine = SuggestionEngine::new(&RecordStore::default());
        assert!(!engine.is_ready());
        assert!(engine.suggest(&["Seizure"], 5).is_empty());
    }
}
