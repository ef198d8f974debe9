//! Boundary operations over the shared catalog
//!
//! Every call grabs the current catalog handle once and works on that
//! snapshot only, so concurrent reloads are invisible mid-request.

use phenorank_core::{normalize, Error, Filter, FilterCondition, FilterOutcome, RecordFilter, Result, SymptomQuery};
use phenorank_similarity::{DiseaseRanker, RankedCandidate, Suggestion};
use phenorank_storage::{Catalog, CatalogManager, CatalogStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermMatch {
    pub term: String,
    pub phenotype_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankOutcome {
    /// No record matched the symptoms and bands
    NoMatches,
    Ranking(Vec<RankedCandidate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    /// No record carries any of the labels
    NoMatches,
    /// Matching row count per disease name, or per id when the row has no name
    Matches(BTreeMap<String, usize>),
}

pub struct PhenotypeService {
    manager: Arc<CatalogManager>,
    config: ServiceConfig,
}

impl PhenotypeService {
    pub fn new(manager: Arc<CatalogManager>, config: ServiceConfig) -> Self {
        Self { manager, config }
    }

    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn catalog(&self) -> Result<Arc<Catalog>> {
        self.manager.current()
    }

    fn ranker(&self, catalog: &Catalog) -> DiseaseRanker {
        DiseaseRanker::new(Arc::clone(catalog.scorer()))
            .with_top_k(self.config.top_k)
            .with_namespace_prefix(&self.config.namespace_prefix)
    }

    /// Phenotype terms whose normalized label starts with `prefix`
    pub fn prefix_search(&self, prefix: &str) -> Result<Vec<TermMatch>> {
        let catalog = self.catalog()?;
        let entries = match self.config.search_limit {
            Some(limit) => catalog.index().search_limited(prefix, limit),
            None => catalog.index().search(prefix),
        };
        Ok(entries
            .into_iter()
            .map(|entry| TermMatch {
                term: entry.label,
                phenotype_id: entry.phenotype_id,
            })
            .collect())
    }

    /// Filter records by symptom fragments and bands, then rank diseases
    pub fn rank_diseases<S, B>(&self, symptoms: &[S], frequency_bands: &[B]) -> Result<RankOutcome>
    where
        S: AsRef<str>,
        B: AsRef<str>,
    {
        let catalog = self.catalog()?;
        let query = SymptomQuery::parse(symptoms, frequency_bands)?;
        if !query.has_symptoms() {
            return Err(Error::InvalidRequest("No symptoms provided".to_string()));
        }

        let patient = match query.apply(catalog.store()) {
            FilterOutcome::NoMatches => {
                debug!(fragments = ?query.fragments(), "no records matched");
                return Ok(RankOutcome::NoMatches);
            }
            matched => matched.patient_phenotypes(),
        };

        let ranking = self.ranker(&catalog).rank(&patient, catalog.titles());
        debug!(phenotypes = patient.len(), ranked = ranking.len(), "ranked diseases");
        Ok(RankOutcome::Ranking(ranking))
    }

    /// Count annotation rows per disease whose label is exactly one of `symptoms`
    pub fn detect_diseases<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<DetectOutcome> {
        let catalog = self.catalog()?;
        let mut labels: Vec<String> = symptoms.iter().map(|s| normalize(s.as_ref())).collect();
        labels.retain(|l| !l.is_empty());
        if labels.is_empty() {
            return Err(Error::InvalidRequest("No symptoms provided".to_string()));
        }

        let filter = RecordFilter::new(FilterCondition::LabelIn(labels));
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in catalog.store().records().iter().filter(|r| filter.matches(r)) {
            let disease = match record.disease_name.as_deref() {
                Some(name) if !name.is_empty() => name,
                _ => record.disease_id.as_str(),
            };
            *counts.entry(disease.to_string()).or_default() += 1;
        }

        debug!(diseases = counts.len(), "detected diseases");
        if counts.is_empty() {
            Ok(DetectOutcome::NoMatches)
        } else {
            Ok(DetectOutcome::Matches(counts))
        }
    }

    /// Phenotypes that co-occur with the selected labels
    pub fn suggest_phenotypes<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<Vec<Suggestion>> {
        let catalog = self.catalog()?;
        if symptoms.iter().all(|s| normalize(s.as_ref()).is_empty()) {
            return Err(Error::InvalidRequest("No symptoms provided".to_string()));
        }
        Ok(catalog.suggestions().suggest(symptoms, self.config.suggestions))
    }

    pub fn status(&self) -> CatalogStatus {
        self.manager.status()
    }

    /// Rebuild the catalog; in-flight requests keep their snapshot
    pub fn reload(&self) -> Result<CatalogStatus> {
        self.manager.reload()?;
        let status = self.manager.status();
        info!(records = status.records, terms = status.terms, "service reloaded");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use phenorank_core::{AnnotationRecord, DiseaseEntry, FrequencyBand};
    use phenorank_storage::{Dataset, DatasetLoader, InMemoryLoader};

    struct FailingLoader;

    impl DatasetLoader for FailingLoader {
        fn load(&self) -> anyhow::Result<Dataset> {
            Err(anyhow!("annotation table missing"))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn service() -> PhenotypeService {
        let dataset = Dataset {
            records: vec![
                AnnotationRecord::new("HP:0002315", "Headache", "OMIM:101", FrequencyBand::VeryFrequent),
                AnnotationRecord::new("HP:0001250", "Seizure", "OMIM:101", FrequencyBand::Frequent),
                AnnotationRecord::new("HP:0000988", "Skin rash", "OMIM:202", FrequencyBand::Occasional),
            ],
            titles: vec![DiseaseEntry::new("101", "MIGRAINE, FAMILIAL")],
            ..Dataset::default()
        };
        let manager = Arc::new(CatalogManager::new(Arc::new(InMemoryLoader::new(dataset))));
        PhenotypeService::new(manager, ServiceConfig::default())
    }

    #[test]
    fn test_prefix_search() {
        let service = service();
        let matches = service.prefix_search("SEI").unwrap();
        assert_eq!(
            matches,
            vec![TermMatch {
                term: "seizure".to_string(),
                phenotype_id: "HP:0001250".to_string()
            }]
        );
        assert!(service.prefix_search("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_prefix_search_limit() {
        let dataset = Dataset {
            records: ["Seizure", "Seizure cluster", "Severe pain"]
                .iter()
                .enumerate()
                .map(|(i, label)| AnnotationRecord::new(&format!("HP:{}", i), label, "OMIM:1", FrequencyBand::Frequent))
                .collect(),
            ..Dataset::default()
        };
        let manager = Arc::new(CatalogManager::new(Arc::new(InMemoryLoader::new(dataset))));
        let config = ServiceConfig {
            search_limit: Some(2),
            ..ServiceConfig::default()
        };
        let service = PhenotypeService::new(manager, config);
        let terms: Vec<String> = service.prefix_search("se").unwrap().into_iter().map(|m| m.term).collect();
        assert_eq!(terms, vec!["seizure", "seizure cluster"]);
    }

    #[test]
    fn test_rank_diseases() {
        let service = service();
        let outcome = service.rank_diseases(&["headache", "seizure"], &[] as &[&str]).unwrap();
        let RankOutcome::Ranking(ranking) = outcome else {
            panic!("expected a ranking");
        };
        assert_eq!(ranking[0].disease_id, "101");
        assert_eq!(ranking[0].display_name, "MIGRAINE, FAMILIAL");
        assert_eq!(ranking[1].disease_id, "202");
        assert_eq!(ranking[1].display_name, "Unknown Disease");
    }

    #[test]
    fn test_rank_no_matches_is_not_an_error() {
        let service = service();
        let outcome = service
            .rank_diseases(&["Headache", "Seizure"], &["Obligate (100%)"])
            .unwrap();
        assert_eq!(outcome, RankOutcome::NoMatches);
    }

    #[test]
    fn test_rank_rejects_bad_input() {
        let service = service();
        let empty: &[&str] = &[];
        assert!(matches!(service.rank_diseases(empty, empty), Err(Error::InvalidRequest(_))));
        assert!(matches!(service.rank_diseases(&["  "], empty), Err(Error::InvalidRequest(_))));
        assert!(matches!(
            service.rank_diseases(&["headache"], &["sometimes"]),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_suggest_phenotypes() {
        let service = service();
        let suggestions = service.suggest_phenotypes(&["Headache"]).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].term, "seizure");
        assert!(matches!(
            service.suggest_phenotypes::<&str>(&[]),
            Err(Error::InvalidRequest(_))
        ));
        assert!(service.suggest_phenotypes(&["unrelated words"]).unwrap().is_empty());
    }

    #[test]
    fn test_detect_diseases_counts_exact_labels() {
        let dataset = Dataset {
            records: vec![
                AnnotationRecord::new("HP:0001250", "Seizure", "OMIM:101", FrequencyBand::Frequent)
                    .with_disease_name("Migraine"),
                AnnotationRecord::new("HP:0002315", "Headache", "OMIM:101", FrequencyBand::Frequent)
                    .with_disease_name("Migraine"),
                AnnotationRecord::new("HP:0001250", "Seizure", "OMIM:303", FrequencyBand::Occasional),
                AnnotationRecord::new("HP:0002121", "Absence seizure", "OMIM:404", FrequencyBand::Frequent),
            ],
            ..Dataset::default()
        };
        let manager = Arc::new(CatalogManager::new(Arc::new(InMemoryLoader::new(dataset))));
        let service = PhenotypeService::new(manager, ServiceConfig::default());

        let DetectOutcome::Matches(counts) = service.detect_diseases(&[" SEIZURE", "headache"]).unwrap() else {
            panic!("expected matches");
        };
        // "absence seizure" is not an exact label match; unnamed rows count under the id
        let expected: BTreeMap<String, usize> =
            [("Migraine".to_string(), 2), ("OMIM:303".to_string(), 1)].into_iter().collect();
        assert_eq!(counts, expected);

        assert_eq!(service.detect_diseases(&["seiz"]).unwrap(), DetectOutcome::NoMatches);
        assert!(matches!(
            service.detect_diseases::<&str>(&[]),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(service.detect_diseases(&["  "]), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_unavailable_dataset() {
        let manager = Arc::new(CatalogManager::new(Arc::new(FailingLoader)));
        let service = PhenotypeService::new(manager, ServiceConfig::default());
        assert!(matches!(service.prefix_search("a"), Err(Error::DatasetUnavailable(_))));
        assert!(matches!(
            service.rank_diseases(&["headache"], &[] as &[&str]),
            Err(Error::DatasetUnavailable(_))
        ));
        assert!(matches!(service.suggest_phenotypes(&["a"]), Err(Error::DatasetUnavailable(_))));
        assert!(matches!(service.detect_diseases(&["a"]), Err(Error::DatasetUnavailable(_))));
        assert!(!service.status().available);
        assert!(service.reload().is_err());
    }
}
