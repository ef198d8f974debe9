//! Ontology-aware disease scoring
//!
//! [`PhenotypeScorer`] is the seam the ranker depends on. The bundled
//! [`InformationContentScorer`] weighs every ontology node shared by the
//! patient and a disease by its conditional information content, so rare,
//! specific terms contribute more than broad ones.

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use phenorank_core::{PatientPhenotypeSet, PhenotypeOntology};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Scores every annotated disease against a patient phenotype set.
///
/// Implementations must be deterministic for a fixed ontology and
/// annotation set, free of side effects, and return `(disease_id, score)`
/// sorted by descending score.
pub trait PhenotypeScorer: Send + Sync {
    fn score(&self, patient: &PatientPhenotypeSet) -> Vec<(String, f64)>;

    /// Number of diseases the scorer knows about
    fn disease_count(&self) -> usize;
}

/// Sort `(id, score)` pairs by descending score, ties by ascending id
pub fn sort_scores(scores: &mut [(String, f64)]) {
    scores.sort_by(|a, b| {
        OrderedFloat(b.1)
            .cmp(&OrderedFloat(a.1))
            .then_with(|| a.0.cmp(&b.0))
    });
}

#[derive(Debug, Clone)]
pub struct InformationContentScorer {
    ontology: PhenotypeOntology,
    // disease -> ancestor closure of its annotated phenotypes
    disease_closures: BTreeMap<String, AHashSet<String>>,
    // node -> conditional information content given its parents
    cic: AHashMap<String, f64>,
}

impl InformationContentScorer {
    /// Build from the ontology and `(disease_id, phenotype_id)` annotations
    pub fn new<I, S>(ontology: PhenotypeOntology, annotations: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut direct: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (disease, phenotype) in annotations {
            let (disease, phenotype) = (disease.as_ref().trim(), phenotype.as_ref().trim());
            if disease.is_empty() || phenotype.is_empty() {
                continue;
            }
            direct
                .entry(disease.to_string())
                .or_default()
                .push(phenotype.to_string());
        }

        let disease_closures: BTreeMap<String, AHashSet<String>> = direct
            .into_iter()
            .map(|(disease, phenotypes)| {
                let closure = ontology.closure(phenotypes.iter().map(String::as_str));
                (disease, closure)
            })
            .collect();

        let cic = Self::conditional_information(&ontology, &disease_closures);

        Self {
            ontology,
            disease_closures,
            cic,
        }
    }

    fn conditional_information(
        ontology: &PhenotypeOntology,
        closures: &BTreeMap<String, AHashSet<String>>,
    ) -> AHashMap<String, f64> {
        let total = closures.len() as f64;
        if total == 0.0 {
            return AHashMap::new();
        }

        // diseases whose closure contains the node
        let mut node_counts: AHashMap<&str, usize> = AHashMap::new();
        // diseases whose closure contains every parent of the node
        let mut parent_counts: AHashMap<&str, usize> = AHashMap::new();

        for closure in closures.values() {
            for node in closure {
                *node_counts.entry(node.as_str()).or_insert(0) += 1;
            }
            let mut seen_children: AHashSet<&str> = AHashSet::new();
            for node in closure {
                for child in ontology.children(node) {
                    if !seen_children.insert(child.as_str()) {
                        continue;
                    }
                    if ontology.parents(child).iter().all(|p| closure.contains(p)) {
                        *parent_counts.entry(child.as_str()).or_insert(0) += 1;
                    }
                }
            }
        }

        node_counts
            .into_iter()
            .map(|(node, count)| {
                let joint = if ontology.parents(node).is_empty() {
                    total
                } else {
                    // every disease holding the node holds its parents
                    parent_counts.get(node).copied().unwrap_or(count).max(count) as f64
                };
                let information = (joint / count as f64).log2();
                (node.to_string(), information.max(0.0))
            })
            .collect()
    }

    /// Conditional information content of a node, zero if unannotated
    pub fn information_content(&self, node: &str) -> f64 {
        self.cic.get(node).copied().unwrap_or(0.0)
    }

    /// Score one disease against a precomputed patient closure
    pub fn match_score(&self, patient_closure: &AHashSet<String>, disease_id: &str) -> f64 {
        let Some(disease_closure) = self.disease_closures.get(disease_id) else {
            return 0.0;
        };
        let (small, large) = if patient_closure.len() <= disease_closure.len() {
            (patient_closure, disease_closure)
        } else {
            (disease_closure, patient_closure)
        };
        small
            .iter()
            .filter(|node| large.contains(*node))
            .map(|node| self.information_content(node))
            .sum()
    }

    pub fn diseases(&self) -> impl Iterator<Item = &str> {
        self.disease_closures.keys().map(String::as_str)
    }

    #[inline]
    pub fn ontology(&self) -> &PhenotypeOntology {
        &self.ontology
    }
}

impl PhenotypeScorer for InformationContentScorer {
    fn score(&self, patient: &PatientPhenotypeSet) -> Vec<(String, f64)> {
        let patient_closure = self.ontology.closure(patient.iter());

        let mut scores: Vec<(String, f64)> = self
            .disease_closures
            .par_iter()
            .map(|(disease, _)| (disease.clone(), self.match_score(&patient_closure, disease)))
            .collect();

        sort_scores(&mut scores);
        scores
    }

    fn disease_count(&self) -> usize {
        self.disease_closures.len()
    }
}
