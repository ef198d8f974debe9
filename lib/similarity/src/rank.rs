//! Top-K disease ranking
//!
//! Calls the scorer with the patient's phenotype set, keeps the best
//! candidates and resolves their display titles.

use ahash::AHashMap;
use phenorank_core::{DiseaseEntry, PatientPhenotypeSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::scorer::PhenotypeScorer;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_NAMESPACE_PREFIX: &str = "OMIM:";

/// One ranked disease, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// Disease id with the namespace prefix removed
    pub disease_id: String,
    pub display_name: String,
    /// Score rounded to two decimals
    pub score: f64,
}

/// Disease titles keyed by bare MIM number
#[derive(Debug, Clone, Default)]
pub struct DiseaseDirectory {
    entries: AHashMap<String, DiseaseEntry>,
}

impl DiseaseDirectory {
    pub fn new<I: IntoIterator<Item = DiseaseEntry>>(entries: I) -> Self {
        let mut map = AHashMap::new();
        for entry in entries {
            // first title wins on repeated ids
            map.entry(entry.mim_id.clone()).or_insert(entry);
        }
        Self { entries: map }
    }

    pub fn get(&self, mim_id: &str) -> Option<&DiseaseEntry> {
        self.entries.get(mim_id.trim())
    }

    /// Preferred title, or the "Unknown Disease" sentinel
    pub fn title_or_unknown(&self, mim_id: &str) -> &str {
        match self.get(mim_id) {
            Some(entry) => &entry.preferred_title,
            None => {
                debug!(mim_id, "no title for disease id");
                DiseaseEntry::UNKNOWN_TITLE
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Round to two decimals for display
#[inline]
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct DiseaseRanker {
    scorer: Arc<dyn PhenotypeScorer>,
    top_k: usize,
    namespace_prefix: String,
}

impl DiseaseRanker {
    pub fn new(scorer: Arc<dyn PhenotypeScorer>) -> Self {
        Self {
            scorer,
            top_k: DEFAULT_TOP_K,
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_namespace_prefix(mut self, prefix: &str) -> Self {
        self.namespace_prefix = prefix.to_string();
        self
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn scorer(&self) -> &Arc<dyn PhenotypeScorer> {
        &self.scorer
    }

    /// Strip the configured namespace prefix, e.g. `OMIM:143100` -> `143100`
    pub fn strip_namespace<'a>(&self, disease_id: &'a str) -> &'a str {
        let id = disease_id.trim();
        if self.namespace_prefix.is_empty() {
            return id;
        }
        id.strip_prefix(self.namespace_prefix.as_str()).unwrap_or(id)
    }

    /// Rank diseases for a patient; an empty set never reaches the scorer
    pub fn rank(&self, patient: &PatientPhenotypeSet, titles: &DiseaseDirectory) -> Vec<RankedCandidate> {
        if patient.is_empty() || self.top_k == 0 {
            return Vec::new();
        }

        let scores = self.scorer.score(patient);
        scores
            .into_iter()
            .take(self.top_k)
            .map(|(disease_id, score)| {
                let bare_id = self.strip_namespace(&disease_id).to_string();
                let display_name = titles.title_or_unknown(&bare_id).to_string();
                RankedCandidate {
                    disease_id: bare_id,
                    display_name,
                    score: round_score(score),
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for DiseaseRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiseaseRanker")
            .field("top_k", &self.top_k)
            .field("namespace_prefix", &self.namespace_prefix)
            .field("diseases", &self.scorer.disease_count())
            .finish()
    }
}
