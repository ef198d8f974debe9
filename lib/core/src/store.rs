use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::phenotype::{normalize, AnnotationRecord, PhenotypeTerm};

/// Read-only table of phenotype-to-disease annotations with lookup indexes.
///
/// Built once from the ingested rows; nothing mutates it afterwards, so it
/// can be shared between request threads without locking.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<AnnotationRecord>,
    by_phenotype: AHashMap<String, Vec<usize>>,
    // BTreeMap keeps disease iteration order stable
    by_disease: BTreeMap<String, Vec<usize>>,
    ids_by_label: AHashMap<String, Vec<String>>,
    label_by_id: AHashMap<String, String>,
    terms: Vec<PhenotypeTerm>,
}

impl RecordStore {
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        let mut by_phenotype: AHashMap<String, Vec<usize>> = AHashMap::new();
        let mut by_disease: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut ids_by_label: AHashMap<String, Vec<String>> = AHashMap::new();
        let mut label_by_id: AHashMap<String, String> = AHashMap::new();
        let mut terms = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            by_phenotype
                .entry(record.phenotype_id.clone())
                .or_default()
                .push(idx);
            by_disease
                .entry(record.disease_id.clone())
                .or_default()
                .push(idx);

            let ids = ids_by_label.entry(record.phenotype_label.clone()).or_default();
            if !ids.contains(&record.phenotype_id) {
                ids.push(record.phenotype_id.clone());
                terms.push(PhenotypeTerm {
                    id: record.phenotype_id.clone(),
                    label: record.phenotype_label.clone(),
                });
            }
            label_by_id
                .entry(record.phenotype_id.clone())
                .or_insert_with(|| record.phenotype_label.clone());
        }

        Self {
            records,
            by_phenotype,
            by_disease,
            ids_by_label,
            label_by_id,
            terms,
        }
    }

    #[inline]
    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct `(id, label)` pairs in first-seen order
    #[inline]
    pub fn terms(&self) -> &[PhenotypeTerm] {
        &self.terms
    }

    /// Disease ids in ascending order
    pub fn diseases(&self) -> impl Iterator<Item = &str> {
        self.by_disease.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn disease_count(&self) -> usize {
        self.by_disease.len()
    }

    pub fn get_by_disease(&self, disease_id: &str) -> Vec<&AnnotationRecord> {
        self.by_disease
            .get(disease_id)
            .map(|idxs| idxs.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_by_phenotype(&self, phenotype_id: &str) -> Vec<&AnnotationRecord> {
        self.by_phenotype
            .get(phenotype_id)
            .map(|idxs| idxs.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// First label a phenotype id was ingested with
    pub fn phenotype_label(&self, phenotype_id: &str) -> Option<&str> {
        self.label_by_id.get(phenotype_id.trim()).map(String::as_str)
    }

    /// Phenotype ids carrying this exact label (case-insensitive)
    pub fn phenotype_ids_for_label(&self, label: &str) -> &[String] {
        self.ids_by_label
            .get(&normalize(label))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Disease id to phenotype ids, as annotated in the table
    pub fn disease_phenotypes(&self) -> Vec<(String, String)> {
        self.by_disease
            .iter()
            .flat_map(|(disease, idxs)| {
                idxs.iter()
                    .map(move |&i| (disease.clone(), self.records[i].phenotype_id.clone()))
            })
            .collect()
    }
}
