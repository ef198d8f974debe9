// Record predicates: label fragments and frequency bands
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::phenotype::{normalize, AnnotationRecord, FrequencyBand};
use crate::store::RecordStore;
use crate::Result;

pub trait Filter {
    fn matches(&self, record: &AnnotationRecord) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Label contains any of the (normalized) fragments
    LabelContainsAny(Vec<String>),
    /// Label equals one of the (normalized) labels
    LabelIn(Vec<String>),
    BandIn(Vec<FrequencyBand>),
    And(Vec<FilterCondition>),
}

pub struct RecordFilter {
    condition: FilterCondition,
}

impl RecordFilter {
    pub fn new(condition: FilterCondition) -> Self {
        Self { condition }
    }

    fn matches_condition(condition: &FilterCondition, record: &AnnotationRecord) -> bool {
        match condition {
            FilterCondition::LabelContainsAny(fragments) => fragments
                .iter()
                .any(|f| record.phenotype_label.contains(f.as_str())),
            FilterCondition::LabelIn(labels) => labels.iter().any(|l| *l == record.phenotype_label),
            FilterCondition::BandIn(bands) => bands.contains(&record.frequency_band),
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, record))
            }
        }
    }
}

impl Filter for RecordFilter {
    fn matches(&self, record: &AnnotationRecord) -> bool {
        Self::matches_condition(&self.condition, record)
    }
}

/// Result of applying a query to the store.
///
/// An empty match is a legitimate outcome, kept apart from errors so the
/// caller can report "no matches" instead of a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<'a> {
    Matched(Vec<&'a AnnotationRecord>),
    NoMatches,
}

impl<'a> FilterOutcome<'a> {
    pub fn records(&self) -> &[&'a AnnotationRecord] {
        match self {
            FilterOutcome::Matched(records) => records,
            FilterOutcome::NoMatches => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FilterOutcome::NoMatches)
    }

    pub fn patient_phenotypes(&self) -> PatientPhenotypeSet {
        PatientPhenotypeSet::from_records(self.records().iter().copied())
    }
}

/// Symptom fragments plus allowed frequency bands.
///
/// Fragments match as case-insensitive substrings of the record label, so
/// "seizure" also selects "absence seizure". An empty fragment list or an
/// empty band list disables that half of the predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymptomQuery {
    fragments: Vec<String>,
    bands: Vec<FrequencyBand>,
}

impl SymptomQuery {
    pub fn new<S: AsRef<str>>(symptoms: &[S], bands: &[FrequencyBand]) -> Self {
        let mut fragments: Vec<String> = Vec::new();
        for symptom in symptoms {
            let fragment = normalize(symptom.as_ref());
            if !fragment.is_empty() && !fragments.contains(&fragment) {
                fragments.push(fragment);
            }
        }
        let mut band_list: Vec<FrequencyBand> = Vec::new();
        for band in bands {
            if !band_list.contains(band) {
                band_list.push(*band);
            }
        }
        Self { fragments, bands: band_list }
    }

    /// Parse band labels as sent by a client; unknown labels are rejected
    pub fn parse<S: AsRef<str>, B: AsRef<str>>(symptoms: &[S], bands: &[B]) -> Result<Self> {
        let parsed = bands
            .iter()
            .map(|b| b.as_ref().parse::<FrequencyBand>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(symptoms, &parsed))
    }

    #[inline]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    #[inline]
    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    #[inline]
    pub fn has_symptoms(&self) -> bool {
        !self.fragments.is_empty()
    }

    pub fn condition(&self) -> Option<FilterCondition> {
        let mut parts = Vec::new();
        if !self.fragments.is_empty() {
            parts.push(FilterCondition::LabelContainsAny(self.fragments.clone()));
        }
        if !self.bands.is_empty() {
            parts.push(FilterCondition::BandIn(self.bands.clone()));
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(FilterCondition::And(parts)),
        }
    }

    /// Filter a record sequence; order and provenance are preserved
    pub fn filter_records<'a, I>(&self, records: I) -> Vec<&'a AnnotationRecord>
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        match self.condition() {
            Some(condition) => {
                let filter = RecordFilter::new(condition);
                records.into_iter().filter(|r| filter.matches(r)).collect()
            }
            None => records.into_iter().collect(),
        }
    }

    pub fn apply<'a>(&self, store: &'a RecordStore) -> FilterOutcome<'a> {
        let matched = self.filter_records(store.records());
        if matched.is_empty() {
            FilterOutcome::NoMatches
        } else {
            FilterOutcome::Matched(matched)
        }
    }
}

/// Deduplicated phenotype ids describing one patient, in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientPhenotypeSet {
    ids: BTreeSet<String>,
}

impl PatientPhenotypeSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        Self {
            ids: records.into_iter().map(|r| r.phenotype_id.clone()).collect(),
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        RecordStore::new(vec![
            AnnotationRecord::new("HP:0002315", "Headache", "OMIM:101", FrequencyBand::VeryFrequent),
            AnnotationRecord::new("HP:0001250", "Seizure", "OMIM:101", FrequencyBand::Frequent),
            AnnotationRecord::new("HP:0002121", "Absence seizure", "OMIM:303", FrequencyBand::VeryFrequent),
            AnnotationRecord::new("HP:0002123", "Myoclonic seizure", "OMIM:303", FrequencyBand::Occasional),
            AnnotationRecord::new("HP:0000988", "Rash", "OMIM:202", FrequencyBand::Occasional),
            AnnotationRecord::new("HP:0002315", "Headache", "OMIM:202", FrequencyBand::VeryFrequent),
        ])
    }

    #[test]
    fn test_empty_query_is_identity() {
        let store = store();
        let query = SymptomQuery::new::<&str>(&[], &[]);
        let outcome = query.apply(&store);
        assert_eq!(outcome.records().len(), store.len());
        for (a, b) in outcome.records().iter().zip(store.records()) {
            assert_eq!(*a, b);
        }
    }

    #[test]
    fn test_substring_match() {
        let store = store();
        let query = SymptomQuery::new(&["SEIZURE"], &[]);
        let ids: Vec<_> = query.apply(&store).records().iter().map(|r| r.phenotype_id.as_str()).collect();
        assert_eq!(ids, vec!["HP:0001250", "HP:0002121", "HP:0002123"]);
    }

    #[test]
    fn test_band_filter_combines_with_terms() {
        let store = store();
        let query = SymptomQuery::new(&["seizure", "headache"], &[FrequencyBand::VeryFrequent]);
        let outcome = query.apply(&store);
        let set = outcome.patient_phenotypes();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["HP:0002121", "HP:0002315"]);
        // headache rows from two diseases collapse into one id
        assert_eq!(outcome.records().len(), 3);
    }

    #[test]
    fn test_bands_only() {
        let store = store();
        let query = SymptomQuery::new::<&str>(&[], &[FrequencyBand::Occasional]);
        assert_eq!(query.apply(&store).records().len(), 2);
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let store = RecordStore::new(vec![AnnotationRecord::new(
            "HP:0000988",
            "Rash",
            "OMIM:202",
            FrequencyBand::Occasional,
        )]);
        let query = SymptomQuery::parse(&["Headache", "Seizure"], &["Very frequent (99-80%)"]).unwrap();
        assert_eq!(query.apply(&store), FilterOutcome::NoMatches);
        assert!(query.apply(&store).patient_phenotypes().is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let store = store();
        let query = SymptomQuery::new(&["seiz", "rash"], &[FrequencyBand::Occasional, FrequencyBand::VeryFrequent]);
        let once = query.filter_records(store.records());
        let twice = query.filter_records(once.iter().copied());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_query_normalization() {
        let query = SymptomQuery::new(&["  Seizure ", "seizure", "", "   "], &[FrequencyBand::Frequent, FrequencyBand::Frequent]);
        assert_eq!(query.fragments(), ["seizure".to_string()]);
        assert_eq!(query.bands(), [FrequencyBand::Frequent]);
        assert!(SymptomQuery::parse(&["x"], &["whenever"]).is_err());
    }

    #[test]
    fn test_compound_conditions() {
        let record = AnnotationRecord::new("HP:1", "short stature", "OMIM:1", FrequencyBand::Frequent);
        let filter = RecordFilter::new(FilterCondition::And(vec![
            FilterCondition::LabelContainsAny(vec!["tall".to_string(), "short".to_string()]),
            FilterCondition::BandIn(vec![FrequencyBand::Frequent, FrequencyBand::Occasional]),
        ]));
        assert!(filter.matches(&record));

        let exact = RecordFilter::new(FilterCondition::LabelIn(vec!["short".to_string()]));
        assert!(!exact.matches(&record));
        let exact = RecordFilter::new(FilterCondition::LabelIn(vec!["short stature".to_string()]));
        assert!(exact.matches(&record));
    }
}
