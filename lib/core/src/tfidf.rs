// TF-IDF vector model over a fixed document corpus
use ahash::AHashMap;
use rayon::prelude::*;

use crate::vector::SparseVector;

#[derive(Debug, Clone)]
pub struct TfIdfModel {
    // term -> column
    vocabulary: AHashMap<String, u32>,
    // column -> smoothed inverse document frequency
    idf: Vec<f32>,
    doc_vectors: Vec<SparseVector>,
}

impl TfIdfModel {
    /// Tokenize text for indexing.
    /// Lowercases, splits on whitespace and punctuation, drops single chars.
    #[inline]
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|s| s.chars().count() > 1)
            .collect()
    }

    /// Fit the model on `documents`, one vector per document in order.
    /// Returns `None` when the corpus has no usable tokens.
    pub fn fit<S: AsRef<str> + Sync>(documents: &[S]) -> Option<Self> {
        if documents.is_empty() {
            return None;
        }

        let tokenized: Vec<Vec<String>> = documents
            .par_iter()
            .map(|d| Self::tokenize(d.as_ref()))
            .collect();

        // Columns are assigned in sorted term order so the model is
        // identical across runs
        let mut terms: Vec<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        terms.sort_unstable();
        terms.dedup();
        if terms.is_empty() {
            return None;
        }

        let vocabulary: AHashMap<String, u32> = terms
            .iter()
            .enumerate()
            .map(|(col, term)| (term.to_string(), col as u32))
            .collect();

        let mut doc_freq = vec![0u32; vocabulary.len()];
        for tokens in &tokenized {
            let mut cols: Vec<u32> = tokens
                .iter()
                .filter_map(|t| vocabulary.get(t.as_str()).copied())
                .collect();
            cols.sort_unstable();
            cols.dedup();
            for col in cols {
                doc_freq[col as usize] += 1;
            }
        }

        let n_docs = tokenized.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let mut model = Self {
            vocabulary,
            idf,
            doc_vectors: Vec::new(),
        };
        model.doc_vectors = tokenized
            .par_iter()
            .map(|tokens| model.weigh(tokens))
            .collect();
        Some(model)
    }

    // raw term counts scaled by idf, L2-normalized; unknown terms are ignored
    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: AHashMap<u32, f32> = AHashMap::new();
        for token in tokens {
            if let Some(&col) = self.vocabulary.get(token.as_str()) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }
        let entries = counts
            .into_iter()
            .map(|(col, tf)| (col, tf * self.idf[col as usize]))
            .collect();
        SparseVector::new(entries).normalized()
    }

    /// Vectorize arbitrary text under the fitted vocabulary
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&Self::tokenize(text))
    }

    /// Cosine similarity of `query` against every document, in corpus order
    pub fn similarities(&self, query: &SparseVector) -> Vec<f32> {
        if query.is_zero() {
            return vec![0.0; self.doc_vectors.len()];
        }
        self.doc_vectors
            .par_iter()
            .map(|doc| doc.cosine_similarity(query))
            .collect()
    }

    #[inline]
    pub fn document_vectors(&self) -> &[SparseVector] {
        &self.doc_vectors
    }

    #[inline]
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&col| self.idf[col as usize])
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc_vectors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            TfIdfModel::tokenize("Seizure, absence-type (a) EEG"),
            vec!["seizure", "absence", "type", "eeg"]
        );
    }

    #[test]
    fn test_empty_corpus_cannot_fit() {
        assert!(TfIdfModel::fit::<&str>(&[]).is_none());
        assert!(TfIdfModel::fit(&["", "a b c"]).is_none());
    }

    #[test]
    fn test_idf_is_smoothed() {
        let model = TfIdfModel::fit(&["headache seizure", "rash", "headache"]).unwrap();
        // ln((1+3)/(1+2)) + 1
        let expected = (4.0f32 / 3.0).ln() + 1.0;
        assert!((model.idf("headache").unwrap() - expected).abs() < 1e-6);
        assert!(model.idf("rash").unwrap() > model.idf("headache").unwrap());
        assert_eq!(model.vocabulary_size(), 3);
    }

    #[test]
    fn test_similarity_prefers_matching_document() {
        let model = TfIdfModel::fit(&[
            "headache seizure ataxia",
            "rash eczema pruritus",
            "seizure hypotonia",
        ])
        .unwrap();
        let query = model.transform("seizure headache");
        let sims = model.similarities(&query);
        assert_eq!(sims.len(), 3);
        assert!(sims[0] > sims[2]);
        assert!(sims[2] > sims[1]);
        assert_eq!(sims[1], 0.0);
    }

    #[test]
    fn test_unknown_query_is_zero_vector() {
        let model = TfIdfModel::fit(&["headache", "rash"]).unwrap();
        let query = model.transform("zebra");
        assert!(query.is_zero());
        assert!(model.similarities(&query).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_document_vectors_are_unit_length() {
        let model = TfIdfModel::fit(&["a headache headache seizure", "rash"]).unwrap();
        for v in model.document_vectors() {
            assert!((v.norm() - 1.0).abs() < 1e-5);
        }
    }
}
