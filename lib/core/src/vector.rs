use serde::{Deserialize, Serialize};

/// A sparse vector of `(dimension, weight)` pairs, sorted by dimension
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Build from unsorted pairs; zero weights are dropped and repeated
    /// dimensions are summed
    #[must_use]
    pub fn new(mut entries: Vec<(u32, f32)>) -> Self {
        entries.sort_by_key(|(dim, _)| *dim);
        let mut merged: Vec<(u32, f32)> = Vec::with_capacity(entries.len());
        for (dim, weight) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == dim => *acc += weight,
                _ => merged.push((dim, weight)),
            }
        }
        merged.retain(|(_, w)| *w != 0.0);
        Self { entries: merged }
    }

    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    pub fn get(&self, dim: u32) -> f32 {
        self.entries
            .binary_search_by_key(&dim, |(d, _)| *d)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Merge-join dot product over the sorted dimensions
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity; zero when either side is the zero vector
    #[inline]
    pub fn cosine_similarity(&self, other: &SparseVector) -> f32 {
        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        self.dot(other) / (norm_a * norm_b)
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for (_, w) in &mut self.entries {
                *w *= inv_norm;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}
