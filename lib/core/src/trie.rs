//! Prefix trie over normalized phenotype labels
//!
//! Nodes live in a flat arena and children are kept in a `BTreeMap`, so a
//! subtree is always walked in ascending character order and results are
//! reproducible for the same insertion order. Traversal uses an explicit
//! stack; label length never turns into call depth.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::phenotype::{normalize, PhenotypeTerm};

/// A `(label, phenotype_id)` pair stored at a terminal node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub label: String,
    pub phenotype_id: String,
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<char, usize>,
    entries: SmallVec<[TermEntry; 1]>,
}

#[derive(Debug, Clone)]
pub struct VocabularyIndex {
    nodes: Vec<TrieNode>,
    entry_count: usize,
}

impl VocabularyIndex {
    const ROOT: usize = 0;

    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            entry_count: 0,
        }
    }

    /// Build an index from a sequence of terms, in order
    pub fn from_terms<'a, I>(terms: I) -> Self
    where
        I: IntoIterator<Item = &'a PhenotypeTerm>,
    {
        let mut index = Self::new();
        for term in terms {
            index.insert(&term.label, &term.id);
        }
        index
    }

    /// Append `(label, phenotype_id)` under the label's path.
    /// Repeated inserts are kept as repeated entries.
    pub fn insert(&mut self, label: &str, phenotype_id: &str) {
        let label = normalize(label);
        let mut node = Self::ROOT;
        for ch in label.chars() {
            node = match self.nodes[node].children.get(&ch) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(ch, child);
                    child
                }
            };
        }
        self.nodes[node].entries.push(TermEntry {
            label,
            phenotype_id: phenotype_id.trim().to_string(),
        });
        self.entry_count += 1;
    }

    fn find_node(&self, prefix: &str) -> Option<usize> {
        let mut node = Self::ROOT;
        for ch in prefix.chars() {
            node = *self.nodes[node].children.get(&ch)?;
        }
        Some(node)
    }

    /// All entries under `prefix`, in preorder of its subtree
    pub fn search(&self, prefix: &str) -> Vec<TermEntry> {
        self.search_limited(prefix, usize::MAX)
    }

    /// Like [`search`](Self::search) but stops after `limit` entries
    pub fn search_limited(&self, prefix: &str, limit: usize) -> Vec<TermEntry> {
        let prefix = normalize(prefix);
        let Some(start) = self.find_node(&prefix) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut stack = vec![start];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            for entry in &node.entries {
                if results.len() >= limit {
                    return results;
                }
                results.push(entry.clone());
            }
            // reversed so the smallest character is popped first
            stack.extend(node.children.values().rev().copied());
        }
        results
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entry_count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for VocabularyIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entries: &[TermEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_every_prefix_finds_the_entry() {
        let mut index = VocabularyIndex::new();
        index.insert("Headache", "HP:0002315");
        index.insert("hearing loss", "HP:0000365");

        for end in 1..="headache".len() {
            let prefix = &"headache"[..end];
            let results = index.search(prefix);
            assert!(
                results.iter().any(|e| e.phenotype_id == "HP:0002315"),
                "prefix {prefix} missed the entry"
            );
        }
        assert!(index.search("headachex").is_empty());
        assert!(index.search("zzz").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let mut index = VocabularyIndex::new();
        index.insert("Headache", "HP:0002315");
        assert_eq!(index.search("HEAD"), index.search("head"));
        assert_eq!(index.search("  Head "), index.search("head"));
    }

    #[test]
    fn test_preorder_and_child_order() {
        let mut index = VocabularyIndex::new();
        index.insert("seizures", "HP:3");
        index.insert("seizure", "HP:1");
        index.insert("seizure cluster", "HP:2");
        index.insert("seb", "HP:4");

        let results = index.search("se");
        // 'b' < 'i'; "seizure" terminal precedes its descendants; ' ' < 's'
        assert_eq!(labels(&results), vec!["seb", "seizure", "seizure cluster", "seizures"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut index = VocabularyIndex::new();
        index.insert("ataxia", "HP:0001251");
        index.insert("ataxia", "HP:0001251");
        index.insert("ataxia", "HP:9999999");

        let results = index.search("ataxia");
        assert_eq!(results.len(), 3);
        assert_eq!(index.len(), 3);
        assert_eq!(results[2].phenotype_id, "HP:9999999");
    }

    #[test]
    fn test_search_limited() {
        let mut index = VocabularyIndex::new();
        for (i, label) in ["aa", "ab", "ac", "ad"].iter().enumerate() {
            index.insert(label, &format!("HP:{i}"));
        }
        assert_eq!(labels(&index.search_limited("a", 2)), vec!["aa", "ab"]);
    }

    #[test]
    fn test_long_labels_do_not_recurse() {
        let mut index = VocabularyIndex::new();
        let long = "a".repeat(50_000);
        index.insert(&long, "HP:LONG");
        assert_eq!(index.search("a").len(), 1);
    }

    #[test]
    fn test_empty_prefix_returns_everything() {
        let terms = vec![
            PhenotypeTerm::new("HP:1", "fever"),
            PhenotypeTerm::new("HP:2", "ataxia"),
        ];
        let index = VocabularyIndex::from_terms(&terms);
        assert_eq!(labels(&index.search("")), vec!["ataxia", "fever"]);
    }
}
