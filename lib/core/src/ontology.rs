// Phenotype ontology DAG - child/parent adjacency over term ids
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct PhenotypeOntology {
    parents: AHashMap<String, Vec<String>>,
    children: AHashMap<String, Vec<String>>,
    nodes: BTreeSet<String>,
}

impl PhenotypeOntology {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut ontology = Self::new();
        for (child, parent) in edges {
            ontology.add_edge(child.as_ref(), parent.as_ref());
        }
        ontology
    }

    /// Register a term with no edges
    pub fn add_term(&mut self, id: &str) {
        let id = id.trim();
        if !id.is_empty() {
            self.nodes.insert(id.to_string());
        }
    }

    /// `child` is-a `parent`; repeated edges are ignored
    pub fn add_edge(&mut self, child: &str, parent: &str) {
        let (child, parent) = (child.trim(), parent.trim());
        if child.is_empty() || parent.is_empty() || child == parent {
            return;
        }
        let parents = self.parents.entry(child.to_string()).or_default();
        if parents.iter().any(|p| p == parent) {
            return;
        }
        parents.push(parent.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        self.nodes.insert(child.to_string());
        self.nodes.insert(parent.to_string());
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn parents(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Terms in ascending id order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn roots(&self) -> Vec<&str> {
        self.terms().filter(|t| self.parents(t).is_empty()).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The term and all of its ancestors. Unknown ids map to themselves.
    pub fn ancestors(&self, id: &str) -> AHashSet<String> {
        let mut seen = AHashSet::new();
        let mut stack = vec![id.trim().to_string()];
        while let Some(node) = stack.pop() {
            if seen.contains(&node) {
                continue;
            }
            for parent in self.parents(&node) {
                if !seen.contains(parent) {
                    stack.push(parent.clone());
                }
            }
            seen.insert(node);
        }
        seen
    }

    /// Union of the ancestor closures of `ids`
    pub fn closure<'a, I>(&self, ids: I) -> AHashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut closure = AHashSet::new();
        for id in ids {
            if closure.contains(id.trim()) {
                continue;
            }
            closure.extend(self.ancestors(id));
        }
        closure
    }
}
