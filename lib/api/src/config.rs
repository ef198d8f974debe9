use phenorank_core::{Error, Result};
use phenorank_similarity::{DEFAULT_NAMESPACE_PREFIX, DEFAULT_SUGGESTIONS, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};

/// Tunables for the boundary operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Diseases returned per ranking
    pub top_k: usize,
    /// Phenotypes returned per suggestion request
    pub suggestions: usize,
    /// Stripped from disease ids before title lookup
    pub namespace_prefix: String,
    /// Cap on prefix search results; `None` returns every match
    pub search_limit: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            suggestions: DEFAULT_SUGGESTIONS,
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            search_limit: None,
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if self.suggestions == 0 {
            return Err(Error::InvalidConfig("suggestions must be at least 1".to_string()));
        }
        if self.search_limit == Some(0) {
            return Err(Error::InvalidConfig("search_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}
