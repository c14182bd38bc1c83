use serde::{Deserialize, Serialize};

use crate::trie::{TrieLayout, DEFAULT_PARALLEL_THRESHOLD};

/// State trie configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieConfig {
    /// Layout used for new state roots, `"v0"`/`"v1"` or `0`/`1`
    pub state_version: TrieLayout,

    /// Node count from which hashing runs in parallel, zero disables it
    pub parallel_threshold: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            state_version: TrieLayout::V1,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}
