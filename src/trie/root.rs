use log::debug;

use crate::config::TrieConfig;
use crate::crypto::hash::Hash;
use crate::trie::builder::TrieBuilder;
use crate::trie::layout::TrieLayout;
use crate::trie::sink::{NullSink, TrieSink};
use crate::trie::Entry;

/// Node count from which hashing moves to the rayon pool by default
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Computes state roots for one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootEngine {
    layout: TrieLayout,
    parallel_threshold: Option<usize>,
}

impl RootEngine {
    /// Sequential engine for a layout
    pub fn new(layout: TrieLayout) -> Self {
        Self {
            layout,
            parallel_threshold: None,
        }
    }

    /// Engine configured from the `[trie]` config section
    pub fn from_config(config: &TrieConfig) -> Self {
        Self::new(config.state_version).with_parallel_threshold(config.parallel_threshold)
    }

    /// Hash tries with at least `threshold` nodes level by level in parallel.
    /// Zero keeps hashing sequential.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = (threshold > 0).then_some(threshold);
        self
    }

    pub fn layout(&self) -> TrieLayout {
        self.layout
    }

    /// Root digest of the entries; order and duplicates (last wins) do not matter
    pub fn root(&self, entries: &[Entry]) -> Hash {
        self.commit(entries, &mut NullSink)
    }

    /// Root digest, handing hashed values and node encodings to `sink`
    pub fn commit<S: TrieSink + ?Sized>(&self, entries: &[Entry], sink: &mut S) -> Hash {
        let table = TrieBuilder::new(self.layout).build(entries);
        let parallel = matches!(self.parallel_threshold, Some(threshold) if table.len() >= threshold);

        let root = table.hash_into(sink, parallel);
        debug!(
            "Computed {} trie root {} from {} entries ({} nodes, parallel: {})",
            self.layout,
            root,
            entries.len(),
            table.len(),
            parallel
        );
        root
    }
}

impl TrieLayout {
    /// Root digest of the entries under this layout
    pub fn root(self, entries: &[Entry]) -> Hash {
        RootEngine::new(self).root(entries)
    }

    /// Root digest, also streaming everything a storage layer must persist
    pub fn root_with_sink<S: TrieSink + ?Sized>(self, entries: &[Entry], sink: &mut S) -> Hash {
        RootEngine::new(self).commit(entries, sink)
    }
}
