//! Destinations for the data a storage layer needs to persist a trie.

use std::collections::HashMap;

use crate::crypto::hash::Hash;

/// Receives every digest-addressed item produced while hashing a trie
pub trait TrieSink {
    /// A value stored outside its node, keyed by its digest
    fn put_value(&mut self, digest: Hash, value: &[u8]);

    /// A node encoding referenced by digest (the root is always included)
    fn put_node(&mut self, digest: Hash, encoding: &[u8]);
}

/// Sink that drops everything, for root-only computations
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TrieSink for NullSink {
    fn put_value(&mut self, _digest: Hash, _value: &[u8]) {}

    fn put_node(&mut self, _digest: Hash, _encoding: &[u8]) {}
}

/// In-memory sink keeping `digest -> value` and `digest -> node encoding`
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    values: HashMap<Hash, Vec<u8>>,
    nodes: HashMap<Hash, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a hashed value by digest
    pub fn value(&self, digest: &Hash) -> Option<&[u8]> {
        self.values.get(digest).map(Vec::as_slice)
    }

    /// Get a node encoding by digest
    pub fn node(&self, digest: &Hash) -> Option<&[u8]> {
        self.nodes.get(digest).map(Vec::as_slice)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all stored values
    pub fn values(&self) -> impl Iterator<Item = (&Hash, &[u8])> {
        self.values.iter().map(|(digest, value)| (digest, value.as_slice()))
    }
}

impl TrieSink for MemorySink {
    fn put_value(&mut self, digest: Hash, value: &[u8]) {
        self.values.entry(digest).or_insert_with(|| value.to_vec());
    }

    fn put_node(&mut self, digest: Hash, encoding: &[u8]) {
        self.nodes.entry(digest).or_insert_with(|| encoding.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        let digest = Hash::from_data(b"value");

        sink.put_value(digest, b"value");
        sink.put_value(digest, b"value");
        sink.put_node(digest, b"node");

        assert_eq!(sink.value_count(), 1);
        assert_eq!(sink.value(&digest), Some(&b"value"[..]));
        assert_eq!(sink.node(&digest), Some(&b"node"[..]));
        assert_eq!(sink.node(&Hash::zero()), None);
    }
}
