//! Versioned Merkle Patricia Trie root computation
//!
//! Keys are split into nibbles and arranged in a radix trie with shared-prefix
//! compression. Nodes are encoded canonically and hashed with BLAKE2b-256 from
//! the leaves up; the layout version decides whether large values are embedded
//! in their node or referenced by digest.

pub mod builder;
pub mod encode;
pub mod layout;
pub mod nibbles;
pub mod node;
pub mod root;
pub mod sink;

use serde::{Deserialize, Serialize};

// Re-export main components
pub use builder::{NodeTable, TrieBuilder, EMPTY_TRIE_ROOT};
pub use layout::{
    parse_version, parse_version_arg, ParseVersionError, TrieLayout, VersionInput,
    NO_MAX_INLINE_VALUE_SIZE, V1_MAX_INLINE_VALUE_SIZE,
};
pub use node::{ChildRef, Node, NodeValue};
pub use root::{RootEngine, DEFAULT_PARALLEL_THRESHOLD};
pub use sink::{MemorySink, NullSink, TrieSink};

/// A key/value pair to place in the trie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Raw key bytes, hex encoded in serialized form
    #[serde(with = "hex::serde")]
    pub key: Vec<u8>,

    /// Raw value bytes, hex encoded in serialized form
    #[serde(with = "hex::serde")]
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new<K: Into<Vec<u8>>, V: Into<Vec<u8>>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Entries in caller order
pub type Entries = Vec<Entry>;
