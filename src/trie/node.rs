use crate::crypto::hash::{Hash, HASH_LENGTH};
use crate::trie::encode::{encode_bytes, encode_header, NodeVariant};
use crate::trie::layout::TrieLayout;
use crate::trie::nibbles::{encode_partial_key, Nibble};

/// Position of a node in the builder's node table
pub type NodeIndex = usize;

/// Value payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue<'a> {
    /// Value embedded in the node encoding
    Inline(&'a [u8]),

    /// Value stored outside the trie, the node only holds its digest
    Hashed {
        /// BLAKE2b-256 of the value
        digest: Hash,
        /// Original bytes, kept for persisting `digest -> value`
        value: &'a [u8],
    },
}

impl<'a> NodeValue<'a> {
    /// Apply the layout's inline threshold to a raw value
    pub fn new(layout: TrieLayout, value: &'a [u8]) -> Self {
        if layout.should_hash_value(value) {
            NodeValue::Hashed {
                digest: Hash::from_data(value),
                value,
            }
        } else {
            NodeValue::Inline(value)
        }
    }

    /// Check if the node stores only the digest
    pub fn is_hashed(&self) -> bool {
        matches!(self, NodeValue::Hashed { .. })
    }

    /// The original value bytes
    pub fn raw(&self) -> &'a [u8] {
        match self {
            NodeValue::Inline(value) => value,
            NodeValue::Hashed { value, .. } => value,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            NodeValue::Inline(value) => encode_bytes(value, out),
            // Digests have a fixed length, no prefix
            NodeValue::Hashed { digest, .. } => out.extend_from_slice(digest.as_bytes()),
        }
    }
}

/// How a parent refers to a child: short encodings are embedded, longer ones
/// are replaced by their digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    /// Encoding shorter than a digest
    Inline(Vec<u8>),
    /// Digest of the child encoding
    Hashed(Hash),
}

impl ChildRef {
    /// Reference for a child with the given encoding
    pub fn from_encoding(encoding: &[u8]) -> Self {
        if encoding.len() < HASH_LENGTH {
            ChildRef::Inline(encoding.to_vec())
        } else {
            ChildRef::Hashed(Hash::from_data(encoding))
        }
    }

    /// Bytes written into the parent encoding
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ChildRef::Inline(encoding) => encoding,
            ChildRef::Hashed(digest) => digest.as_bytes(),
        }
    }
}

impl Default for ChildRef {
    fn default() -> Self {
        ChildRef::Inline(Vec::new())
    }
}

/// Node types in the Merkle Patricia Trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// Leaf node containing a value
    Leaf {
        /// Remaining key nibbles below the parent
        partial_key: Vec<Nibble>,
        /// Value stored at this leaf
        value: NodeValue<'a>,
    },

    /// Branch node with up to 16 children
    Branch {
        /// Nibbles shared by everything below this branch
        partial_key: Vec<Nibble>,
        /// Children (one for each hex digit), by node index
        children: [Option<NodeIndex>; 16],
        /// Value of the key ending exactly at this branch (if any)
        value: Option<NodeValue<'a>>,
    },
}

impl<'a> Node<'a> {
    /// Create a new leaf node
    pub fn leaf(partial_key: Vec<Nibble>, value: NodeValue<'a>) -> Self {
        Node::Leaf { partial_key, value }
    }

    /// Create a new branch node with no children
    pub fn branch(partial_key: Vec<Nibble>, value: Option<NodeValue<'a>>) -> Self {
        Node::Branch {
            partial_key,
            children: [None; 16],
            value,
        }
    }

    /// Get the partial key of the node
    pub fn partial_key(&self) -> &[Nibble] {
        match self {
            Node::Leaf { partial_key, .. } | Node::Branch { partial_key, .. } => partial_key,
        }
    }

    /// Get the value of the node, if any
    pub fn value(&self) -> Option<&NodeValue<'a>> {
        match self {
            Node::Leaf { value, .. } => Some(value),
            Node::Branch { value, .. } => value.as_ref(),
        }
    }

    /// Present children as `(nibble, index)` pairs in nibble order
    pub fn children(&self) -> impl Iterator<Item = (Nibble, NodeIndex)> + '_ {
        let slots: &[Option<NodeIndex>] = match self {
            Node::Branch { children, .. } => children,
            Node::Leaf { .. } => &[],
        };

        slots
            .iter()
            .enumerate()
            .filter_map(|(nibble, child)| child.map(|index| (nibble as Nibble, index)))
    }

    /// Bit i is set when child i is present
    pub fn children_bitmap(&self) -> u16 {
        self.children()
            .fold(0u16, |bitmap, (nibble, _)| bitmap | (1 << nibble))
    }

    /// Header variant for this node
    pub fn variant(&self) -> NodeVariant {
        match self {
            Node::Leaf { value, .. } if value.is_hashed() => NodeVariant::LeafWithHashedValue,
            Node::Leaf { .. } => NodeVariant::Leaf,
            Node::Branch { value: None, .. } => NodeVariant::Branch,
            Node::Branch { value: Some(value), .. } if value.is_hashed() => {
                NodeVariant::BranchWithHashedValue
            }
            Node::Branch { .. } => NodeVariant::BranchWithValue,
        }
    }

    /// Canonical encoding of the node.
    ///
    /// `child_refs` is indexed by node index and must already hold the
    /// reference of every child of this node.
    pub fn encode(&self, child_refs: &[ChildRef]) -> Vec<u8> {
        let partial_key = self.partial_key();
        let mut out = Vec::with_capacity(1 + partial_key.len() / 2 + 2 + HASH_LENGTH);

        encode_header(self.variant(), partial_key.len(), &mut out);
        out.extend_from_slice(&encode_partial_key(partial_key));

        match self {
            Node::Leaf { value, .. } => value.encode_into(&mut out),
            Node::Branch { value, .. } => {
                out.extend_from_slice(&self.children_bitmap().to_le_bytes());
                if let Some(value) = value {
                    value.encode_into(&mut out);
                }
                for (_, child) in self.children() {
                    encode_bytes(child_refs[child].as_bytes(), &mut out);
                }
            }
        }

        out
    }

    /// Get the node type as a string
    pub fn node_type(&self) -> &'static str {
        match self {
            Node::Leaf { .. } => "leaf",
            Node::Branch { .. } => "branch",
        }
    }
}
