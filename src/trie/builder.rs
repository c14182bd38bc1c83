//! Trie construction.
//!
//! Entries are deduplicated, sorted and split into nodes with an explicit work
//! stack, so skewed key sets cannot exhaust the call stack. Nodes live in a
//! flat table and reference children by index. A child is always pushed after
//! its parent, so walking the table backwards visits children before parents.

use array_init::array_init;
use log::trace;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::ops::Range;

use crate::crypto::hash::Hash;
use crate::trie::layout::TrieLayout;
use crate::trie::nibbles::{bytes_to_nibbles, common_prefix_len, nibbles_to_hex, Nibble};
use crate::trie::node::{ChildRef, Node, NodeIndex, NodeValue};
use crate::trie::sink::{NullSink, TrieSink};
use crate::trie::Entry;

/// Root of a trie without entries: BLAKE2b-256 of the empty node encoding
pub const EMPTY_TRIE_ROOT: Hash = Hash::new([
    0x03, 0x17, 0x0a, 0x2e, 0x75, 0x97, 0xb7, 0xb7, 0xe3, 0xd8, 0x4c, 0x05, 0x39, 0x1d, 0x13, 0x9a,
    0x62, 0xb1, 0x57, 0xe7, 0x87, 0x86, 0xd8, 0xc0, 0x82, 0xf2, 0x9d, 0xcf, 0x4c, 0x11, 0x13, 0x14,
]);

/// Builds the node table for a set of entries under one layout
#[derive(Debug, Clone, Copy)]
pub struct TrieBuilder {
    layout: TrieLayout,
}

/// A range of sorted entries waiting to become a node
struct Pending {
    range: Range<usize>,
    /// Nibbles already consumed by ancestors
    depth: usize,
    /// Distance from the root
    level: usize,
    parent: Option<(NodeIndex, Nibble)>,
}

impl TrieBuilder {
    pub fn new(layout: TrieLayout) -> Self {
        Self { layout }
    }

    /// Build the node table.
    ///
    /// When a key appears more than once the last occurrence wins.
    pub fn build<'a>(&self, entries: &'a [Entry]) -> NodeTable<'a> {
        let mut latest: BTreeMap<&'a [u8], &'a [u8]> = BTreeMap::new();
        for entry in entries {
            if latest.insert(&entry.key, &entry.value).is_some() {
                trace!("Duplicate key 0x{}, keeping the last value", hex::encode(&entry.key));
            }
        }

        // Byte order and nibble order agree, so the paths stay sorted
        let (paths, values): (Vec<Vec<Nibble>>, Vec<&'a [u8]>) = latest
            .into_iter()
            .map(|(key, value)| (bytes_to_nibbles(key), value))
            .unzip();

        let mut table = NodeTable {
            layout: self.layout,
            nodes: Vec::with_capacity(paths.len() * 2),
            levels: Vec::with_capacity(paths.len() * 2),
        };
        if paths.is_empty() {
            return table;
        }

        let mut stack = vec![Pending {
            range: 0..paths.len(),
            depth: 0,
            level: 0,
            parent: None,
        }];

        while let Some(Pending { range, depth, level, parent }) = stack.pop() {
            // Sorted input: the first and last path bound the shared prefix
            let first = &paths[range.start];
            let last = &paths[range.end - 1];
            let prefix_end = depth + common_prefix_len(&first[depth..], &last[depth..]);
            let partial_key = first[depth..prefix_end].to_vec();

            let index = table.nodes.len();
            if range.len() == 1 {
                let value = NodeValue::new(self.layout, values[range.start]);
                table.push(Node::leaf(partial_key, value), level);
            } else {
                // A key ending at the prefix sorts first and becomes the branch value
                let (value, children_start) = if first.len() == prefix_end {
                    (Some(NodeValue::new(self.layout, values[range.start])), range.start + 1)
                } else {
                    (None, range.start)
                };
                table.push(Node::branch(partial_key, value), level);

                let groups = group_by_nibble(&paths, children_start..range.end, prefix_end);
                for (nibble, group) in groups.into_iter().enumerate().rev() {
                    if let Some(group) = group {
                        stack.push(Pending {
                            range: group,
                            depth: prefix_end + 1,
                            level: level + 1,
                            parent: Some((index, nibble as Nibble)),
                        });
                    }
                }
            }

            if let Some((parent, nibble)) = parent {
                table.link(parent, nibble, index);
            }
        }

        table
    }
}

/// Split a sorted range by the nibble at `depth`
fn group_by_nibble(paths: &[Vec<Nibble>], range: Range<usize>, depth: usize) -> [Option<Range<usize>>; 16] {
    let mut groups: [Option<Range<usize>>; 16] = array_init(|_| None);
    let mut start = range.start;

    while start < range.end {
        let nibble = paths[start][depth];
        let end = start + paths[start..range.end].partition_point(|path| path[depth] <= nibble);
        groups[nibble as usize] = Some(start..end);
        start = end;
    }

    groups
}

/// Flat node table produced by [`TrieBuilder::build`]
#[derive(Debug, Clone)]
pub struct NodeTable<'a> {
    layout: TrieLayout,
    nodes: Vec<Node<'a>>,
    levels: Vec<usize>,
}

impl<'a> NodeTable<'a> {
    /// Layout the table was built with
    pub fn layout(&self) -> TrieLayout {
        self.layout
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the trie has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes; the root is at index 0
    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    /// Distance of a node from the root
    pub fn level(&self, index: NodeIndex) -> Option<usize> {
        self.levels.get(index).copied()
    }

    /// Root digest, hashing nodes one after another
    pub fn root_hash(&self) -> Hash {
        self.hash_into(&mut NullSink, false)
    }

    /// Hash every node bottom-up and return the root digest.
    ///
    /// Every hashed value and every node referenced by digest (plus the root)
    /// is handed to `sink`. With `parallel` set, each level of the trie is
    /// encoded on the rayon pool before moving up to its parents; the result
    /// is identical to the sequential walk.
    pub fn hash_into<S: TrieSink + ?Sized>(&self, sink: &mut S, parallel: bool) -> Hash {
        if self.nodes.is_empty() {
            return EMPTY_TRIE_ROOT;
        }

        for node in &self.nodes {
            if let Some(NodeValue::Hashed { digest, value }) = node.value() {
                sink.put_value(*digest, value);
            }
        }

        let mut refs = vec![ChildRef::default(); self.nodes.len()];
        let root_encoding = if parallel {
            self.encode_by_level(&mut refs, sink)
        } else {
            self.encode_sequential(&mut refs, sink)
        };

        let root = Hash::from_data(&root_encoding);
        sink.put_node(root, &root_encoding);
        root
    }

    fn encode_sequential<S: TrieSink + ?Sized>(&self, refs: &mut [ChildRef], sink: &mut S) -> Vec<u8> {
        for index in (1..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            let encoding = node.encode(refs);
            trace!(
                "Encoded {} {} at 0x{} ({} bytes)",
                node.node_type(),
                index,
                nibbles_to_hex(node.partial_key()),
                encoding.len()
            );
            refs[index] = resolve(encoding, sink);
        }

        self.nodes[0].encode(refs)
    }

    fn encode_by_level<S: TrieSink + ?Sized>(&self, refs: &mut [ChildRef], sink: &mut S) -> Vec<u8> {
        let depth = self.levels.iter().copied().max().unwrap_or(0);
        let mut by_level: Vec<Vec<NodeIndex>> = vec![Vec::new(); depth + 1];
        for (index, &level) in self.levels.iter().enumerate() {
            by_level[level].push(index);
        }

        // Level 0 is the root alone, encoded last without a child reference
        for (level, indices) in by_level.iter().enumerate().skip(1).rev() {
            let resolved: &[ChildRef] = refs;
            let encoded: Vec<(NodeIndex, Vec<u8>)> = indices
                .par_iter()
                .map(|&index| (index, self.nodes[index].encode(resolved)))
                .collect();

            trace!("Encoded level {} ({} nodes)", level, encoded.len());
            for (index, encoding) in encoded {
                refs[index] = resolve(encoding, sink);
            }
        }

        self.nodes[0].encode(refs)
    }

    fn push(&mut self, node: Node<'a>, level: usize) {
        self.nodes.push(node);
        self.levels.push(level);
    }

    fn link(&mut self, parent: NodeIndex, nibble: Nibble, child: NodeIndex) {
        if let Node::Branch { children, .. } = &mut self.nodes[parent] {
            children[nibble as usize] = Some(child);
        }
    }
}

/// Turn a child encoding into its reference, persisting it when hashed
fn resolve<S: TrieSink + ?Sized>(encoding: Vec<u8>, sink: &mut S) -> ChildRef {
    let child_ref = ChildRef::from_encoding(&encoding);
    if let ChildRef::Hashed(digest) = &child_ref {
        sink.put_node(*digest, &encoding);
    }
    child_ref
}
