// Cryptography module
//
// - BLAKE2b-256 hashing for trie nodes, hashed values and state roots
// - Node identity key management

pub mod hash;
pub mod keys;

// Re-export main components for easier access
pub use hash::{blake2b_256, Hash, HASH_LENGTH};
pub use keys::{
    generate_node_key, load_node_key, node_key_path, setup_node_key, KeyError, NodeKeypair,
    NODE_KEY_FILE,
};
