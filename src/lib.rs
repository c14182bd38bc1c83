// statetrie - Versioned Merkle Patricia state trie roots for a Substrate-style blockchain client

pub mod config;
pub mod crypto;
pub mod trie;

pub use crypto::Hash;
pub use trie::{
    parse_version, parse_version_arg, Entries, Entry, ParseVersionError, RootEngine, TrieLayout,
};

// Initialize logging
pub fn init_logger() {
    env_logger::init();
}

/// Initialize logging with `level` as the default filter; RUST_LOG still wins
pub fn init_logger_with_level(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
