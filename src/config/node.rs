use serde::{Deserialize, Serialize};

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name
    pub node_name: String,

    /// Data directory, holds the node key
    pub data_dir: String,

    /// Default log filter when RUST_LOG is not set
    pub log_level: String,

    /// Zero loads or creates a random node key; any other value derives a
    /// deterministic key and ignores the stored one
    pub rand_seed: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: "statetrie-node".to_string(),
            data_dir: "./data/statetrie".to_string(),
            log_level: "info".to_string(),
            rand_seed: 0,
        }
    }
}
