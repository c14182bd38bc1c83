use tempfile::tempdir;

use statetrie::config::{Config, ConfigError};
use statetrie::trie::{TrieLayout, DEFAULT_PARALLEL_THRESHOLD};
use statetrie::RootEngine;

#[test]
fn test_generate_default_config() {
    // Create a temporary directory for the config file
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("statetrie.toml");

    Config::generate_default(&path).unwrap();
    assert!(path.exists());

    let config = Config::load(&path).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.trie.state_version, TrieLayout::V1);
    assert_eq!(config.trie.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
}

#[test]
fn test_generate_default_keeps_existing_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("statetrie.toml");

    let mut config = Config::default();
    config.node.node_name = "custom".to_string();
    config.trie.state_version = TrieLayout::V0;
    config.save(&path).unwrap();

    Config::generate_default(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_and_load_config() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("statetrie.toml");

    let mut config = Config::default();
    config.node.data_dir = temp_dir.path().display().to_string();
    config.node.rand_seed = 7;
    config.trie.parallel_threshold = 0;
    config.save(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("state_version = \"v1\""));

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("statetrie.toml");
    std::fs::write(&path, "[trie]\nstate_version = \"V0\"\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.trie.state_version, TrieLayout::V0);
    assert_eq!(config.trie.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    assert_eq!(config.node, Config::default().node);

    let engine = RootEngine::from_config(&config.trie);
    assert_eq!(engine.layout(), TrieLayout::V0);
}

#[test]
fn test_load_missing_config() {
    let temp_dir = tempdir().unwrap();
    let result = Config::load(temp_dir.path().join("missing.toml"));

    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_load_invalid_version() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("statetrie.toml");
    std::fs::write(&path, "[trie]\nstate_version = \"v2\"\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().contains("must be one of [v0, v1]"));
}
