use log::{error, info};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

use statetrie::config::{Config, NodeConfig, TrieConfig};
use statetrie::crypto::setup_node_key;
use statetrie::init_logger_with_level;
use statetrie::trie::{parse_version_arg, Entry, RootEngine, TrieLayout};

#[derive(Debug, StructOpt)]
#[structopt(name = "statetrie", about = "State trie root and node key tool")]
enum Command {
    /// Compute the state root of a set of entries
    Root {
        /// Trie layout version (v0, v1, 0 or 1); defaults to the config value
        #[structopt(long, parse(try_from_str = parse_version_arg))]
        state_version: Option<TrieLayout>,

        /// JSON file with [{"key": "<hex>", "value": "<hex>"}, ...]
        #[structopt(long, parse(from_os_str))]
        input: Option<PathBuf>,

        /// Entry given as key=value, may be repeated
        #[structopt(long = "entry")]
        entries: Vec<String>,

        /// Treat --entry keys and values as hex instead of text
        #[structopt(long)]
        hex: bool,

        /// Node count from which hashing runs in parallel (0 disables)
        #[structopt(long)]
        parallel_threshold: Option<usize>,

        /// Config file providing defaults
        #[structopt(long, parse(from_os_str))]
        config: Option<PathBuf>,
    },

    /// Parse a trie layout version and print its label
    ParseVersion {
        /// Version label or number
        input: String,
    },

    /// Load or generate the node key and print its public key
    NodeKey {
        /// Config file
        #[structopt(long, parse(from_os_str))]
        config: Option<PathBuf>,

        /// Data directory
        #[structopt(long)]
        data_dir: Option<String>,

        /// Deterministic key seed (0 for a random, persisted key)
        #[structopt(long)]
        seed: Option<u64>,
    },
}

impl Command {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Root { config, .. } | Command::NodeKey { config, .. } => config.as_ref(),
            Command::ParseVersion { .. } => None,
        }
    }
}

fn parse_entry(s: &str, hex_encoded: bool) -> Result<Entry, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid entry {:?}, expected key=value", s))?;

    if hex_encoded {
        let key = hex::decode(key).map_err(|e| format!("invalid hex key {:?}: {}", key, e))?;
        let value = hex::decode(value).map_err(|e| format!("invalid hex value {:?}: {}", value, e))?;
        Ok(Entry::new(key, value))
    } else {
        Ok(Entry::new(key, value))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn Error>> {
    match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Ok(Config::load(path)?)
        }
        None => Ok(Config::default()),
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Root {
            state_version,
            input,
            entries,
            hex,
            parallel_threshold,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let trie_config = TrieConfig {
                state_version: state_version.unwrap_or(config.trie.state_version),
                parallel_threshold: parallel_threshold.unwrap_or(config.trie.parallel_threshold),
            };

            let mut all_entries: Vec<Entry> = match input {
                Some(path) => serde_json::from_str(&fs::read_to_string(&path)?)?,
                None => Vec::new(),
            };
            for raw in &entries {
                all_entries.push(parse_entry(raw, hex)?);
            }

            let root = RootEngine::from_config(&trie_config).root(&all_entries);
            println!("{}", root);
        }

        Command::ParseVersion { input } => {
            let layout = parse_version_arg(&input)?;
            println!("{}", layout);
        }

        Command::NodeKey {
            config,
            data_dir,
            seed,
        } => {
            let mut node_config = load_config(config.as_ref())?.node;
            if let Some(data_dir) = data_dir {
                node_config.data_dir = data_dir;
            }
            if let Some(seed) = seed {
                node_config.rand_seed = seed;
            }

            fs::create_dir_all(&node_config.data_dir)?;
            let keypair = setup_node_key(&node_config)?;
            println!("{}", hex::encode(keypair.public_bytes()));
        }
    }

    Ok(())
}

fn main() {
    let command = Command::from_args();

    // Initialize logger, RUST_LOG overrides the configured level
    let log_level = command
        .config_path()
        .and_then(|path| Config::load(path).ok())
        .map(|config| config.node.log_level)
        .unwrap_or_else(|| NodeConfig::default().log_level);
    init_logger_with_level(&log_level);

    if let Err(err) = run(command) {
        error!("{}", err);
        process::exit(1);
    }
}
