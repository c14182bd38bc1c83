use log::{error, info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

use statetrie::config::Config;
use statetrie::init_logger;
use statetrie::trie::{parse_version_arg, TrieLayout};

#[derive(Debug, StructOpt)]
#[structopt(name = "statetrie-config", about = "statetrie configuration tool")]
struct Opt {
    /// Generate a default configuration
    #[structopt(long)]
    generate: bool,

    /// Output file
    #[structopt(long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Input file to validate and print
    #[structopt(long, parse(from_os_str))]
    input: Option<PathBuf>,

    /// Node name
    #[structopt(long)]
    node_name: Option<String>,

    /// Data directory
    #[structopt(long)]
    data_dir: Option<String>,

    /// Log level
    #[structopt(long)]
    log_level: Option<String>,

    /// Deterministic node key seed
    #[structopt(long)]
    rand_seed: Option<u64>,

    /// State trie layout version (v0, v1, 0 or 1)
    #[structopt(long, parse(try_from_str = parse_version_arg))]
    state_version: Option<TrieLayout>,

    /// Node count from which trie hashing runs in parallel
    #[structopt(long)]
    parallel_threshold: Option<usize>,
}

fn print_config(config: &Config) {
    match config.to_toml() {
        Ok(config_str) => {
            println!("{}", config_str);
        }
        Err(e) => {
            error!("Failed to serialize configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Default configuration with the command line overrides applied
fn generated_config(opt: Opt) -> Config {
    let mut config = Config::default();

    if let Some(node_name) = opt.node_name {
        config.node.node_name = node_name;
    }

    if let Some(data_dir) = opt.data_dir {
        config.node.data_dir = data_dir;
    }

    if let Some(log_level) = opt.log_level {
        config.node.log_level = log_level;
    }

    if let Some(rand_seed) = opt.rand_seed {
        config.node.rand_seed = rand_seed;
    }

    if let Some(state_version) = opt.state_version {
        config.trie.state_version = state_version;
    }

    if let Some(parallel_threshold) = opt.parallel_threshold {
        if parallel_threshold == 0 {
            warn!("Parallel trie hashing disabled");
        }
        config.trie.parallel_threshold = parallel_threshold;
    }

    config
}

fn main() {
    // Initialize logger
    init_logger();

    // Parse command line arguments
    let opt = Opt::from_args();

    if opt.generate {
        let output = opt.output.clone();
        let config = generated_config(opt);

        // Save the configuration
        if let Some(output) = output {
            match config.save(&output) {
                Ok(_) => {
                    info!("Configuration saved to {:?}", output);
                }
                Err(e) => {
                    error!("Failed to save configuration: {}", e);
                    std::process::exit(1);
                }
            }
        } else {
            print_config(&config);
        }
    } else if let Some(input) = opt.input {
        // Load the configuration
        match Config::load(&input) {
            Ok(config) => print_config(&config),
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        // Print help
        let _ = Opt::clap().print_help();
        println!();
    }
}
