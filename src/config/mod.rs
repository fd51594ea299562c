//! Configuration module for Ladder-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a run without a configuration file targets the
//! Silver I solo queue ladder and writes into `./out`.
//!
//! # Example
//!
//! ```no_run
//! use ladder_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting matches from the last {} days", config.collector.lookback_days);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, CollectorConfig, Config, OutputConfig, RetryConfig, StoreBackend, RANKED_TIERS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, MAX_LOOKBACK_DAYS};
