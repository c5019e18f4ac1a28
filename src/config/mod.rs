//! Configuration module for Spider
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every field has a default, so running without a file is equivalent to
//! loading an empty one.
//!
//! # Example
//!
//! ```no_run
//! use spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Flushing every {} records", config.crawler.flush_threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DatabaseConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
