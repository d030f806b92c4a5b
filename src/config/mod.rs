//! Configuration module for CNPJ Harvest
//!
//! This module handles loading, parsing, and validating the TOML
//! configuration file, with environment variables (and `.env`) layered on top.
//!
//! # Example
//!
//! ```no_run
//! use cnpj_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Page size: {}", config.query.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, DatabaseConfig, QueryConfig, RegistrationStatus, ScheduleConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, load_dotenv,
    ENV_API_KEY, ENV_DATABASE_PATH, ENV_TABLE,
};
pub use validation::parse_run_at;
