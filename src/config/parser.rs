use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Environment variable holding the registry credential
pub const ENV_API_KEY: &str = "CNPJ_API_KEY";

/// Environment variable overriding `database.path`
pub const ENV_DATABASE_PATH: &str = "CNPJ_DATABASE_PATH";

/// Environment variable overriding `database.table`
pub const ENV_TABLE: &str = "CNPJ_TABLE";

/// Loads and parses a configuration file from the given path
///
/// Values from the process environment are layered on top of the file
/// before validation (see [`apply_env_overrides`]).
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use cnpj_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Target table: {}", config.database.table);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate(&config)?;

    Ok(config)
}

/// Layers environment-provided values over a parsed configuration
///
/// The API key is only taken from the environment when the file leaves it
/// empty; the database path and table are overridden whenever set.
pub fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if config.api.api_key.is_empty() {
        if let Some(key) = var(ENV_API_KEY) {
            config.api.api_key = key;
        }
    }

    if let Some(path) = var(ENV_DATABASE_PATH).filter(|v| !v.is_empty()) {
        config.database.path = path;
    }

    if let Some(table) = var(ENV_TABLE).filter(|v| !v.is_empty()) {
        config.database.table = table;
    }
}

/// Loads a `.env` file from the working directory, falling back to the
/// directory holding the configuration file
///
/// Returns the file that was read, if any. Variables already set in the
/// process environment are not overwritten.
pub fn load_dotenv(config_path: &Path) -> Option<PathBuf> {
    if let Ok(path) = dotenv::dotenv() {
        return Some(path);
    }

    let candidate = config_dotenv_path(config_path)?;
    dotenv::from_path(&candidate).ok().map(|_| candidate)
}

/// `.env` next to the configuration file, unless that is the working directory
fn config_dotenv_path(config_path: &Path) -> Option<PathBuf> {
    let dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())?;
    Some(dir.join(".env"))
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so separate runs can be tied to the exact file they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
