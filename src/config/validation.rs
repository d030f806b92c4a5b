use crate::config::types::{ApiConfig, Config, DatabaseConfig, QueryConfig, ScheduleConfig};
use crate::storage::TableName;
use crate::ConfigError;
use chrono::NaiveTime;
use url::Url;

/// Largest page the registry accepts
const MAX_PAGE_SIZE: u32 = 1000;
const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_query_config(&config.query)?;
    validate_database_config(&config.database)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

/// Validates the registry endpoint
///
/// The API key is deliberately left alone: an empty key reaches the
/// registry and comes back as its rejection.
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the search parameters
///
/// State codes and dates are passed through untouched.
fn validate_query_config(config: &QueryConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.opened_from.is_some() != config.opened_to.is_some() {
        return Err(ConfigError::Validation(
            "opened_from and opened_to must be set together".to_string(),
        ));
    }

    if config.lookback_days > MAX_LOOKBACK_DAYS {
        return Err(ConfigError::Validation(format!(
            "lookback_days must be at most {}, got {}",
            MAX_LOOKBACK_DAYS, config.lookback_days
        )));
    }

    Ok(())
}

/// Validates the target store
fn validate_database_config(config: &DatabaseConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "database path cannot be empty".to_string(),
        ));
    }

    TableName::parse(&config.table)?;

    Ok(())
}

fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    parse_run_at(&config.run_at)?;
    Ok(())
}

/// Parses a daily trigger time in `HH:MM` form
pub fn parse_run_at(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        ConfigError::Validation(format!("run_at must be HH:MM, got '{}'", value))
    })
}
