use crate::record::SchemaVariant;
use serde::{Deserialize, Serialize};

/// Main configuration structure for CNPJ Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Registry API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Full URL of the search endpoint, query string included
    pub endpoint: String,

    /// Credential sent in the `api-key` header
    #[serde(rename = "api-key", default)]
    pub api_key: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Search parameters applied to every run
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Registration statuses to filter on
    #[serde(rename = "situacao-cadastral")]
    pub situacao_cadastral: Vec<RegistrationStatus>,

    /// State codes, sent as given
    pub uf: Vec<String>,

    /// Records requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Fixed start of the opening-date window (YYYY-MM-DD)
    #[serde(rename = "opened-from", default)]
    pub opened_from: Option<String>,

    /// Fixed end of the opening-date window (YYYY-MM-DD)
    #[serde(rename = "opened-to", default)]
    pub opened_to: Option<String>,

    /// Days before the run date where the window starts, when no fixed window is set
    #[serde(rename = "lookback-days", default)]
    pub lookback_days: u32,
}

/// Target store settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Table receiving the rows
    pub table: String,

    /// Column layout of the table
    #[serde(default)]
    pub variant: SchemaVariant,
}

/// Daily trigger settings
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time of the daily run (HH:MM)
    #[serde(rename = "run-at", default = "default_run_at")]
    pub run_at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_at: default_run_at(),
        }
    }
}

/// Registration status filter values understood by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    Ativa,
    Baixada,
    Inapta,
    Suspensa,
    Nula,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_run_at() -> String {
    "06:00".to_string()
}
