//! HTTP fetcher implementation
//!
//! This module handles the registry search call, including:
//! - Building the HTTP client
//! - POSTing the search body with the `api-key` header
//! - Parsing the response into records and the reported total
//! - Classifying terminal conditions (transport/status, malformed body, empty page)

use crate::config::ApiConfig;
use crate::harvest::query::SearchQuery;
use crate::record::{ApiRecord, SearchResponse};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Header carrying the registry credential
pub const API_KEY_HEADER: &str = "api-key";

/// Result of one page request
#[derive(Debug)]
pub enum PageFetch {
    /// At least one record came back
    Page {
        records: Vec<ApiRecord>,
        reported_total: u64,
    },

    /// The body parsed but held no records
    Empty { reported_total: u64 },

    /// The request or its body was unusable; the run must stop
    Failure(FetchFailure),
}

/// Why a page could not be used
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The request never produced a response (connect, timeout, body read)
    #[error("request failed: {0}")]
    Transport(String),

    /// The registry answered with a non-2xx status
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body is not the expected JSON
    #[error("malformed body ({error}): {body}")]
    MalformedBody { error: String, body: String },
}

/// Coarse failure class reported in run summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransportOrStatusError,
    MalformedBody,
}

impl FetchFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Status { .. } => FailureKind::TransportOrStatusError,
            Self::MalformedBody { .. } => FailureKind::MalformedBody,
        }
    }

    /// HTTP status, when the registry answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportOrStatusError => write!(f, "transport or status error"),
            Self::MalformedBody => write!(f, "malformed body"),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use cnpj_harvest::config::ApiConfig;
/// use cnpj_harvest::harvest::build_http_client;
///
/// let config = ApiConfig {
///     endpoint: "https://api.example.com/search".to_string(),
///     api_key: "secret".to_string(),
///     timeout_secs: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Requests one page of search results
///
/// Never retries. Any status outside 2xx, a failed body read, or a body
/// that does not parse ends up as [`PageFetch::Failure`].
pub async fn fetch_page(client: &Client, config: &ApiConfig, query: &SearchQuery) -> PageFetch {
    let response = match client
        .post(&config.endpoint)
        .header(API_KEY_HEADER, &config.api_key)
        .json(query)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return PageFetch::Failure(FetchFailure::Transport(e.to_string())),
    };

    let status = response.status();
    tracing::debug!("Registry responded with status {}", status.as_u16());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return PageFetch::Failure(FetchFailure::Transport(e.to_string())),
    };

    if !status.is_success() {
        return PageFetch::Failure(FetchFailure::Status {
            status: status.as_u16(),
            body,
        });
    }

    parse_page(&body)
}

/// Classifies a 2xx response body
pub fn parse_page(body: &str) -> PageFetch {
    let parsed: SearchResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return PageFetch::Failure(FetchFailure::MalformedBody {
                error: e.to_string(),
                body: body.to_string(),
            })
        }
    };

    match parsed.cnpjs {
        Some(records) if !records.is_empty() => PageFetch::Page {
            records,
            reported_total: parsed.total,
        },
        _ => PageFetch::Empty {
            reported_total: parsed.total,
        },
    }
}
