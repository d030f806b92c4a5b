//! Search request construction
//!
//! Builds the JSON body of the registry search. Nothing here is validated:
//! state codes and dates travel to the registry as configured.

use crate::config::{QueryConfig, RegistrationStatus};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Wire format of the opening-date bounds
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Opening-date window of a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    #[serde(rename = "inicio")]
    pub start: String,
    #[serde(rename = "fim")]
    pub end: String,
}

/// Body of one search request
///
/// Everything but `page_number` is fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(rename = "situacao_cadastral")]
    pub status: BTreeSet<RegistrationStatus>,
    #[serde(rename = "uf")]
    pub jurisdictions: Vec<String>,
    #[serde(rename = "data_abertura")]
    pub open_date_range: DateWindow,
    #[serde(rename = "limite")]
    pub page_size: u32,
    #[serde(rename = "pagina")]
    pub page_number: u32,
}

impl SearchQuery {
    /// Points the query at another page (1-based)
    pub fn set_page(&mut self, page: u32) {
        debug_assert!(page >= 1, "pages are 1-based");
        self.page_number = page.max(1);
    }
}

/// Builds the page-1 query for a run starting on `run_date`
pub fn build_query(config: &QueryConfig, run_date: NaiveDate) -> SearchQuery {
    SearchQuery {
        status: config.situacao_cadastral.iter().copied().collect(),
        jurisdictions: config.uf.clone(),
        open_date_range: date_window(config, run_date),
        page_size: config.page_size,
        page_number: 1,
    }
}

/// Fixed window when configured, otherwise `run_date - lookback_days ..= run_date`
fn date_window(config: &QueryConfig, run_date: NaiveDate) -> DateWindow {
    match (&config.opened_from, &config.opened_to) {
        (Some(start), Some(end)) => DateWindow {
            start: start.clone(),
            end: end.clone(),
        },
        _ => {
            // Unvalidated configs can reach here; clamp instead of overflowing.
            let start = run_date
                .checked_sub_signed(Duration::days(i64::from(config.lookback_days)))
                .unwrap_or(NaiveDate::MIN);
            DateWindow {
                start: start.format(QUERY_DATE_FORMAT).to_string(),
                end: run_date.format(QUERY_DATE_FORMAT).to_string(),
            }
        }
    }
}
