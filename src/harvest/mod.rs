//! Harvest module for registry paging and loading
//!
//! This module contains the pipeline itself:
//! - Search query construction
//! - Page fetching and response classification
//! - The pagination controller
//! - The daily trigger

mod coordinator;
mod fetcher;
mod query;
mod scheduler;

pub use coordinator::{run_once, Harvester};
pub use fetcher::{
    build_http_client, fetch_page, parse_page, FailureKind, FetchFailure, PageFetch,
    API_KEY_HEADER,
};
pub use query::{build_query, DateWindow, SearchQuery, QUERY_DATE_FORMAT};
pub use scheduler::{next_run_after, run_daily};
