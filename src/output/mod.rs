//! Output module for run reporting
//!
//! This module handles:
//! - Collecting per-run counters
//! - Printing the end-of-run summary

mod summary;

pub use summary::{print_summary, RunOutcome, RunSummary};
