//! Per-run summary
//!
//! Counters collected by the pagination controller and printed when a run
//! ends.

use crate::harvest::FailureKind;
use crate::record::SchemaVariant;
use crate::state::RunState;
use chrono::{DateTime, Local};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Reported total reached or an empty page seen
    Done,
    /// A page fetch failed
    Failed(FailureKind),
}

/// Summary of one harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub table: String,
    pub variant: SchemaVariant,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,

    /// Page requests issued, including a failed or empty last one
    pub pages_requested: u32,

    /// Records received across all pages
    pub cumulative_downloaded: u64,

    /// Last total reported by the registry
    pub reported_total: u64,

    pub rows_inserted: u64,

    /// Rows refused by the store for data-validity reasons
    pub rows_rejected: u64,

    pub outcome: RunOutcome,
}

impl RunSummary {
    pub fn new(table: &str, variant: SchemaVariant, started_at: DateTime<Local>) -> Self {
        Self {
            table: table.to_string(),
            variant,
            started_at,
            finished_at: None,
            pages_requested: 0,
            cumulative_downloaded: 0,
            reported_total: 0,
            rows_inserted: 0,
            rows_rejected: 0,
            outcome: RunOutcome::Done,
        }
    }

    /// Copies the final counters out of the run state and stamps the end time
    pub fn finish(&mut self, state: &RunState) {
        self.cumulative_downloaded = state.cumulative_downloaded();
        self.reported_total = state.reported_total();
        self.finished_at = Some(Local::now());
    }

    /// Returns true unless a fatal failure stopped the run
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Done)
    }
}

/// Prints run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Target: {} ({} layout)", summary.table, summary.variant);
    println!("Started: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(finished) = summary.finished_at {
        let elapsed = finished.signed_duration_since(summary.started_at);
        println!(
            "Finished: {} ({}s)",
            finished.format("%Y-%m-%d %H:%M:%S"),
            elapsed.num_seconds()
        );
    }

    println!("\nPages requested: {}", summary.pages_requested);
    println!(
        "Records downloaded: {} of {} reported",
        summary.cumulative_downloaded, summary.reported_total
    );
    println!("Rows inserted: {}", summary.rows_inserted);

    if summary.rows_rejected > 0 {
        println!("⚠ Rows rejected by the store: {}", summary.rows_rejected);
    }

    match summary.outcome {
        RunOutcome::Done => println!("\n✓ Run completed"),
        RunOutcome::Failed(kind) => println!("\n✗ Run failed: {}", kind),
    }
}
