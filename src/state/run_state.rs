//! Pagination state for one harvest run
//!
//! `RunState` carries the page cursor and the counters the stop rule needs;
//! `RunPhase` is the controller's position in the fetch/load cycle.

use crate::HarvestError;
use std::fmt;

/// Where the pagination controller is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    // ===== Active Phases =====
    /// Nothing fetched yet
    Initial,

    /// A page request is in flight
    Fetching,

    /// Records of the last page are being normalized and inserted
    Loading,

    // ===== Terminal Phases =====
    /// Reported total reached, or the registry returned an empty page
    Done,

    /// A page fetch failed; pagination state is no longer trusted
    Failed,
}

impl RunPhase {
    /// Returns true if no further I/O happens in this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the controller may move from `self` to `next`
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Initial, Self::Fetching)
                | (Self::Fetching, Self::Loading)
                | (Self::Fetching, Self::Done)
                | (Self::Fetching, Self::Failed)
                | (Self::Loading, Self::Fetching)
                | (Self::Loading, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Fetching => "fetching",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cursor and counters for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    current_page: u32,
    cumulative_downloaded: u64,
    reported_total: u64,
    phase: RunPhase,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    /// Page 1, nothing downloaded
    pub fn new() -> Self {
        Self {
            current_page: 1,
            cumulative_downloaded: 0,
            reported_total: 0,
            phase: RunPhase::Initial,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn cumulative_downloaded(&self) -> u64 {
        self.cumulative_downloaded
    }

    pub fn reported_total(&self) -> u64 {
        self.reported_total
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn transition(&mut self, next: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Starts the first page request
    pub fn begin(&mut self) -> Result<(), HarvestError> {
        self.transition(RunPhase::Fetching)
    }

    /// Records a page with records; the latest reported total replaces the previous one
    pub fn page_received(&mut self, records: u64, reported_total: u64) -> Result<(), HarvestError> {
        self.transition(RunPhase::Loading)?;
        self.cumulative_downloaded += records;
        self.reported_total = reported_total;
        Ok(())
    }

    /// Ends the loading step: stops once the total is reached, else moves to the next page
    pub fn page_loaded(&mut self) -> Result<RunPhase, HarvestError> {
        if self.cumulative_downloaded >= self.reported_total {
            self.transition(RunPhase::Done)?;
        } else {
            self.transition(RunPhase::Fetching)?;
            self.current_page += 1;
        }
        Ok(self.phase)
    }

    /// The registry returned a page without records
    pub fn page_empty(&mut self) -> Result<(), HarvestError> {
        self.transition(RunPhase::Done)
    }

    /// The page fetch failed
    pub fn fetch_failed(&mut self) -> Result<(), HarvestError> {
        self.transition(RunPhase::Failed)
    }
}
