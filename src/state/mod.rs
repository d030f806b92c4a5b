//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `RunPhase`: position of the pagination controller (initial, fetching, loading, done, failed)
//! - `RunState`: page cursor plus downloaded/reported counters for one run

mod run_state;

// Re-export main types
pub use run_state::{RunPhase, RunState};
