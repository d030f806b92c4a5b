//! Daily trigger
//!
//! Sleeps until the configured local wall-clock time, runs one harvest,
//! and repeats the next calendar day. A failed run is logged and does not
//! stop the schedule.

use crate::config::{parse_run_at, Config};
use crate::harvest::coordinator::run_once;
use crate::output::print_summary;
use crate::HarvestError;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};

/// Next occurrence of `at` strictly after `now`
///
/// Today if the time is still ahead, otherwise tomorrow.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        (now.date() + Duration::days(1)).and_time(at)
    }
}

/// Runs the harvest once per day until interrupted (Ctrl-C)
pub async fn run_daily(config: Config) -> Result<(), HarvestError> {
    let at = parse_run_at(&config.schedule.run_at)?;

    loop {
        let now = Local::now().naive_local();
        let next = next_run_after(now, at);
        let wait = (next - now)
            .to_std()
            .map_err(|e| HarvestError::Scheduler(e.to_string()))?;

        tracing::info!("Next harvest scheduled for {}", next.format("%Y-%m-%d %H:%M"));

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping scheduler");
                return Ok(());
            }
        }

        match run_once(&config).await {
            Ok(summary) => {
                if !summary.is_success() {
                    tracing::error!("Scheduled harvest ended in failure");
                }
                print_summary(&summary);
            }
            Err(e) => tracing::error!("Scheduled harvest aborted: {}", e),
        }
    }
}
