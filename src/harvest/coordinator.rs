//! Harvest coordinator - pagination controller
//!
//! This module contains the run loop that ties the pipeline together:
//! - Building the query for the current page
//! - Fetching the page and classifying the response
//! - Normalizing and loading every record, one row at a time
//! - Deciding when to stop against the latest reported total

use crate::config::{ApiConfig, Config};
use crate::harvest::fetcher::{build_http_client, fetch_page, PageFetch};
use crate::harvest::query::{build_query, SearchQuery};
use crate::output::{RunOutcome, RunSummary};
use crate::record::{normalize_record, SchemaVariant};
use crate::state::{RunPhase, RunState};
use crate::storage::{load_row, open_store, LoadOutcome, RowStore};
use crate::HarvestError;
use chrono::{Local, NaiveDate};
use reqwest::Client;

/// Pagination controller for one run
///
/// Strictly sequential: one request in flight, then one insert at a time.
pub struct Harvester<S: RowStore> {
    client: Client,
    api: ApiConfig,
    query: SearchQuery,
    store: S,
    table: String,
    variant: SchemaVariant,
    run_date: NaiveDate,
    state: RunState,
}

impl<S: RowStore> Harvester<S> {
    /// Creates a controller writing into `store`
    ///
    /// `run_date` anchors relative date windows and fills the import-date
    /// column of the extended layout.
    pub fn new(config: &Config, store: S, run_date: NaiveDate) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.api)?;

        Ok(Self {
            client,
            api: config.api.clone(),
            query: build_query(&config.query, run_date),
            store,
            table: config.database.table.clone(),
            variant: config.database.variant,
            run_date,
            state: RunState::new(),
        })
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the fetch → normalize → load cycle until a terminal phase
    ///
    /// A failed page fetch ends the run with [`RunOutcome::Failed`] and is
    /// not an `Err`. Store failures other than data validity abort the run
    /// and are returned; rows already inserted stay committed.
    pub async fn run(&mut self) -> Result<RunSummary, HarvestError> {
        self.state.begin()?;

        let mut summary = RunSummary::new(&self.table, self.variant, Local::now());
        tracing::info!(
            "Starting harvest into {} ({} layout), opened {} to {}",
            self.table,
            self.variant,
            self.query.open_date_range.start,
            self.query.open_date_range.end
        );

        loop {
            let page = self.state.current_page();
            self.query.set_page(page);

            tracing::info!("Querying page {}", page);
            summary.pages_requested += 1;

            match fetch_page(&self.client, &self.api, &self.query).await {
                PageFetch::Failure(failure) => {
                    tracing::error!("Registry query failed on page {}: {}", page, failure);
                    self.state.fetch_failed()?;
                    summary.outcome = RunOutcome::Failed(failure.kind());
                    break;
                }
                PageFetch::Empty { .. } => {
                    tracing::info!("No records on page {}, finishing", page);
                    self.state.page_empty()?;
                    break;
                }
                PageFetch::Page {
                    records,
                    reported_total,
                } => {
                    tracing::info!(
                        "Page {}: {} records (registry reports {} in total)",
                        page,
                        records.len(),
                        reported_total
                    );
                    self.state
                        .page_received(records.len() as u64, reported_total)?;

                    for record in &records {
                        let row = normalize_record(record, self.run_date);
                        match load_row(&mut self.store, &row, self.variant)? {
                            LoadOutcome::Inserted => summary.rows_inserted += 1,
                            LoadOutcome::Rejected { .. } => summary.rows_rejected += 1,
                        }
                    }

                    if self.state.page_loaded()? == RunPhase::Done {
                        tracing::info!(
                            "All {} reported records downloaded",
                            self.state.reported_total()
                        );
                        break;
                    }
                }
            }
        }

        summary.finish(&self.state);

        tracing::info!(
            "Harvest {}: {} pages, {} rows inserted, {} rejected",
            self.state.phase(),
            summary.pages_requested,
            summary.rows_inserted,
            summary.rows_rejected
        );

        Ok(summary)
    }
}

/// Runs one harvest with the given configuration
///
/// Opens the configured store (the table must already exist), runs the
/// pagination loop with today's local date, and closes the store.
pub async fn run_once(config: &Config) -> Result<RunSummary, HarvestError> {
    let store = open_store(&config.database)?;
    store.ensure_table()?;

    if config.api.api_key.is_empty() {
        tracing::warn!("No API key configured; the registry will likely reject the request");
    }

    let mut harvester = Harvester::new(config, store, Local::now().date_naive())?;
    harvester.run().await
}
