use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{LookupUrl, MergedRow, PrimaryRecord};
use crate::error::ScrapeError;
use crate::metacritic::{self, RatingsClient};
use crate::sink::RowSink;
use crate::vgchartz::{self, CatalogClient, RawRow};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub ratings_base_url: String,
    /// 0 means no cap.
    pub max_records: usize,
    /// Pause before each Metacritic request.
    pub wait: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    SalesFloor,
    RecordCap,
    SourceExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SalesFloor => write!(f, "No more games with sales figures. Ending."),
            StopReason::RecordCap => write!(f, "Reached max_games limit. Ending."),
            StopReason::SourceExhausted => write!(f, "No more VGChartz pages. Ending."),
        }
    }
}

/// Counters threaded through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub page: u32,
    pub pages_requested: u32,
    pub scraped: usize,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            page: 1,
            pages_requested: 0,
            scraped: 0,
        }
    }
}

pub enum Phase {
    FetchingPage,
    ProcessingRows(std::vec::IntoIter<RawRow>),
    Done(StopReason),
}

/// Sales-sorted source: the first zero means every later row is zero too.
pub fn sales_floor(record: &PrimaryRecord) -> Option<StopReason> {
    record
        .global_sales
        .is_zero()
        .then_some(StopReason::SalesFloor)
}

pub fn record_cap(scraped: usize, max_records: usize) -> Option<StopReason> {
    (max_records > 0 && scraped >= max_records).then_some(StopReason::RecordCap)
}

/// Next phase after a page comes back: rows to process, or done when the
/// chart has no data rows left.
pub fn after_page(rows: Vec<RawRow>) -> Phase {
    if rows.iter().all(RawRow::is_empty) {
        Phase::Done(StopReason::SourceExhausted)
    } else {
        Phase::ProcessingRows(rows.into_iter())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scraped: usize,
    pub pages_requested: u32,
    pub stop_reason: StopReason,
    pub elapsed_secs: f64,
}

pub struct Pipeline<'a, C: CatalogClient, R: RatingsClient> {
    catalog: &'a C,
    ratings: &'a R,
    options: RunOptions,
}

impl<'a, C: CatalogClient, R: RatingsClient> Pipeline<'a, C, R> {
    pub fn new(catalog: &'a C, ratings: &'a R, options: RunOptions) -> Self {
        Self {
            catalog,
            ratings,
            options,
        }
    }

    /// Walks the catalog page by page until the sales floor, the record cap
    /// or an empty page, writing one merged row per title to `sink`.
    ///
    /// Catalog fetch failures and malformed chart markup end the run with an
    /// error; rows already handed to `sink` stay written.
    pub fn run(
        &self,
        sink: &mut dyn RowSink,
        progress: &dyn ProgressSink,
    ) -> Result<RunSummary, ScrapeError> {
        let started = Instant::now();
        let mut state = RunState::default();
        let mut phase = Phase::FetchingPage;

        let reason = loop {
            phase = match phase {
                Phase::FetchingPage => {
                    progress.event(ProgressEvent {
                        message: format!("Connecting to VGChartz Page {}...", state.page),
                        elapsed: Some(started.elapsed()),
                    });
                    let html = self.catalog.fetch_page(state.page)?;
                    state.pages_requested += 1;
                    after_page(vgchartz::parse_page(state.page, &html)?)
                }
                Phase::ProcessingRows(mut rows) => match rows.next() {
                    None => {
                        state.page += 1;
                        Phase::FetchingPage
                    }
                    Some(raw) => match vgchartz::parse_row(&raw)? {
                        None => Phase::ProcessingRows(rows),
                        Some(record) => match self.process(record, &mut state, sink, progress)? {
                            Some(reason) => Phase::Done(reason),
                            None => Phase::ProcessingRows(rows),
                        },
                    },
                },
                Phase::Done(reason) => break reason,
            };
        };

        info!(scraped = state.scraped, pages = state.pages_requested, ?reason, "run finished");
        progress.event(ProgressEvent {
            message: reason.to_string(),
            elapsed: Some(started.elapsed()),
        });

        Ok(RunSummary {
            scraped: state.scraped,
            pages_requested: state.pages_requested,
            stop_reason: reason,
            elapsed_secs: (started.elapsed().as_secs_f64() * 100.0).round() / 100.0,
        })
    }

    fn process(
        &self,
        record: PrimaryRecord,
        state: &mut RunState,
        sink: &mut dyn RowSink,
        progress: &dyn ProgressSink,
    ) -> Result<Option<StopReason>, ScrapeError> {
        if let Some(reason) = sales_floor(&record) {
            return Ok(Some(reason));
        }
        progress.event(ProgressEvent {
            message: format!("{} {}", state.scraped + 1, record.name),
            elapsed: None,
        });

        let lookup = metacritic::lookup_url(&self.options.ratings_base_url, &record);
        if let LookupUrl::Available(url) = &lookup {
            debug!(%url, "looking up Metacritic page");
            if !self.options.wait.is_zero() {
                thread::sleep(self.options.wait);
            }
        }
        let secondary = metacritic::fetch_secondary(self.ratings, &lookup);

        sink.write_row(&MergedRow::new(record, secondary))?;
        state.scraped += 1;
        Ok(record_cap(state.scraped, self.options.max_records))
    }
}
