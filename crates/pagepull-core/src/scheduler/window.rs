//! Sliding admission window over resource ids.
//!
//! Ids are submitted in ascending order. Starting an operation takes a permit
//! from a semaphore sized `concurrency_limit`; the permit moves into the task
//! and is released when the fetch settles. When no permit is free the driver
//! waits for whichever operation settles first (`JoinSet::join_next`) before
//! admitting another. After the last id is submitted, the remaining
//! operations are drained.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::{FailureMode, PagepullConfig};
use crate::control::RunControl;
use crate::downloader::{self, Fetch, ResourceOutcome};
use crate::retry::{FetchError, RetryPolicy};
use crate::url_model::Locate;

use super::progress::BatchProgress;
use super::report::{BatchError, RunReport};

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Ids `1..=total_count` are processed.
    pub total_count: u32,
    /// Upper bound on unsettled fetch operations.
    pub concurrency_limit: usize,
    pub min_valid_bytes: u64,
    /// Log and send a progress snapshot after every this many completions.
    pub progress_every: u64,
    pub failure_mode: FailureMode,
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&PagepullConfig::default())
    }
}

impl BatchOptions {
    pub fn from_config(cfg: &PagepullConfig) -> Self {
        Self {
            total_count: cfg.total_count,
            concurrency_limit: cfg.concurrency_limit,
            min_valid_bytes: cfg.min_valid_bytes,
            progress_every: cfg.progress_every.max(1),
            failure_mode: cfg.failure_mode,
            retry: cfg
                .retry
                .as_ref()
                .map(RetryPolicy::from_config)
                .unwrap_or_else(RetryPolicy::none),
        }
    }
}

/// Counters and failures owned by the driver; only it mutates them.
struct RunState {
    total: u32,
    started: Instant,
    downloaded: u32,
    skipped: u32,
    bytes: u64,
    aborted: u32,
    submitted: u32,
    failures: Vec<FetchError>,
    worker_error: Option<String>,
}

impl RunState {
    fn new(total: u32) -> Self {
        Self {
            total,
            started: Instant::now(),
            downloaded: 0,
            skipped: 0,
            bytes: 0,
            aborted: 0,
            submitted: 0,
            failures: Vec::new(),
            worker_error: None,
        }
    }

    fn completed(&self) -> u32 {
        self.downloaded + self.skipped
    }

    fn record(&mut self, outcome: ResourceOutcome) {
        match outcome {
            ResourceOutcome::Skipped => self.skipped += 1,
            ResourceOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
        }
    }

    fn progress(&self) -> BatchProgress {
        BatchProgress {
            completed: self.completed(),
            skipped: self.skipped,
            failed: self.failures.len() as u32,
            total: self.total,
            bytes: self.bytes,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    fn report_progress(&self, progress_tx: Option<&mpsc::Sender<BatchProgress>>) {
        let snapshot = self.progress();
        tracing::info!(
            completed = snapshot.completed,
            total = snapshot.total,
            skipped = snapshot.skipped,
            "progress: {}/{}",
            snapshot.completed,
            snapshot.total
        );
        if let Some(tx) = progress_tx {
            let _ = tx.try_send(snapshot);
        }
    }

    fn into_report(mut self) -> (RunReport, Vec<FetchError>, Option<String>) {
        let mut failed_ids: Vec<u32> = self.failures.iter().map(FetchError::id).collect();
        failed_ids.sort_unstable();
        let report = RunReport {
            total: self.total,
            downloaded: self.downloaded,
            skipped: self.skipped,
            bytes: self.bytes,
            failed_ids,
            aborted: self.aborted,
            not_attempted: self.total - self.submitted,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        };
        (report, std::mem::take(&mut self.failures), self.worker_error.take())
    }
}

/// Runs the batch: ensures a valid file exists for every id in `1..=total_count`.
///
/// Never more than `opts.concurrency_limit` fetch operations are unsettled at
/// once. On a resource failure in [`FailureMode::FailFast`] no further ids are
/// admitted; operations already in flight are allowed to finish (their files
/// are kept) and the batch then fails naming the failed id(s). In
/// [`FailureMode::Continue`] every id is attempted. Setting the abort flag on
/// `control` stops admission and aborts in-flight transfers; their partial
/// files are removed.
pub async fn run_batch(
    opts: &BatchOptions,
    locator: &dyn Locate,
    fetcher: Arc<dyn Fetch>,
    control: &RunControl,
    progress_tx: Option<&mpsc::Sender<BatchProgress>>,
) -> Result<RunReport, BatchError> {
    if opts.concurrency_limit == 0 {
        return Err(BatchError::InvalidConcurrency);
    }
    let limit = opts.concurrency_limit;
    let every = opts.progress_every.max(1);

    tracing::info!(
        total = opts.total_count,
        concurrency = limit,
        mode = ?opts.failure_mode,
        "starting batch"
    );

    let mut state = RunState::new(opts.total_count);
    let permits = Arc::new(Semaphore::new(limit.min(Semaphore::MAX_PERMITS)));
    let mut join_set: JoinSet<(u32, Result<ResourceOutcome, FetchError>)> = JoinSet::new();
    let mut created_dirs: HashSet<PathBuf> = HashSet::new();
    let mut next_id = 1u32;
    let mut admitting = true;

    loop {
        while admitting && next_id <= opts.total_count {
            if control.is_aborted() {
                admitting = false;
                break;
            }
            let Ok(permit) = Arc::clone(&permits).try_acquire_owned() else {
                break;
            };
            let resource = locator.locate(next_id);
            next_id += 1;
            state.submitted += 1;

            let id = resource.id;
            if let Some(parent) = resource.path.parent() {
                if !parent.as_os_str().is_empty() && !created_dirs.contains(parent) {
                    if let Err(cause) = std::fs::create_dir_all(parent) {
                        tracing::error!(id, dir = %parent.display(), "cannot create output directory: {}", cause);
                        state.failures.push(FetchError::WriteFailed { id, cause });
                        if opts.failure_mode == FailureMode::FailFast {
                            admitting = false;
                        }
                        continue;
                    }
                    created_dirs.insert(parent.to_path_buf());
                }
            }

            let fetcher = Arc::clone(&fetcher);
            let abort = control.token();
            let retry = opts.retry;
            let min_valid_bytes = opts.min_valid_bytes;
            join_set.spawn_blocking(move || {
                let _permit = permit;
                let res = downloader::fetch_resource(
                    fetcher.as_ref(),
                    &resource,
                    min_valid_bytes,
                    &retry,
                    &abort,
                );
                (resource.id, res)
            });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        match joined {
            Ok((_, Ok(outcome))) => {
                state.record(outcome);
                if u64::from(state.completed()) % every == 0 {
                    state.report_progress(progress_tx);
                }
            }
            Ok((id, Err(e))) if e.is_aborted() => {
                tracing::debug!(id, "aborted in flight");
                state.aborted += 1;
            }
            Ok((id, Err(e))) => {
                tracing::error!(id, "resource failed: {}", e);
                state.failures.push(e);
                if opts.failure_mode == FailureMode::FailFast && admitting {
                    tracing::warn!(id, in_flight = join_set.len(), "fail-fast: no further resources will be started");
                    admitting = false;
                }
            }
            Err(join_err) => {
                tracing::error!("worker task failed: {}", join_err);
                if state.worker_error.is_none() {
                    state.worker_error = Some(join_err.to_string());
                }
                admitting = false;
                control.request_abort();
            }
        }
    }

    let cancelled = control.is_aborted();
    let (report, failures, worker_error) = state.into_report();
    tracing::info!(
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed_ids.len(),
        aborted = report.aborted,
        not_attempted = report.not_attempted,
        elapsed_secs = report.elapsed_secs,
        "batch finished"
    );

    if let Some(message) = worker_error {
        return Err(BatchError::Worker { message, report });
    }
    if !failures.is_empty() {
        return Err(BatchError::Failed { failures, report });
    }
    if cancelled && !report.is_complete() {
        return Err(BatchError::Cancelled { report });
    }

    if let Some(tx) = progress_tx {
        if report.completed() != 0 && u64::from(report.completed()) % every != 0 {
            let _ = tx.try_send(BatchProgress {
                completed: report.completed(),
                skipped: report.skipped,
                failed: 0,
                total: report.total,
                bytes: report.bytes,
                elapsed_secs: report.elapsed_secs,
            });
        }
    }
    tracing::info!("{} of {} complete", report.completed(), report.total);
    Ok(report)
}
