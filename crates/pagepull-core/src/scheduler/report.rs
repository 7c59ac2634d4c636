//! Batch outcome: the summary report and the batch-level error.

use serde::Serialize;

use crate::retry::FetchError;

/// Summary of one batch run. Serializable so the CLI can write it as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub total: u32,
    /// Fetched over the network during this run.
    pub downloaded: u32,
    /// Already valid on disk; no request made.
    pub skipped: u32,
    /// Body bytes written during this run.
    pub bytes: u64,
    /// Ids that failed for good, ascending.
    pub failed_ids: Vec<u32>,
    /// In-flight resources stopped by cancellation.
    pub aborted: u32,
    /// Ids never started (fail-fast stop or cancellation).
    pub not_attempted: u32,
    pub elapsed_secs: f64,
}

impl RunReport {
    /// Resources that ended valid on disk.
    pub fn completed(&self) -> u32 {
        self.downloaded + self.skipped
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.total
    }
}

/// Why a batch did not end with every resource valid on disk.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,
    /// One or more resources failed. In fail-fast mode the list holds the
    /// triggering failure plus any sibling that failed while draining.
    #[error("{}", describe_failures(.failures))]
    Failed {
        failures: Vec<FetchError>,
        report: RunReport,
    },
    #[error("cancelled after {} of {} resources", .report.completed(), .report.total)]
    Cancelled { report: RunReport },
    /// A worker task panicked; the batch was stopped.
    #[error("worker task failed: {message}")]
    Worker { message: String, report: RunReport },
}

impl BatchError {
    /// The partial report, if the batch got far enough to produce one.
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            BatchError::InvalidConcurrency => None,
            BatchError::Failed { report, .. }
            | BatchError::Cancelled { report }
            | BatchError::Worker { report, .. } => Some(report),
        }
    }

    /// Ids of resources that failed, ascending.
    pub fn failed_ids(&self) -> Vec<u32> {
        self.report()
            .map(|r| r.failed_ids.clone())
            .unwrap_or_default()
    }
}

fn describe_failures(failures: &[FetchError]) -> String {
    match failures {
        [] => "batch failed".to_string(),
        [only] => only.to_string(),
        [first, ..] => {
            let mut ids: Vec<u32> = failures.iter().map(FetchError::id).collect();
            ids.sort_unstable();
            let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
            format!(
                "{} resources failed (ids {}); first: {}",
                failures.len(),
                ids.join(", "),
                first
            )
        }
    }
}
