//! Batch scheduler.
//!
//! Drives the pipeline for ids `1..=N`: locate → skip-if-valid → fetch →
//! persist, with a bounded admission window, fail-fast or continue-on-error
//! handling, cancellation, and periodic progress.

mod check;
mod progress;
mod report;
mod window;

pub use check::{find_incomplete, Incomplete};
pub use progress::BatchProgress;
pub use report::{BatchError, RunReport};
pub use window::{run_batch, BatchOptions};
