//! Run control for cancellation: a shared abort token.
//!
//! The scheduler stops admitting new resources once the token is set, and
//! every in-flight transfer polls it from curl's progress callback so it can
//! stop mid-body. Partial files are removed by the storage layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to one run's abort flag.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    abort: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation (e.g. on Ctrl-C). Idempotent.
    pub fn request_abort(&self) {
        if !self.abort.swap(true, Ordering::SeqCst) {
            tracing::info!("abort requested");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// The raw flag, for code that runs on blocking threads.
    pub fn token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }
}
