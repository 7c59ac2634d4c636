//! Progress reporting for a batch (resources done, rate, ETA).
//!
//! The scheduler sends a snapshot every `progress_every` completions; the CLI
//! turns it into a status line.

/// Snapshot of batch progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// Resources finished successfully (downloaded + skipped).
    pub completed: u32,
    /// Of `completed`, how many were already valid on disk.
    pub skipped: u32,
    /// Resources that failed for good so far.
    pub failed: u32,
    /// Batch size.
    pub total: u32,
    /// Body bytes written so far.
    pub bytes: u64,
    /// Elapsed time since the batch started (seconds).
    pub elapsed_secs: f64,
}

impl BatchProgress {
    /// Completed resources per second (0 if elapsed is 0).
    pub fn per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 and work remains).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total.saturating_sub(self.completed + self.failed);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}
