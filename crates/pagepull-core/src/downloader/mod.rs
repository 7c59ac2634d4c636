//! Per-resource fetch-and-persist.
//!
//! [`fetch_resource`] is the unit of work the scheduler runs for each id:
//! skip when a valid file is already on disk, otherwise stream the body from
//! a [`Fetch`] implementation into a `.part` file (retrying transient
//! failures) and rename it into place. A body that is not larger than the
//! validity threshold is discarded and reported as
//! [`FetchError::Undersized`].

mod single;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::retry::{run_with_retry, FetchError, RetryPolicy};
use crate::storage::{self, PartFile};
use crate::url_model::Resource;

pub use single::{CurlFetcher, CurlOptions};

/// Source of resource bodies. Implementations run on a blocking thread and
/// must write the body into `sink` as it arrives (no full buffering), report
/// a non-2xx response as [`FetchError::FetchFailed`] and stop early with
/// [`FetchError::Aborted`] once `abort` is set.
pub trait Fetch: Send + Sync {
    fn fetch(
        &self,
        resource: &Resource,
        sink: &mut dyn Write,
        abort: &AtomicBool,
    ) -> Result<(), FetchError>;
}

/// Terminal success states for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOutcome {
    /// A valid file was already present; no network I/O happened.
    Skipped,
    /// The body was fetched and durably written.
    Downloaded { bytes: u64 },
}

/// Ensures a valid file exists at `resource.path`.
///
/// The `.part` file of a failed attempt is removed before the next attempt
/// or before the error is returned; files finished earlier are never touched.
pub fn fetch_resource(
    fetcher: &dyn Fetch,
    resource: &Resource,
    min_valid_bytes: u64,
    policy: &RetryPolicy,
    abort: &AtomicBool,
) -> Result<ResourceOutcome, FetchError> {
    let id = resource.id;
    if storage::is_valid_file(&resource.path, min_valid_bytes) {
        tracing::debug!(id, path = %resource.path.display(), "already present, skipping");
        return Ok(ResourceOutcome::Skipped);
    }
    if abort.load(Ordering::Relaxed) {
        return Err(FetchError::Aborted { id });
    }

    let bytes = run_with_retry(policy, abort, |attempt| {
        tracing::debug!(id, attempt, url = %resource.url, "fetching");
        let mut part = PartFile::create(&resource.path)
            .map_err(|cause| FetchError::WriteFailed { id, cause })?;
        fetcher.fetch(resource, &mut part, abort)?;
        let bytes = part.written();
        if bytes <= min_valid_bytes {
            part.discard();
            tracing::warn!(id, bytes, min_valid_bytes, "body too small, discarded");
            return Err(FetchError::Undersized {
                id,
                bytes,
                min_valid_bytes,
            });
        }
        part.finish()
            .map_err(|cause| FetchError::WriteFailed { id, cause })
    })?;

    tracing::debug!(id, bytes, "downloaded");
    Ok(ResourceOutcome::Downloaded { bytes })
}
