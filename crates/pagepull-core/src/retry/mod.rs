//! Per-resource failures and what to do about them.
//!
//! [`FetchError`] says why one resource failed; [`classify`] sorts it into a
//! transient or permanent [`ErrorKind`]; [`run_with_retry`] repeats the
//! attempt under a [`RetryPolicy`] until it succeeds, runs out of attempts,
//! or the run is cancelled.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
