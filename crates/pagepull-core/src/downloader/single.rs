//! Single-stream HTTP GET over libcurl's easy interface.
//!
//! The body is handed to the sink chunk by chunk as curl receives it, so
//! nothing is buffered beyond curl's own receive buffer.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::PagepullConfig;
use crate::retry::FetchError;
use crate::url_model::Resource;

use super::Fetch;

/// Per-transfer curl settings.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Hard wall-clock limit for the whole transfer.
    pub timeout: Duration,
    /// Abort if throughput stays below `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
        }
    }
}

impl CurlOptions {
    pub fn from_config(cfg: &PagepullConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.timeout(),
            ..Self::default()
        }
    }
}

/// [`Fetch`] implementation backed by one curl easy handle per transfer.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    opts: CurlOptions,
}

impl CurlFetcher {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

impl Fetch for CurlFetcher {
    fn fetch(
        &self,
        resource: &Resource,
        sink: &mut dyn Write,
        abort: &AtomicBool,
    ) -> Result<(), FetchError> {
        let id = resource.id;
        let transport = move |cause: curl::Error| FetchError::TransportError { id, cause };

        let mut easy = curl::easy::Easy::new();
        easy.url(&resource.url).map_err(transport)?;
        easy.get(true).map_err(transport)?;
        easy.follow_location(true).map_err(transport)?;
        easy.max_redirections(10).map_err(transport)?;
        easy.useragent(concat!("pagepull/", env!("CARGO_PKG_VERSION")))
            .map_err(transport)?;
        easy.connect_timeout(self.opts.connect_timeout)
            .map_err(transport)?;
        easy.low_speed_limit(self.opts.low_speed_limit)
            .map_err(transport)?;
        easy.low_speed_time(self.opts.low_speed_time)
            .map_err(transport)?;
        easy.timeout(self.opts.timeout).map_err(transport)?;
        easy.progress(true).map_err(transport)?;

        // Status of the most recent response; redirects produce several header blocks.
        let status = Cell::new(0u32);
        let sink_error: RefCell<Option<io::Error>> = RefCell::new(None);

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Some(code) = parse_http_status(data) {
                        status.set(code);
                    }
                    true
                })
                .map_err(transport)?;
            transfer
                .write_function(|data| {
                    if !is_success(status.get()) {
                        // Error page body: swallow it, the status check below reports the failure.
                        return Ok(data.len());
                    }
                    match sink.write_all(data) {
                        Ok(()) => Ok(data.len()),
                        Err(e) => {
                            sink_error.borrow_mut().replace(e);
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(transport)?;
            transfer
                .progress_function(|_, _, _, _| !abort.load(Ordering::Relaxed))
                .map_err(transport)?;
            transfer.perform()
        };

        if let Err(e) = perform_result {
            if e.is_aborted_by_callback() {
                return Err(FetchError::Aborted { id });
            }
            if e.is_write_error() {
                if let Some(cause) = sink_error.borrow_mut().take() {
                    return Err(FetchError::WriteFailed { id, cause });
                }
            }
            return Err(transport(e));
        }

        let code = easy.response_code().map_err(transport)?;
        if !is_success(code) {
            return Err(FetchError::FetchFailed { id, status: code });
        }
        sink.flush()
            .map_err(|cause| FetchError::WriteFailed { id, cause })?;
        Ok(())
    }
}

fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}

/// Parses the status code from an `HTTP/x y reason` header line.
fn parse_http_status(line: &[u8]) -> Option<u32> {
    let line = str::from_utf8(line).ok()?.trim_end();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
