//! pagepull core: bounded-concurrency download of a numbered batch of
//! remote resources into a local directory, resumable by construction.

pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod url_model;
