//! Disk I/O and file lifecycle.
//!
//! A resource counts as done when a regular file larger than the configured
//! threshold sits at its final path. Bodies are streamed into a `.part` file
//! next to it, synced, and atomically renamed into place; a `.part` that is
//! never finished is removed when its writer is dropped.

mod writer;

use std::path::{Path, PathBuf};

pub use writer::PartFile;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `7.png` → `7.png.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// What is on disk at a resource's final path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCheck {
    pub exists: bool,
    pub size_bytes: u64,
}

impl FileCheck {
    /// Stat `path`. Missing files, directories and unreadable metadata all count as absent.
    pub fn inspect(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(m) if m.is_file() => Self {
                exists: true,
                size_bytes: m.len(),
            },
            _ => Self {
                exists: false,
                size_bytes: 0,
            },
        }
    }

    /// Valid iff the file exists and is strictly larger than `min_valid_bytes`.
    pub fn is_valid(&self, min_valid_bytes: u64) -> bool {
        self.exists && self.size_bytes > min_valid_bytes
    }
}

/// Shorthand for `FileCheck::inspect(path).is_valid(min_valid_bytes)`.
pub fn is_valid_file(path: &Path, min_valid_bytes: u64) -> bool {
    FileCheck::inspect(path).is_valid(min_valid_bytes)
}
