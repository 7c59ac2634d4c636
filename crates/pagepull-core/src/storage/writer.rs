//! Sequential writer for a single `.part` download file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// Body sink for one resource. Bytes go to `<final>.part`; [`PartFile::finish`]
/// syncs and renames it into place. Dropping an unfinished `PartFile` removes
/// the `.part` file (best effort).
pub struct PartFile {
    inner: Option<BufWriter<File>>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (truncating) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            inner: Some(BufWriter::new(file)),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, fsync and atomically rename the temp file to the final path.
    /// Returns the number of bytes in the final file.
    pub fn finish(mut self) -> io::Result<u64> {
        let buf = self
            .inner
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "part file already closed"))?;
        let result = buf
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .and_then(|()| std::fs::rename(&self.temp_path, &self.final_path));
        if result.is_err() {
            discard(&self.temp_path);
        }
        result.map(|()| self.written)
    }

    /// Remove the temp file now instead of at drop.
    pub fn discard(mut self) {
        self.inner.take();
        discard(&self.temp_path);
    }
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "part file already closed"))?;
        let n = inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            discard(&self.temp_path);
        }
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "could not remove partial file: {}", e);
        }
    }
}
