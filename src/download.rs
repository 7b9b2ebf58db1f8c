//! File-system downloader: writes capture artifacts into one directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Downloader;

/// Saves PNGs into `dir`, creating it on first use. Filenames are taken as
/// produced by the coordinator; anything containing a path separator is
/// rejected.
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        if filename.contains('/') || filename.contains('\\') {
            return Err(Error::DownloadError(format!(
                "filename must not contain path separators: {filename}"
            )));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(())
    }
}
