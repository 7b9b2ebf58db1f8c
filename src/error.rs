use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Tab is not capturable: {0}")]
    TabNotCapturable(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotError(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Message channel error: {0}")]
    MessageError(String),

    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Navigation failed: {0}")]
    NavigationError(String),

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
