//! Host capability traits. The coordinator only ever talks to the browser
//! through these, so its control flow runs unchanged against the CDP adapter
//! or against in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque identifier for a tab. The CDP adapter uses target ids; tests can
/// use any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub String);

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        TabId(s.to_string())
    }
}

impl From<String> for TabId {
    fn from(s: String) -> Self {
        TabId(s)
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the coordinator needs to know about a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
}

/// Tab lookup.
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// Resolve a tab by id. Errors when the tab no longer exists.
    async fn get(&self, id: &TabId) -> Result<TabInfo>;

    /// The currently active tab.
    async fn active(&self) -> Result<TabInfo>;
}

/// Visible-viewport screenshot capture, PNG-encoded.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    async fn capture_visible(&self, tab: &TabId) -> Result<Vec<u8>>;
}

/// Saves a named PNG artifact without prompting.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()>;
}

/// A completed navigation, as surfaced by the host.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub tab_id: TabId,
    pub url: String,
    /// False for iframe navigations, which never trigger captures.
    pub is_main_frame: bool,
}
