//! Wire types for the page-observer ↔ coordinator message channel.
//!
//! Field and tag names follow the persisted/runtime protocol
//! (`checkSettings`, `takeScreenshot`, `isGloballyEnabled`, ...), so a
//! serialized request is byte-compatible with what a page script would send.

use serde::{Deserialize, Serialize};

/// Options attached to a screenshot request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    /// Capture once before the fixed delay as well. Used for link clicks,
    /// where navigation may replace the page imminently.
    #[serde(default)]
    pub capture_immediate: bool,
}

impl CaptureOptions {
    pub fn immediate() -> Self {
        Self {
            capture_immediate: true,
        }
    }
}

/// A request from the page context to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "checkSettings")]
    CheckSettings,
    #[serde(rename = "takeScreenshot")]
    TakeScreenshot {
        #[serde(default)]
        options: CaptureOptions,
    },
}

/// Reply to [`Request::CheckSettings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsReply {
    pub is_globally_enabled: bool,
    /// Present only when allowlist enforcement is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_allowed: Option<bool>,
}

/// Reply to [`Request::TakeScreenshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotResponse {
    pub success: bool,
    /// Why the request was denied, when it was denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Error text when the request was attempted but failed outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScreenshotResponse {
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: None,
            error: Some(error.into()),
        }
    }

    pub fn finished(success: bool) -> Self {
        Self {
            success,
            reason: None,
            error: None,
        }
    }
}
