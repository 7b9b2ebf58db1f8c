//! The page-context observer: turns raw click/keydown events into screenshot
//! requests over the message bus.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::bus::MessageBus;
use crate::classify::{self, ElementInfo};
use crate::messages::{CaptureOptions, ScreenshotResponse};

pub struct PageObserver {
    bus: Arc<dyn MessageBus>,
    levels: usize,
}

impl PageObserver {
    pub fn new(bus: Arc<dyn MessageBus>, levels: usize) -> Self {
        Self { bus, levels }
    }

    /// Handle a click. `ancestry` is the event target followed by its
    /// ancestors toward the root. Returns the coordinator's response when a
    /// request was actually sent.
    pub async fn on_click(&self, ancestry: &[ElementInfo]) -> Option<ScreenshotResponse> {
        let verdict = classify_log(ancestry, self.levels);
        if !verdict.interactive {
            return None;
        }

        // A click anywhere inside an <a> is about to navigate; ask for the
        // pre-navigation shot too. Mirrors closest('a'), so the whole
        // ancestry is searched, not just the classifier's depth budget.
        let is_link_click = ancestry
            .iter()
            .any(|el| el.tag.eq_ignore_ascii_case("a"));
        self.request_screenshot(CaptureOptions {
            capture_immediate: is_link_click,
        })
        .await
    }

    /// Handle a keydown. Only Enter on an interactive target triggers a
    /// request, and never an immediate capture.
    pub async fn on_keydown(&self, key: &str, target: &ElementInfo) -> Option<ScreenshotResponse> {
        if key != "Enter" {
            return None;
        }
        if !classify::is_enter_target(target) {
            debug!(tag = %target.tag, "Enter on non-interactive element, ignoring");
            return None;
        }
        info!(tag = %target.tag, "Enter key on interactive element");
        self.request_screenshot(CaptureOptions::default()).await
    }

    /// The two-step round trip: confirm the extension is enabled, then
    /// request the capture. Bus failures are logged and swallowed; nothing
    /// here may take the page down.
    async fn request_screenshot(&self, options: CaptureOptions) -> Option<ScreenshotResponse> {
        let settings = match self.bus.check_settings().await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "checkSettings request failed");
                return None;
            }
        };
        let permitted = settings.is_allowed.unwrap_or(settings.is_globally_enabled);
        if !permitted {
            info!("capture disabled, screenshot request skipped");
            return None;
        }

        match self.bus.take_screenshot(options).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!(error = %e, "takeScreenshot request failed");
                None
            }
        }
    }
}

fn classify_log(ancestry: &[ElementInfo], levels: usize) -> classify::Classification {
    let verdict = classify::classify_click(ancestry, levels);
    match (verdict.interactive, verdict.reason) {
        (true, Some(reason)) => info!(%reason, "click on interactive element"),
        _ => debug!("click on non-interactive element, ignoring"),
    }
    verdict
}
