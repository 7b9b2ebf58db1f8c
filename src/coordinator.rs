//! The background-context capture coordinator: permission gate, per-site
//! sequence numbers, the immediate/delayed capture pair, and the navigation
//! trigger.

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::host::{Downloader, NavigationEvent, ScreenCapturer, TabId, TabInfo, TabProvider};
use crate::messages::{CaptureOptions, ScreenshotResponse, SettingsReply};
use crate::site;
use crate::store::Settings;

/// What became of one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub site_key: String,
    /// Sequence number consumed by this request. Consumed exactly once, even
    /// when both capture attempts fail.
    pub sequence: u64,
    pub immediate_saved: bool,
    pub delayed_saved: bool,
}

impl CaptureOutcome {
    /// A request succeeds if either capture was saved.
    pub fn success(&self) -> bool {
        self.immediate_saved || self.delayed_saved
    }
}

pub struct CaptureCoordinator {
    settings: Settings,
    tabs: Arc<dyn TabProvider>,
    capturer: Arc<dyn ScreenCapturer>,
    downloader: Arc<dyn Downloader>,
    config: CaptureConfig,
}

impl CaptureCoordinator {
    pub fn new(
        settings: Settings,
        tabs: Arc<dyn TabProvider>,
        capturer: Arc<dyn ScreenCapturer>,
        downloader: Arc<dyn Downloader>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            settings,
            tabs,
            capturer,
            downloader,
            config,
        }
    }

    /// Answer a `checkSettings` request. Storage failures degrade to
    /// "disabled" rather than erroring across the message boundary.
    pub async fn check_settings(&self, sender_hostname: Option<&str>) -> SettingsReply {
        let enabled = match self.settings.is_globally_enabled().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "checkSettings: storage read failed, reporting disabled");
                false
            }
        };
        let is_allowed = if self.config.enforce_allowlist {
            let allowed = match sender_hostname {
                Some(host) => self.settings.is_site_allowed(host).await.unwrap_or(false),
                None => false,
            };
            Some(enabled && allowed)
        } else {
            None
        };
        SettingsReply {
            is_globally_enabled: enabled,
            is_allowed,
        }
    }

    /// Answer a `takeScreenshot` request from `sender_tab`. Never errors;
    /// denials and failures come back in the response.
    pub async fn take_screenshot(
        &self,
        sender_tab: Option<&TabId>,
        options: CaptureOptions,
    ) -> ScreenshotResponse {
        match self.settings.is_globally_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                info!("takeScreenshot skipped: globally disabled");
                return ScreenshotResponse::denied("Globally disabled");
            }
            Err(e) => return ScreenshotResponse::failed(e.to_string()),
        }

        if self.config.enforce_allowlist {
            let hostname = match self.resolve_tab(sender_tab).await {
                Ok(tab) => site::hostname(&tab.url),
                Err(e) => return ScreenshotResponse::failed(e.to_string()),
            };
            let allowed = match hostname {
                Some(ref host) => self.settings.is_site_allowed(host).await.unwrap_or(false),
                None => false,
            };
            if !allowed {
                info!(?hostname, "takeScreenshot skipped: site not allowlisted");
                return ScreenshotResponse::denied("Site not allowed");
            }
        }

        match self.handle_capture_request(sender_tab, options).await {
            Ok(outcome) => ScreenshotResponse::finished(outcome.success()),
            Err(e) => {
                warn!(error = %e, "screenshot request failed");
                ScreenshotResponse::failed(e.to_string())
            }
        }
    }

    /// Run one capture request end to end: resolve the tab, consume a
    /// sequence number, take the optional immediate shot, wait, revalidate,
    /// take the delayed shot. Sub-step failures are logged and skipped; only
    /// an unresolvable or non-HTTP tab at the start is fatal.
    pub async fn handle_capture_request(
        &self,
        tab_id: Option<&TabId>,
        options: CaptureOptions,
    ) -> Result<CaptureOutcome> {
        let tab = self.resolve_tab(tab_id).await?;
        if !site::is_http(&tab.url) {
            warn!(url = %tab.url, "cannot capture non-HTTP tab");
            return Err(Error::TabNotCapturable(tab.url));
        }
        let url = Url::parse(&tab.url)
            .map_err(|e| Error::TabNotCapturable(format!("{}: {e}", tab.url)))?;
        let site_key = site::site_key(&url);
        let hostname = url.host_str().map(str::to_string);

        let sequence = self.settings.next_sequence(&site_key).await?;
        info!(
            site = %site_key,
            sequence,
            immediate = options.capture_immediate,
            "processing capture request for {}", tab.url
        );

        let mut immediate_saved = false;
        if options.capture_immediate {
            let filename = format!("{site_key}_{sequence}_immediate.png");
            match self.capture_and_save(&tab.id, &filename).await {
                Ok(()) => immediate_saved = true,
                Err(e) => warn!(error = %e, %filename, "immediate capture failed"),
            }
        }

        tokio::time::sleep(self.config.capture_delay).await;

        let mut delayed_saved = false;
        match self.revalidate(&tab.id, hostname.as_deref()).await {
            Ok(()) => {
                let filename = format!("{site_key}_{sequence}_delayed.png");
                match self.capture_and_save(&tab.id, &filename).await {
                    Ok(()) => delayed_saved = true,
                    Err(e) => warn!(error = %e, %filename, "delayed capture failed"),
                }
            }
            Err(reason) => {
                warn!(tab = %tab.id, %reason, "skipping delayed capture");
            }
        }

        Ok(CaptureOutcome {
            site_key,
            sequence,
            immediate_saved,
            delayed_saved,
        })
    }

    /// Navigation-completed hook. Main frame only; gated on the global flag
    /// AND the auto-capture flag. Never propagates errors.
    pub async fn on_navigation_completed(&self, event: &NavigationEvent) {
        if !event.is_main_frame {
            return;
        }
        info!(url = %event.url, "page navigation completed");

        let enabled = self.settings.is_globally_enabled().await.unwrap_or(false);
        let auto = self.settings.auto_capture().await.unwrap_or(false);
        if !(enabled && auto) {
            info!(enabled, auto_capture = auto, "navigation auto-capture skipped");
            return;
        }

        match self
            .handle_capture_request(Some(&event.tab_id), CaptureOptions::default())
            .await
        {
            Ok(outcome) => {
                info!(
                    site = %outcome.site_key,
                    sequence = outcome.sequence,
                    success = outcome.success(),
                    "navigation auto-capture finished"
                );
            }
            Err(e) => warn!(error = %e, "navigation auto-capture failed"),
        }
    }

    async fn resolve_tab(&self, tab_id: Option<&TabId>) -> Result<TabInfo> {
        match tab_id {
            Some(id) => self.tabs.get(id).await,
            None => self.tabs.active().await,
        }
    }

    async fn capture_and_save(&self, tab: &TabId, filename: &str) -> Result<()> {
        let png = self.capturer.capture_visible(tab).await?;
        self.downloader.save(filename, &png).await?;
        info!(%filename, bytes = png.len(), "screenshot saved");
        Ok(())
    }

    /// Check that the tab is still worth capturing after the delay. Returns
    /// a human-readable skip reason on the error side.
    async fn revalidate(
        &self,
        tab: &TabId,
        original_hostname: Option<&str>,
    ) -> std::result::Result<(), String> {
        let current = match self.tabs.get(tab).await {
            Ok(t) => t,
            Err(e) => return Err(format!("tab became invalid during delay: {e}")),
        };
        if !site::is_http(&current.url) {
            return Err(format!("tab is no longer on an HTTP page: {}", current.url));
        }
        let current_hostname = site::hostname(&current.url);
        if current_hostname.as_deref() != original_hostname {
            return Err(format!(
                "tab hostname changed during delay (from {:?} to {:?})",
                original_hostname, current_hostname
            ));
        }
        Ok(())
    }
}
