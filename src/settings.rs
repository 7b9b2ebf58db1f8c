//! Settings surface: load/display/mutate the enable flag and the allowlist.
//! Every mutation persists immediately; callers re-render from the returned
//! view, no reload needed.

use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::host::TabProvider;
use crate::site;
use crate::store::Settings;

/// Snapshot of everything the panel renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub enabled: bool,
    pub auto_capture: bool,
    pub allowed_sites: Vec<String>,
    /// Hostname of the active tab, when it is an HTTP page.
    pub current_hostname: Option<String>,
}

impl PanelView {
    /// Whether the current site is on the allowlist (drives the add/remove
    /// button swap).
    pub fn current_site_allowed(&self) -> bool {
        match &self.current_hostname {
            Some(host) => self.allowed_sites.iter().any(|s| s == host),
            None => false,
        }
    }
}

pub struct SettingsPanel {
    settings: Settings,
    tabs: Arc<dyn TabProvider>,
}

impl SettingsPanel {
    pub fn new(settings: Settings, tabs: Arc<dyn TabProvider>) -> Self {
        Self { settings, tabs }
    }

    /// Load the current state. A missing or non-HTTP active tab leaves
    /// `current_hostname` unset rather than failing the whole panel.
    pub async fn load(&self) -> Result<PanelView> {
        let enabled = self.settings.is_globally_enabled().await?;
        let auto_capture = self.settings.auto_capture().await?;
        let allowed_sites = self.settings.allowed_sites().await?;
        let current_hostname = match self.tabs.active().await {
            Ok(tab) if site::is_http(&tab.url) => site::hostname(&tab.url),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "could not resolve active tab for settings panel");
                None
            }
        };
        Ok(PanelView {
            enabled,
            auto_capture,
            allowed_sites,
            current_hostname,
        })
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<PanelView> {
        self.settings.set_globally_enabled(enabled).await?;
        self.load().await
    }

    pub async fn set_auto_capture(&self, enabled: bool) -> Result<PanelView> {
        self.settings.set_auto_capture(enabled).await?;
        self.load().await
    }

    /// Add the active tab's hostname to the allowlist. No-op when there is
    /// no capturable current site or it is already listed.
    pub async fn add_current_site(&self) -> Result<PanelView> {
        let view = self.load().await?;
        if let Some(host) = &view.current_hostname {
            if !view.allowed_sites.iter().any(|s| s == host) {
                let mut sites = view.allowed_sites.clone();
                sites.push(host.clone());
                self.settings.set_allowed_sites(&sites).await?;
            }
        }
        self.load().await
    }

    /// Remove the active tab's hostname from the allowlist.
    pub async fn remove_current_site(&self) -> Result<PanelView> {
        let view = self.load().await?;
        if let Some(host) = view.current_hostname.clone() {
            self.remove_site(&host).await?;
        }
        self.load().await
    }

    /// Remove an arbitrary hostname from the allowlist (the per-row delete
    /// control).
    pub async fn remove_site(&self, hostname: &str) -> Result<PanelView> {
        let mut sites = self.settings.allowed_sites().await?;
        sites.retain(|s| s != hostname);
        self.settings.set_allowed_sites(&sites).await?;
        self.load().await
    }
}
