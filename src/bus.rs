//! Message channel between the page observer and the coordinator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::coordinator::CaptureCoordinator;
use crate::error::Result;
use crate::host::{TabId, TabProvider};
use crate::messages::{CaptureOptions, ScreenshotResponse, SettingsReply};
use crate::site;

/// The page-context view of the two requests the coordinator answers.
/// Implementations may cross a real process boundary; [`LocalBus`] stays
/// in-process.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn check_settings(&self) -> Result<SettingsReply>;
    async fn take_screenshot(&self, options: CaptureOptions) -> Result<ScreenshotResponse>;
}

/// In-process bus bound to one sender tab, the way a content script is bound
/// to the tab it runs in.
pub struct LocalBus {
    coordinator: Arc<CaptureCoordinator>,
    tabs: Arc<dyn TabProvider>,
    sender_tab: TabId,
}

impl LocalBus {
    pub fn new(
        coordinator: Arc<CaptureCoordinator>,
        tabs: Arc<dyn TabProvider>,
        sender_tab: TabId,
    ) -> Self {
        Self {
            coordinator,
            tabs,
            sender_tab,
        }
    }

    async fn sender_hostname(&self) -> Option<String> {
        let tab = self.tabs.get(&self.sender_tab).await.ok()?;
        site::hostname(&tab.url)
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn check_settings(&self) -> Result<SettingsReply> {
        let hostname = self.sender_hostname().await;
        Ok(self.coordinator.check_settings(hostname.as_deref()).await)
    }

    async fn take_screenshot(&self, options: CaptureOptions) -> Result<ScreenshotResponse> {
        Ok(self
            .coordinator
            .take_screenshot(Some(&self.sender_tab), options)
            .await)
    }
}
