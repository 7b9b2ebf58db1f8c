//! CDP-backed host adapter: real tabs, real captures, driven through
//! chromiumoxide. Everything else in the crate only sees the capability
//! traits, so this module is the only one that touches the browser.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventFrameNavigated,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page as CrPage, ScreenshotParams};
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::host::{NavigationEvent, ScreenCapturer, TabId, TabInfo, TabProvider};

/// Chrome flags that cut startup and background noise during capture runs.
const PERF_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "metrics-recording-only",
    "mute-audio",
    "no-default-browser-check",
];

/// Launch options for the capture browser.
pub struct HostConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chrome_path: None,
        }
    }
}

/// A launched browser plus its tab registry. Implements [`TabProvider`] and
/// [`ScreenCapturer`]; "active tab" means the most recently opened one.
pub struct ChromeHost {
    browser: CrBrowser,
    tabs: Mutex<Vec<(TabId, CrPage)>>,
    _handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeHost {
    pub async fn launch(config: HostConfig) -> Result<Self> {
        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        for arg in PERF_ARGS {
            builder = builder.arg(*arg);
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder.viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        });

        let cr_config = builder
            .build()
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        Ok(Self {
            browser,
            tabs: Mutex::new(Vec::new()),
            _handler_task: handler_task,
        })
    }

    /// Open a new tab navigated to `url` and register it.
    pub async fn open(&self, url: &str) -> Result<TabId> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        let id = TabId(page.target_id().as_ref().to_string());
        self.tabs.lock().await.push((id.clone(), page));
        Ok(id)
    }

    /// Navigate an existing tab.
    pub async fn navigate(&self, tab: &TabId, url: &str) -> Result<()> {
        let page = self.page(tab).await?;
        page.goto(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        Ok(())
    }

    /// Stream of completed top-level navigations for one tab, already
    /// filtered the way the coordinator expects (`is_main_frame` reflects a
    /// parent-less frame).
    pub async fn navigation_events(
        &self,
        tab: &TabId,
    ) -> Result<impl Stream<Item = NavigationEvent> + Send + Unpin> {
        let page = self.page(tab).await?;
        let listener = page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(Error::CdpError)?;
        let tab_id = tab.clone();
        Ok(listener.map(move |event| NavigationEvent {
            tab_id: tab_id.clone(),
            url: event.frame.url.clone(),
            is_main_frame: event.frame.parent_id.is_none(),
        }))
    }

    async fn page(&self, tab: &TabId) -> Result<CrPage> {
        self.tabs
            .lock()
            .await
            .iter()
            .find(|(id, _)| id == tab)
            .map(|(_, page)| page.clone())
            .ok_or_else(|| Error::TabNotFound(tab.to_string()))
    }

    async fn tab_info(&self, id: &TabId, page: &CrPage) -> Result<TabInfo> {
        let url = page
            .url()
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?
            .ok_or_else(|| Error::NavigationError("No URL found".into()))?;
        Ok(TabInfo {
            id: id.clone(),
            url,
        })
    }
}

#[async_trait]
impl TabProvider for ChromeHost {
    async fn get(&self, id: &TabId) -> Result<TabInfo> {
        let page = self.page(id).await?;
        self.tab_info(id, &page).await
    }

    async fn active(&self) -> Result<TabInfo> {
        let (id, page) = self
            .tabs
            .lock()
            .await
            .last()
            .cloned()
            .ok_or_else(|| Error::TabNotFound("no open tabs".into()))?;
        self.tab_info(&id, &page).await
    }
}

#[async_trait]
impl ScreenCapturer for ChromeHost {
    async fn capture_visible(&self, tab: &TabId) -> Result<Vec<u8>> {
        let page = self.page(tab).await?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        page.screenshot(params)
            .await
            .map_err(|e| Error::ScreenshotError(e.to_string()))
    }
}
