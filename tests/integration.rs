use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clickshot::{
    CaptureConfig, CaptureCoordinator, CaptureOptions, Downloader, ElementInfo, Error, LocalBus,
    MemoryStore, NavigationEvent, PageObserver, Result, ScreenCapturer, Settings, SettingsPanel,
    TabId, TabInfo, TabProvider, DEFAULT_ANCESTOR_LEVELS,
};

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

/// Tab registry fake: id -> url, plus an "active" designation.
#[derive(Default)]
struct FakeTabs {
    urls: Mutex<HashMap<TabId, String>>,
    active: Mutex<Option<TabId>>,
}

impl FakeTabs {
    fn with_tab(id: &str, url: &str) -> Arc<Self> {
        let tabs = Arc::new(Self::default());
        tabs.set_url(id, url);
        *tabs.active.lock().unwrap() = Some(TabId::from(id));
        tabs
    }

    fn set_url(&self, id: &str, url: &str) {
        self.urls
            .lock()
            .unwrap()
            .insert(TabId::from(id), url.to_string());
    }

    fn close(&self, id: &str) {
        self.urls.lock().unwrap().remove(&TabId::from(id));
    }
}

#[async_trait]
impl TabProvider for FakeTabs {
    async fn get(&self, id: &TabId) -> Result<TabInfo> {
        self.urls
            .lock()
            .unwrap()
            .get(id)
            .map(|url| TabInfo {
                id: id.clone(),
                url: url.clone(),
            })
            .ok_or_else(|| Error::TabNotFound(id.to_string()))
    }

    async fn active(&self) -> Result<TabInfo> {
        let id = self
            .active
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::TabNotFound("no active tab".into()))?;
        self.get(&id).await
    }
}

/// Capturer fake returning PNG-magic bytes, with a failure switch.
#[derive(Default)]
struct FakeCapturer {
    fail: AtomicBool,
}

#[async_trait]
impl ScreenCapturer for FakeCapturer {
    async fn capture_visible(&self, tab: &TabId) -> Result<Vec<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::ScreenshotError(format!("tab {tab} not capturable")));
        }
        Ok(PNG_MAGIC.to_vec())
    }
}

/// Downloader fake recording filenames in save order.
#[derive(Default)]
struct RecordingDownloader {
    saved: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingDownloader {
    fn filenames(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::DownloadError("disk full".into()));
        }
        assert_eq!(&bytes[0..4], PNG_MAGIC);
        self.saved.lock().unwrap().push(filename.to_string());
        Ok(())
    }
}

struct Harness {
    coordinator: Arc<CaptureCoordinator>,
    tabs: Arc<FakeTabs>,
    capturer: Arc<FakeCapturer>,
    downloader: Arc<RecordingDownloader>,
    settings: Settings,
}

fn harness(url: &str, config: CaptureConfig) -> Harness {
    let tabs = FakeTabs::with_tab("tab-1", url);
    let capturer = Arc::new(FakeCapturer::default());
    let downloader = Arc::new(RecordingDownloader::default());
    let settings = Settings::new(Arc::new(MemoryStore::new()));
    let coordinator = Arc::new(CaptureCoordinator::new(
        settings.clone(),
        tabs.clone(),
        capturer.clone(),
        downloader.clone(),
        config,
    ));
    Harness {
        coordinator,
        tabs,
        capturer,
        downloader,
        settings,
    }
}

fn fast_config() -> CaptureConfig {
    CaptureConfig::builder()
        .capture_delay(Duration::from_millis(10))
        .build()
}

#[tokio::test]
async fn sequence_numbers_run_one_to_n() {
    let h = harness("https://www.example.com/page", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();

    for expected in 1..=3u64 {
        let outcome = h
            .coordinator
            .handle_capture_request(None, CaptureOptions::default())
            .await
            .expect("capture request failed");
        assert_eq!(outcome.sequence, expected);
        assert_eq!(outcome.site_key, "example");
        assert!(outcome.success());
    }

    assert_eq!(
        h.downloader.filenames(),
        vec![
            "example_1_delayed.png",
            "example_2_delayed.png",
            "example_3_delayed.png",
        ]
    );
}

#[tokio::test]
async fn denied_when_globally_disabled_regardless_of_allowlist() {
    let config = CaptureConfig::builder()
        .capture_delay(Duration::from_millis(10))
        .enforce_allowlist(true)
        .build();
    let h = harness("https://example.com/", config);
    h.settings
        .set_allowed_sites(&["example.com".to_string()])
        .await
        .unwrap();

    let response = h
        .coordinator
        .take_screenshot(Some(&TabId::from("tab-1")), CaptureOptions::immediate())
        .await;
    assert!(!response.success);
    assert_eq!(response.reason.as_deref(), Some("Globally disabled"));
    assert!(h.downloader.filenames().is_empty());
}

#[tokio::test]
async fn allowlist_gates_the_message_path() {
    let config = CaptureConfig::builder()
        .capture_delay(Duration::from_millis(10))
        .enforce_allowlist(true)
        .build();
    let h = harness("https://example.com/", config);
    h.settings.set_globally_enabled(true).await.unwrap();

    let response = h
        .coordinator
        .take_screenshot(Some(&TabId::from("tab-1")), CaptureOptions::default())
        .await;
    assert!(!response.success);
    assert_eq!(response.reason.as_deref(), Some("Site not allowed"));

    h.settings
        .set_allowed_sites(&["example.com".to_string()])
        .await
        .unwrap();
    let response = h
        .coordinator
        .take_screenshot(Some(&TabId::from("tab-1")), CaptureOptions::default())
        .await;
    assert!(response.success);
    assert_eq!(h.downloader.filenames(), vec!["example_1_delayed.png"]);
}

#[tokio::test]
async fn hostname_change_skips_delayed_but_keeps_immediate() {
    let config = CaptureConfig::builder()
        .capture_delay(Duration::from_millis(200))
        .build();
    let h = harness("https://example.com/start", config);
    h.settings.set_globally_enabled(true).await.unwrap();

    // Simulate the click navigating away mid-delay.
    let tabs = h.tabs.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        tabs.set_url("tab-1", "https://other.com/landed");
    });

    let outcome = h
        .coordinator
        .handle_capture_request(Some(&TabId::from("tab-1")), CaptureOptions::immediate())
        .await
        .expect("capture request failed");

    assert!(outcome.immediate_saved);
    assert!(!outcome.delayed_saved);
    assert!(outcome.success());
    assert_eq!(h.downloader.filenames(), vec!["example_1_immediate.png"]);
}

#[tokio::test]
async fn same_site_navigation_keeps_delayed_capture() {
    let h = harness("https://example.com/start", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    h.tabs.set_url("tab-1", "https://example.com/other-page");

    let outcome = h
        .coordinator
        .handle_capture_request(Some(&TabId::from("tab-1")), CaptureOptions::default())
        .await
        .unwrap();
    assert!(outcome.delayed_saved);
}

#[tokio::test]
async fn closed_tab_skips_delayed_capture() {
    let config = CaptureConfig::builder()
        .capture_delay(Duration::from_millis(200))
        .build();
    let h = harness("https://example.com/", config);
    h.settings.set_globally_enabled(true).await.unwrap();

    let tabs = h.tabs.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        tabs.close("tab-1");
    });

    let outcome = h
        .coordinator
        .handle_capture_request(Some(&TabId::from("tab-1")), CaptureOptions::immediate())
        .await
        .unwrap();
    assert!(outcome.immediate_saved);
    assert!(!outcome.delayed_saved);
}

#[tokio::test]
async fn failed_captures_still_consume_a_sequence_number() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    h.capturer.fail.store(true, Ordering::SeqCst);

    let outcome = h
        .coordinator
        .handle_capture_request(None, CaptureOptions::immediate())
        .await
        .unwrap();
    assert!(!outcome.success());
    assert_eq!(outcome.sequence, 1);
    assert!(h.downloader.filenames().is_empty());

    // The next request observes the consumed number.
    h.capturer.fail.store(false, Ordering::SeqCst);
    let outcome = h
        .coordinator
        .handle_capture_request(None, CaptureOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.sequence, 2);
}

#[tokio::test]
async fn download_failure_degrades_like_capture_failure() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    h.downloader.fail.store(true, Ordering::SeqCst);

    let response = h
        .coordinator
        .take_screenshot(None, CaptureOptions::default())
        .await;
    assert!(!response.success);
    assert!(response.error.is_none(), "degraded, not errored: {response:?}");
}

#[tokio::test]
async fn non_http_tab_is_fatal_to_the_request() {
    let h = harness("chrome://settings", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();

    let err = h
        .coordinator
        .handle_capture_request(None, CaptureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TabNotCapturable(_)));

    let response = h
        .coordinator
        .take_screenshot(None, CaptureOptions::default())
        .await;
    assert!(!response.success);
    assert!(response.error.is_some());
}

#[tokio::test]
async fn navigation_capture_requires_both_flags() {
    let h = harness("https://example.com/", fast_config());
    let event = NavigationEvent {
        tab_id: TabId::from("tab-1"),
        url: "https://example.com/".into(),
        is_main_frame: true,
    };

    // Disabled: nothing happens.
    h.coordinator.on_navigation_completed(&event).await;
    assert!(h.downloader.filenames().is_empty());

    // Enabled but auto-capture off: still nothing.
    h.settings.set_globally_enabled(true).await.unwrap();
    h.settings.set_auto_capture(false).await.unwrap();
    h.coordinator.on_navigation_completed(&event).await;
    assert!(h.downloader.filenames().is_empty());

    // Both on: one delayed capture, no immediate.
    h.settings.set_auto_capture(true).await.unwrap();
    h.coordinator.on_navigation_completed(&event).await;
    assert_eq!(h.downloader.filenames(), vec!["example_1_delayed.png"]);
}

#[tokio::test]
async fn iframe_navigation_is_ignored() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();

    h.coordinator
        .on_navigation_completed(&NavigationEvent {
            tab_id: TabId::from("tab-1"),
            url: "https://ads.example.com/frame".into(),
            is_main_frame: false,
        })
        .await;
    assert!(h.downloader.filenames().is_empty());
}

#[tokio::test]
async fn allowlist_round_trips_from_panel_to_check_settings() {
    let config = CaptureConfig::builder()
        .capture_delay(Duration::from_millis(10))
        .enforce_allowlist(true)
        .build();
    let h = harness("https://www.example.com/page", config);
    h.settings.set_globally_enabled(true).await.unwrap();

    let panel = SettingsPanel::new(h.settings.clone(), h.tabs.clone());
    let view = panel.add_current_site().await.unwrap();
    assert_eq!(view.allowed_sites, vec!["www.example.com"]);
    assert!(view.current_site_allowed());

    let reply = h.coordinator.check_settings(Some("www.example.com")).await;
    assert!(reply.is_globally_enabled);
    assert_eq!(reply.is_allowed, Some(true));

    let view = panel.remove_current_site().await.unwrap();
    assert!(view.allowed_sites.is_empty());
    let reply = h.coordinator.check_settings(Some("www.example.com")).await;
    assert_eq!(reply.is_allowed, Some(false));
}

#[tokio::test]
async fn panel_toggle_is_visible_without_reload() {
    let h = harness("https://example.com/", fast_config());
    let panel = SettingsPanel::new(h.settings.clone(), h.tabs.clone());

    let view = panel.set_enabled(true).await.unwrap();
    assert!(view.enabled);
    assert!(h.coordinator.check_settings(None).await.is_globally_enabled);

    let view = panel.set_enabled(false).await.unwrap();
    assert!(!view.enabled);
    assert!(!h.coordinator.check_settings(None).await.is_globally_enabled);
}

#[tokio::test]
async fn panel_on_non_http_tab_disables_site_controls() {
    let h = harness("about:blank", fast_config());
    let panel = SettingsPanel::new(h.settings.clone(), h.tabs.clone());
    let view = panel.load().await.unwrap();
    assert_eq!(view.current_hostname, None);
    assert!(!view.current_site_allowed());

    // Adding with no current site is a no-op.
    let view = panel.add_current_site().await.unwrap();
    assert!(view.allowed_sites.is_empty());
}

fn observer_for(h: &Harness) -> PageObserver {
    let bus = Arc::new(LocalBus::new(
        h.coordinator.clone(),
        h.tabs.clone(),
        TabId::from("tab-1"),
    ));
    PageObserver::new(bus, DEFAULT_ANCESTOR_LEVELS)
}

#[tokio::test]
async fn link_click_through_observer_captures_immediately_and_delayed() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    let observer = observer_for(&h);

    // <svg> icon inside an <a>: interactive at depth 1, and a link click.
    let ancestry = [ElementInfo::new("svg"), ElementInfo::new("a")];
    let response = observer.on_click(&ancestry).await.expect("request sent");
    assert!(response.success);
    assert_eq!(
        h.downloader.filenames(),
        vec!["example_1_immediate.png", "example_1_delayed.png"]
    );
}

#[tokio::test]
async fn button_click_through_observer_is_delayed_only() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    let observer = observer_for(&h);

    let response = observer
        .on_click(&[ElementInfo::new("button")])
        .await
        .expect("request sent");
    assert!(response.success);
    assert_eq!(h.downloader.filenames(), vec!["example_1_delayed.png"]);
}

#[tokio::test]
async fn non_interactive_click_sends_nothing() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    let observer = observer_for(&h);

    let ancestry = [ElementInfo::new("div"), ElementInfo::new("div")];
    assert!(observer.on_click(&ancestry).await.is_none());
    assert!(h.downloader.filenames().is_empty());
}

#[tokio::test]
async fn observer_respects_disabled_flag() {
    let h = harness("https://example.com/", fast_config());
    let observer = observer_for(&h);

    assert!(observer.on_click(&[ElementInfo::new("button")]).await.is_none());
    assert!(h.downloader.filenames().is_empty());
}

#[tokio::test]
async fn enter_key_on_textarea_captures_without_immediate() {
    let h = harness("https://example.com/", fast_config());
    h.settings.set_globally_enabled(true).await.unwrap();
    let observer = observer_for(&h);

    let response = observer
        .on_keydown("Enter", &ElementInfo::new("textarea"))
        .await
        .expect("request sent");
    assert!(response.success);
    assert_eq!(h.downloader.filenames(), vec!["example_1_delayed.png"]);

    assert!(observer
        .on_keydown("Enter", &ElementInfo::new("p"))
        .await
        .is_none());
    assert!(observer
        .on_keydown("a", &ElementInfo::new("textarea"))
        .await
        .is_none());
}
