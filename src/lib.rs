pub mod bus;
pub mod chrome;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod download;
pub mod error;
pub mod host;
pub mod logging;
pub mod messages;
pub mod observer;
pub mod settings;
pub mod site;
pub mod store;

pub use bus::{LocalBus, MessageBus};
pub use chrome::{ChromeHost, HostConfig};
pub use classify::{ElementInfo, DEFAULT_ANCESTOR_LEVELS};
pub use config::CaptureConfig;
pub use coordinator::{CaptureCoordinator, CaptureOutcome};
pub use download::FileDownloader;
pub use error::{Error, Result};
pub use host::{Downloader, NavigationEvent, ScreenCapturer, TabId, TabInfo, TabProvider};
pub use messages::{CaptureOptions, ScreenshotResponse, SettingsReply};
pub use observer::PageObserver;
pub use settings::{PanelView, SettingsPanel};
pub use store::{JsonFileStore, KvStore, MemoryStore, Settings};
