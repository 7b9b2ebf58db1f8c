use std::time::Duration;

use crate::classify::DEFAULT_ANCESTOR_LEVELS;

/// Fixed wait before the delayed capture.
pub const DEFAULT_CAPTURE_DELAY: Duration = Duration::from_millis(500);

/// Tuning for the capture pipeline.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Wait between the interaction and the delayed capture (default: 500ms).
    pub capture_delay: Duration,
    /// How many ancestors the click classifier inspects (default: 3).
    pub classifier_levels: usize,
    /// When true, the message path additionally requires the sender's
    /// hostname to be on the allowlist. Off by default.
    pub enforce_allowlist: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_delay: DEFAULT_CAPTURE_DELAY,
            classifier_levels: DEFAULT_ANCESTOR_LEVELS,
            enforce_allowlist: false,
        }
    }
}

pub struct CaptureConfigBuilder {
    config: CaptureConfig,
}

impl CaptureConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CaptureConfig::default(),
        }
    }

    pub fn capture_delay(mut self, delay: Duration) -> Self {
        self.config.capture_delay = delay;
        self
    }

    pub fn classifier_levels(mut self, levels: usize) -> Self {
        self.config.classifier_levels = levels;
        self
    }

    pub fn enforce_allowlist(mut self, enforce: bool) -> Self {
        self.config.enforce_allowlist = enforce;
        self
    }

    pub fn build(self) -> CaptureConfig {
        self.config
    }
}

impl Default for CaptureConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureConfig {
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::new()
    }
}
