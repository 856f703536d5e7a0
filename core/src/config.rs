//! Tunables of the bridge.

use core::time::Duration;

/// Runtime configuration for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BridgeConfig {
    /// Treat a panicking renderer as a render failure instead of unwinding
    /// through the caller.
    pub catch_render_panics: bool,
    /// Log a warning for renders that take longer than this many milliseconds.
    ///
    /// Renders are never cancelled; a hung renderer is the renderer's problem.
    pub slow_render_threshold_ms: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            catch_render_panics: true,
            slow_render_threshold_ms: Some(250),
        }
    }
}

impl BridgeConfig {
    /// The slow render threshold as a [`Duration`].
    #[must_use]
    pub fn slow_render_threshold(&self) -> Option<Duration> {
        self.slow_render_threshold_ms.map(Duration::from_millis)
    }
}
