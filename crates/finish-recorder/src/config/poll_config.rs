use crate::config::{
    MAX_FRAME_INTERVAL_MS, MIN_FRAME_INTERVAL_MS, default_frame_interval_ms,
    default_status_interval_ms,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Recorder polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Milliseconds between frame grabs. Clamped to 100..=200.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Milliseconds between recording status queries.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl PollConfig {
    /// Frame grab period.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(
            self.frame_interval_ms
                .clamp(MIN_FRAME_INTERVAL_MS, MAX_FRAME_INTERVAL_MS),
        )
    }

    /// Status query period. Never zero.
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms.max(1))
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}
