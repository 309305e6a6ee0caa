use crate::config::{default_visca_ip, default_visca_port, default_visca_reply_timeout_ms};

use finish_recorder_core::visca::ViscaTarget;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Camera control configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViscaConfig {
    /// Camera address. Empty disables sends with an error.
    #[serde(default = "default_visca_ip")]
    pub ip: String,
    /// Camera VISCA port. 0 disables camera control.
    #[serde(default = "default_visca_port")]
    pub port: u16,
    /// How long to wait for a camera reply.
    #[serde(default = "default_visca_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

impl ViscaConfig {
    /// Destination for VISCA commands.
    pub fn target(&self) -> ViscaTarget {
        ViscaTarget {
            ip: self.ip.clone(),
            port: self.port,
        }
    }

    /// Reply timeout as a duration.
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl Default for ViscaConfig {
    fn default() -> Self {
        Self {
            ip: default_visca_ip(),
            port: default_visca_port(),
            reply_timeout_ms: default_visca_reply_timeout_ms(),
        }
    }
}
