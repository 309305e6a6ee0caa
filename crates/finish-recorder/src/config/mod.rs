#[allow(clippy::module_inception)]
mod config;
mod poll_config;
mod visca_config;

pub(crate) use {config::Config, poll_config::PollConfig, visca_config::ViscaConfig};

use finish_recorder_core::visca::{DEFAULT_VISCA_IP, DEFAULT_VISCA_PORT};

pub(crate) const DEFAULT_FRAME_INTERVAL_MS: u64 = 150;
pub(crate) const MIN_FRAME_INTERVAL_MS: u64 = 100;
pub(crate) const MAX_FRAME_INTERVAL_MS: u64 = 200;
pub(crate) const DEFAULT_STATUS_INTERVAL_MS: u64 = 1000;
pub(crate) const DEFAULT_VISCA_REPLY_TIMEOUT_MS: u64 = 5000;

pub(crate) fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

pub(crate) fn default_status_interval_ms() -> u64 {
    DEFAULT_STATUS_INTERVAL_MS
}

pub(crate) fn default_visca_ip() -> String {
    DEFAULT_VISCA_IP.to_string()
}

pub(crate) fn default_visca_port() -> u16 {
    DEFAULT_VISCA_PORT
}

pub(crate) fn default_visca_reply_timeout_ms() -> u64 {
    DEFAULT_VISCA_REPLY_TIMEOUT_MS
}
