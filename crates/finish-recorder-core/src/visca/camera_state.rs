//! Bulk query and apply of the camera's configuration.
//!
//! Exposure-dependent fields only take effect after the exposure mode, and
//! focus calibration depends on a stable zoom position, so `apply` issues
//! commands in a fixed order and waits for zoom to settle before focus.

use crate::{
    CoreResult,
    visca::{ExposureMode, ViscaCommand, ViscaTransport, extract_visca_value},
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

/// Gap before each discrete set command, for device command-rate limits.
pub const COMMAND_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Interval between zoom position polls while settling.
pub const ZOOM_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Zoom counts as settled within this many units of the target.
pub const ZOOM_TOLERANCE: u32 = 100;

/// Give up waiting for zoom after this long and carry on.
pub const ZOOM_SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

// Autofocus inquiry replies 2 for on, 3 for off.
const AUTO_FOCUS_ON: u32 = 2;
const DEFAULT_POSITION: u32 = 8;

/// Mirror of the camera's configuration. Never authoritative; re-query to reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraState {
    /// Autofocus enabled.
    pub auto_focus: bool,
    /// Exposure mode.
    pub exposure_mode: ExposureMode,
    /// Iris position.
    pub iris: u8,
    /// Shutter position.
    pub shutter: u8,
    /// Gain position.
    pub gain: u8,
    /// Brightness position.
    pub brightness: u8,
    /// Focus position.
    pub focus: u16,
    /// Zoom position.
    pub zoom: u16,
}

/// Subset of [`CameraState`] to apply. `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStatePatch {
    /// Autofocus enabled.
    pub auto_focus: Option<bool>,
    /// Exposure mode.
    pub exposure_mode: Option<ExposureMode>,
    /// Iris position.
    pub iris: Option<u8>,
    /// Shutter position.
    pub shutter: Option<u8>,
    /// Gain position.
    pub gain: Option<u8>,
    /// Brightness position.
    pub brightness: Option<u8>,
    /// Focus position.
    pub focus: Option<u16>,
    /// Zoom position.
    pub zoom: Option<u16>,
}

impl From<CameraState> for CameraStatePatch {
    fn from(state: CameraState) -> Self {
        Self {
            auto_focus: Some(state.auto_focus),
            exposure_mode: Some(state.exposure_mode),
            iris: Some(state.iris),
            shutter: Some(state.shutter),
            gain: Some(state.gain),
            brightness: Some(state.brightness),
            focus: Some(state.focus),
            zoom: Some(state.zoom),
        }
    }
}

/// How the zoom step of [`apply_camera_state`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomSettle {
    /// The patch did not include zoom.
    NotRequested,
    /// Zoom reached the target within tolerance.
    Settled {
        /// Last polled position.
        position: u16,
    },
    /// Zoom did not settle in time; the sequence continued anyway.
    TimedOut {
        /// Last polled position.
        current: u16,
        /// Requested position.
        target: u16,
    },
}

/// Read the full camera state with one inquiry per field.
///
/// Absent or malformed replies, and failed inquiries, decode to defaults.
#[instrument(skip(transport))]
pub async fn query_camera_state<T: ViscaTransport>(transport: &T) -> CameraState {
    let auto_focus =
        inquire(transport, ViscaCommand::AutoFocusValue, AUTO_FOCUS_ON).await == AUTO_FOCUS_ON;
    let exposure_code = inquire(transport, ViscaCommand::ExposureModeValue, 0).await;
    let exposure_mode = u8::try_from(exposure_code)
        .ok()
        .and_then(ExposureMode::from_code)
        .unwrap_or_default();

    let state = CameraState {
        auto_focus,
        exposure_mode,
        iris: inquire_byte(transport, ViscaCommand::IrisValue).await,
        shutter: inquire_byte(transport, ViscaCommand::ShutterValue).await,
        gain: inquire_byte(transport, ViscaCommand::GainValue).await,
        brightness: inquire_byte(transport, ViscaCommand::BrightnessValue).await,
        focus: inquire_word(transport, ViscaCommand::FocusValue).await,
        zoom: inquire_word(transport, ViscaCommand::ZoomValue).await,
    };

    debug!(state = ?state, "Camera state queried");
    state
}

/// Apply `patch` to the camera in dependency order.
///
/// Exposure mode, iris, shutter, gain, brightness and autofocus are each
/// preceded by [`COMMAND_SETTLE_DELAY`]. Zoom is then set and polled until it
/// settles or [`ZOOM_SETTLE_TIMEOUT`] passes, and focus goes last. A zoom
/// timeout is logged and reported in the result, never returned as an error.
///
/// # Errors
///
/// Returns the first failed set command.
#[instrument(skip(transport))]
pub async fn apply_camera_state<T: ViscaTransport>(
    transport: &T,
    patch: &CameraStatePatch,
) -> CoreResult<ZoomSettle> {
    let settled_sets = [
        patch.exposure_mode.map(ViscaCommand::ExposureMode),
        patch.iris.map(ViscaCommand::SetIris),
        patch.shutter.map(ViscaCommand::SetShutter),
        patch.gain.map(ViscaCommand::SetGain),
        patch.brightness.map(ViscaCommand::SetBrightness),
        patch.auto_focus.map(ViscaCommand::AutoFocus),
    ];

    for cmd in settled_sets.into_iter().flatten() {
        sleep(COMMAND_SETTLE_DELAY).await;
        transport.send(cmd).await?;
    }

    let zoom = match patch.zoom {
        Some(target) => settle_zoom(transport, target).await?,
        None => ZoomSettle::NotRequested,
    };

    if let Some(focus) = patch.focus {
        transport.send(ViscaCommand::SetFocus(focus)).await?;
    }

    info!(zoom = ?zoom, "Camera state applied");
    Ok(zoom)
}

async fn settle_zoom<T: ViscaTransport>(transport: &T, target: u16) -> CoreResult<ZoomSettle> {
    transport.send(ViscaCommand::SetZoom(target)).await?;

    let started = Instant::now();
    loop {
        sleep(ZOOM_POLL_INTERVAL).await;

        let current = inquire_word(transport, ViscaCommand::ZoomValue).await;

        if u32::from(current).abs_diff(u32::from(target)) <= ZOOM_TOLERANCE {
            return Ok(ZoomSettle::Settled { position: current });
        }

        if started.elapsed() >= ZOOM_SETTLE_TIMEOUT {
            warn!(current, target, "Zoom operation timed out");
            return Ok(ZoomSettle::TimedOut { current, target });
        }
    }
}

async fn inquire<T: ViscaTransport>(transport: &T, cmd: ViscaCommand, default: u32) -> u32 {
    let Some(width) = cmd.reply_width() else {
        return default;
    };

    match transport.send(cmd).await {
        Ok(reply) => extract_visca_value(reply.bytes(), width, default),
        Err(e) => {
            warn!(cmd = %cmd, error = %e, "VISCA inquiry failed, using default");
            default
        }
    }
}

async fn inquire_byte<T: ViscaTransport>(transport: &T, cmd: ViscaCommand) -> u8 {
    let value = inquire(transport, cmd, DEFAULT_POSITION).await;
    u8::try_from(value).unwrap_or(u8::MAX)
}

async fn inquire_word<T: ViscaTransport>(transport: &T, cmd: ViscaCommand) -> u16 {
    let value = inquire(transport, cmd, DEFAULT_POSITION).await;
    u16::try_from(value).unwrap_or(u16::MAX)
}
