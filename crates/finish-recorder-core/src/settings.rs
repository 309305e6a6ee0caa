//! Persisted user settings and their defaults.
//!
//! Field names match the stored keys: `recording`, `guide`, `reportAllGaps`,
//! `addTimeOverlay`, `waypoint`, `presets`, `focusArea`. Missing keys load as
//! their defaults.

use crate::{
    recorder::{Guide, RecordingProps},
    visca::CameraState,
};

use serde::{Deserialize, Serialize};

/// Region scored for focus on each grabbed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FocusArea {
    /// Whether focus scoring is on.
    pub enabled: bool,
    /// Horizontal center as a fraction of frame width.
    pub x_pct: f32,
    /// Vertical center as a fraction of frame height.
    pub y_pct: f32,
    /// Side length as a fraction of frame height.
    pub size_pct: f32,
}

impl Default for FocusArea {
    fn default() -> Self {
        Self {
            enabled: false,
            x_pct: 0.5,
            y_pct: 0.5,
            size_pct: 0.2,
        }
    }
}

/// A saved camera configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraPreset {
    /// Preset number.
    pub slot: u8,
    /// Saved camera state.
    pub state: CameraState,
}

/// Everything the application persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredSettings {
    /// Recording configuration.
    pub recording: RecordingProps,
    /// Finish-guide offsets.
    pub guide: Guide,
    /// Report every frame gap.
    pub report_all_gaps: bool,
    /// Burn a time overlay into recordings.
    pub add_time_overlay: bool,
    /// Waypoint this recorder serves.
    pub waypoint: String,
    /// Saved camera presets.
    pub presets: Vec<CameraPreset>,
    /// Focus scoring region.
    pub focus_area: FocusArea,
}
