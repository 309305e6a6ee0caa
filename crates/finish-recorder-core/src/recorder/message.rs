use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value patch carried by the `settings` operation.
pub type SettingsPatch = Map<String, Value>;

/// Normalized (0..1) rectangle within the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// The whole frame.
    pub const FULL_FRAME: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL_FRAME
    }
}

/// Finish-guide offsets in source pixels.
///
/// `pt1` is the offset at the top of the frame and `pt2` at the bottom, so
/// the guide line may lean to follow the finish line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    /// Offset at the top edge.
    pub pt1: f32,
    /// Offset at the bottom edge.
    pub pt2: f32,
}

/// User-facing recording configuration.
///
/// Missing fields deserialize to the documented defaults, which is how stored
/// props are merged over the default record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingProps {
    /// Folder the recorder writes video slices into.
    pub recording_folder: String,
    /// Filename prefix for every slice.
    pub recording_prefix: String,
    /// Slice duration in seconds.
    pub recording_duration: u32,
    /// Camera selector. Empty means the first camera discovered.
    pub network_camera: String,
    /// Draw the finish guide over the preview.
    pub show_finish_guide: bool,
    /// Region of the source frame to record.
    pub crop_area: Rect,
}

/// Default slice duration in seconds.
pub const DEFAULT_RECORDING_DURATION_SECS: u32 = 120;

impl Default for RecordingProps {
    fn default() -> Self {
        Self {
            recording_folder: "./".to_string(),
            recording_prefix: "CT_".to_string(),
            recording_duration: DEFAULT_RECORDING_DURATION_SECS,
            network_camera: String::new(),
            show_finish_guide: true,
            crop_area: Rect::FULL_FRAME,
        }
    }
}

/// Props stamped onto a `start-recording` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingProps {
    /// Recording configuration, including the crop rectangle.
    #[serde(flatten)]
    pub recording: RecordingProps,
    /// Finish-guide offsets.
    pub guide: Guide,
    /// Report every frame gap instead of only significant ones.
    pub report_all_gaps: bool,
    /// Burn a time overlay into recorded frames.
    pub add_time_overlay: bool,
}

/// Props of a `send-visca-cmd` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViscaCmdProps {
    /// Correlation id echoed back in the `visca-result` push.
    pub id: String,
    /// Camera address.
    pub ip: String,
    /// Camera VISCA port.
    pub port: u16,
    /// Raw VISCA packet.
    pub data: Vec<u8>,
}

/// Closed set of operations exchanged with the recorder collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "props", rename_all = "kebab-case")]
pub enum RecorderMessage {
    /// Begin recording with the stamped props.
    StartRecording(StartRecordingProps),
    /// Stop recording. Succeeds when already stopped.
    StopRecording,
    /// Query the recorder status.
    RecordingStatus,
    /// Fetch the recorder's event log.
    RecordingLog,
    /// Grab the most recent RGBA frame.
    GrabFrame,
    /// List discovered cameras.
    GetCameraList,
    /// Patch recorder settings.
    Settings(SettingsPatch),
    /// Send a raw VISCA packet to a camera.
    SendViscaCmd(ViscaCmdProps),
}

impl RecorderMessage {
    /// Wire name of the operation.
    pub fn op(&self) -> &'static str {
        match self {
            RecorderMessage::StartRecording(_) => "start-recording",
            RecorderMessage::StopRecording => "stop-recording",
            RecorderMessage::RecordingStatus => "recording-status",
            RecorderMessage::RecordingLog => "recording-log",
            RecorderMessage::GrabFrame => "grab-frame",
            RecorderMessage::GetCameraList => "get-camera-list",
            RecorderMessage::Settings(_) => "settings",
            RecorderMessage::SendViscaCmd(_) => "send-visca-cmd",
        }
    }
}
