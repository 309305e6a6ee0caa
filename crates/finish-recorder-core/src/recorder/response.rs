use crate::msgbus::{BusResponse, FailureKind};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Response status tag. Anything other than `"OK"` on the wire reads as `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    /// Operation succeeded.
    Ok,
    /// Operation failed; see the response error.
    Fail,
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        if value == "OK" { Status::Ok } else { Status::Fail }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        match value {
            Status::Ok => "OK".to_string(),
            Status::Fail => "Fail".to_string(),
        }
    }
}

/// An RGBA frame grabbed from the input stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGrab {
    /// RGBA pixels, row major, 4 bytes per pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Length of `data` in bytes.
    pub total_bytes: usize,
    /// Capture timestamp reported by the recorder, in UTC milliseconds.
    pub ts_milli: u64,
    /// Focus score of the configured focus area, 0 when disabled.
    pub focus: f64,
}

const TEST_PATTERN_WIDTH: u32 = 1280;
const TEST_PATTERN_HEIGHT: u32 = 720;
const TEST_PATTERN_CELL: u32 = 20;

impl FrameGrab {
    /// Wrap RGBA pixels as a frame.
    pub fn new(data: Vec<u8>, width: u32, height: u32, ts_milli: u64) -> Self {
        Self {
            total_bytes: data.len(),
            data,
            width,
            height,
            ts_milli,
            focus: 0.0,
        }
    }

    /// Black and white checkerboard shown before the first real frame arrives.
    pub fn test_pattern() -> Self {
        let (width, height) = (TEST_PATTERN_WIDTH, TEST_PATTERN_HEIGHT);
        let mut data = vec![0u8; (width * height * 4) as usize];

        for y in 0..height {
            for x in 0..width {
                let offset = ((y * width + x) * 4) as usize;
                let white = (y / TEST_PATTERN_CELL) % 2 == (x / TEST_PATTERN_CELL) % 2;
                let value = if white { 255 } else { 0 };
                data[offset..offset + 3].fill(value);
                data[offset + 3] = 255;
            }
        }

        Self::new(data, width, height, 0)
    }
}

/// A camera discovered by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Display name.
    pub name: String,
    /// Network address.
    pub address: String,
}

/// Frame-processor sub-status nested in [`RecordingStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameProcessorStatus {
    /// Whether frames are being written.
    pub recording: bool,
    /// Last processor error, empty when healthy.
    pub error: String,
    /// File currently being written.
    pub filename: String,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Measured frame rate.
    pub fps: f64,
    /// Frames queued but not yet written.
    pub frame_backlog: u32,
    /// Timestamp of the last written frame in UTC milliseconds.
    pub last_ts_milli: u64,
}

/// Recorder status.
///
/// Every field has a default so partial payloads from the collaborator merge
/// over the documented default shape instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingStatus {
    /// Whether the recorder is running.
    pub recording: bool,
    /// Seconds recorded so far.
    pub recording_duration: u64,
    /// Last recorder error, empty when healthy.
    pub error: String,
    /// Frame processor sub-status.
    pub frame_processor: FrameProcessorStatus,
}

/// One entry of the recorder event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingLogEntry {
    /// Event time in UTC milliseconds.
    pub ts_milli: u64,
    /// Subsystem that raised the event.
    pub subsystem: String,
    /// Event text. Errors start with `Error:`.
    pub message: String,
}

/// Operation-specific result data.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// No result data.
    None,
    /// `grab-frame` result.
    Frame(Arc<FrameGrab>),
    /// `get-camera-list` result.
    Cameras(Vec<CameraInfo>),
    /// `recording-status` result.
    Status(RecordingStatus),
    /// `recording-log` result.
    Log(Vec<RecordingLogEntry>),
}

/// Response to a [`RecorderMessage`](crate::recorder::RecorderMessage).
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderResponse {
    /// `OK` or `Fail`.
    pub status: Status,
    /// Failure reason.
    pub error: Option<String>,
    /// Where the failure came from, when known.
    pub failure: Option<FailureKind>,
    /// Result data.
    pub payload: ResponsePayload,
}

impl RecorderResponse {
    /// Successful response without data.
    pub fn ok() -> Self {
        Self::ok_with(ResponsePayload::None)
    }

    /// Successful response carrying `payload`.
    pub fn ok_with(payload: ResponsePayload) -> Self {
        Self {
            status: Status::Ok,
            error: None,
            failure: None,
            payload,
        }
    }

    /// Failure reported by the recorder collaborator itself.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::failure(FailureKind::Recorder, reason.into())
    }

    /// Whether the status is `OK`.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// The grabbed frame, if this response carries one.
    pub fn frame(&self) -> Option<&Arc<FrameGrab>> {
        match &self.payload {
            ResponsePayload::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// The camera list, if this response carries one.
    pub fn cameras(&self) -> Option<&[CameraInfo]> {
        match &self.payload {
            ResponsePayload::Cameras(cameras) => Some(cameras),
            _ => None,
        }
    }

    /// The recording status, if this response carries one.
    pub fn recording_status(&self) -> Option<&RecordingStatus> {
        match &self.payload {
            ResponsePayload::Status(status) => Some(status),
            _ => None,
        }
    }

    /// The log entries, if this response carries them.
    pub fn log(&self) -> Option<&[RecordingLogEntry]> {
        match &self.payload {
            ResponsePayload::Log(entries) => Some(entries),
            _ => None,
        }
    }
}

impl BusResponse for RecorderResponse {
    fn failure(kind: FailureKind, reason: String) -> Self {
        Self {
            status: Status::Fail,
            error: Some(reason),
            failure: Some(kind),
            payload: ResponsePayload::None,
        }
    }
}
