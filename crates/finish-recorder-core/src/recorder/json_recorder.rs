//! Bridge to a recorder that speaks JSON objects.
//!
//! The capture addon takes `{op, props}` objects and returns loosely-typed
//! `{status, error?, ...}` objects whose fields may be missing. This backend
//! owns that boundary: requests are serialized from [`RecorderMessage`] and
//! responses are decoded per operation, with absent fields falling back to
//! the protocol defaults.

use crate::{
    CoreResult, RecorderError,
    recorder::{
        CameraInfo, FrameGrab, NativeMessage, PushSender, RecorderBackend, RecorderMessage,
        RecorderResponse, RecordingLogEntry, RecordingStatus, ResponsePayload, Status,
    },
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};

/// A JSON-speaking recorder entry point. `Err` carries the collaborator's reason.
pub trait JsonEndpoint: Send + Sync {
    /// Send one request object and return the response object.
    fn call(&self, request: Value) -> Result<Value, String>;
}

impl<F> JsonEndpoint for F
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    fn call(&self, request: Value) -> Result<Value, String> {
        self(request)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default = "default_status")]
    status: Status,
    #[serde(default)]
    error: Option<String>,
}

fn default_status() -> Status {
    Status::Ok
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FramePayload {
    data: Option<Vec<u8>>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    ts_milli: u64,
    #[serde(default)]
    focus: f64,
}

#[derive(Deserialize)]
struct CameraPayload {
    #[serde(default)]
    cameras: Vec<CameraInfo>,
}

#[derive(Deserialize)]
struct LogPayload {
    #[serde(default)]
    list: Vec<RecordingLogEntry>,
}

/// Recorder backend over a [`JsonEndpoint`].
pub struct JsonRecorder<E> {
    endpoint: E,
    push_tx: PushSender,
}

impl<E: JsonEndpoint> JsonRecorder<E> {
    /// Wrap `endpoint`. Pushed JSON messages are forwarded with [`JsonRecorder::push`].
    pub fn new(endpoint: E, push_tx: PushSender) -> Self {
        Self { endpoint, push_tx }
    }

    /// Decode and forward a pushed `{sender, content}` object.
    ///
    /// Returns `false` once the push receiver has been dropped.
    pub fn push(&self, value: Value) -> bool {
        self.push_tx.send(NativeMessage::from_json(value)).is_ok()
    }

    #[track_caller]
    fn decode(op: &RecorderMessage, value: Value) -> CoreResult<RecorderResponse> {
        let envelope: Envelope = serde_json::from_value(value.clone())?;

        if envelope.status == Status::Fail {
            let reason = envelope
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("{} failed", op.op()));
            return Ok(RecorderResponse::fail(reason));
        }

        let payload = match op {
            RecorderMessage::GrabFrame => {
                let frame: FramePayload = serde_json::from_value(value)?;
                match frame.data {
                    Some(data) if !data.is_empty() => {
                        let expected = frame.width as usize * frame.height as usize * 4;
                        if data.len() != expected {
                            return Err(RecorderError::Protocol {
                                reason: format!(
                                    "grab-frame returned {} bytes for {}x{}",
                                    data.len(),
                                    frame.width,
                                    frame.height
                                ),
                                location: ErrorLocation::from(Location::caller()),
                            });
                        }
                        let mut grab = FrameGrab::new(data, frame.width, frame.height, frame.ts_milli);
                        grab.focus = frame.focus;
                        ResponsePayload::Frame(Arc::new(grab))
                    }
                    // No frame captured yet.
                    _ => ResponsePayload::None,
                }
            }
            RecorderMessage::GetCameraList => {
                let cameras: CameraPayload = serde_json::from_value(value)?;
                ResponsePayload::Cameras(cameras.cameras)
            }
            RecorderMessage::RecordingStatus => {
                let status = serde_json::from_value::<RecordingStatus>(value).unwrap_or_else(|e| {
                    warn!(error = %e, "Malformed recording status, using defaults");
                    RecordingStatus::default()
                });
                ResponsePayload::Status(status)
            }
            RecorderMessage::RecordingLog => {
                let log: LogPayload = serde_json::from_value(value)?;
                ResponsePayload::Log(log.list)
            }
            RecorderMessage::StartRecording(_)
            | RecorderMessage::StopRecording
            | RecorderMessage::Settings(_)
            | RecorderMessage::SendViscaCmd(_) => ResponsePayload::None,
        };

        Ok(RecorderResponse::ok_with(payload))
    }
}

impl<E: JsonEndpoint> RecorderBackend for JsonRecorder<E> {
    #[track_caller]
    #[instrument(skip(self, message), fields(op = message.op()))]
    fn handle(&self, message: RecorderMessage) -> CoreResult<RecorderResponse> {
        let caller = Location::caller();
        let request = serde_json::to_value(&message)?;

        let response = self
            .endpoint
            .call(request)
            .map_err(|reason| RecorderError::HandlerFailure {
                reason,
                location: ErrorLocation::from(caller),
            })?;

        Self::decode(&message, response)
    }
}
