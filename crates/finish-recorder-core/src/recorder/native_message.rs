use crate::recorder::{Guide, RecordingLogEntry};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Outcome of a VISCA exchange as reported by the recorder's camera client.
///
/// Carried on the wire as its ordinal, `0` for `Ok` through `4` for `UnknownError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ViscaResultStatus {
    /// A final response was received.
    Ok,
    /// The client is not connected to the camera.
    NotConnected,
    /// Send or receive failed on the socket.
    SocketError,
    /// No final response before the device timeout.
    Timeout,
    /// Anything else.
    UnknownError,
}

impl From<ViscaResultStatus> for u8 {
    fn from(status: ViscaResultStatus) -> Self {
        match status {
            ViscaResultStatus::Ok => 0,
            ViscaResultStatus::NotConnected => 1,
            ViscaResultStatus::SocketError => 2,
            ViscaResultStatus::Timeout => 3,
            ViscaResultStatus::UnknownError => 4,
        }
    }
}

impl TryFrom<u8> for ViscaResultStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ViscaResultStatus::Ok),
            1 => Ok(ViscaResultStatus::NotConnected),
            2 => Ok(ViscaResultStatus::SocketError),
            3 => Ok(ViscaResultStatus::Timeout),
            4 => Ok(ViscaResultStatus::UnknownError),
            other => Err(format!("unknown VISCA result status {}", other)),
        }
    }
}

/// Pushed result of a `send-visca-cmd` request, keyed by correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViscaResult {
    /// Correlation id of the originating request.
    pub id: String,
    /// Exchange outcome.
    pub status: ViscaResultStatus,
    /// Final VISCA message bytes, when any were received.
    #[serde(default)]
    pub data: Option<Vec<u8>>,
}

/// Multicast notification from a timing system on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McastContent {
    /// Command name, e.g. `split-video` or `info`.
    pub cmd: String,
    /// Waypoint the sender is timing.
    #[serde(default)]
    pub wp: String,
}

/// Out-of-band message pushed from the recorder to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeMessage {
    /// Recorder event log entry.
    SysEvent(RecordingLogEntry),
    /// Result of an earlier `send-visca-cmd`.
    ViscaResult(ViscaResult),
    /// Camera connection state changed.
    ViscaState(String),
    /// Diagnostic from the camera client.
    ViscaStatus(String),
    /// Multicast notification.
    Mcast(McastContent),
    /// Finish guide reconfigured by the recorder.
    GuideConfig(Guide),
    /// Sender not in the fixed enumeration, or content that did not decode.
    Unhandled {
        /// The sender tag as received.
        sender: String,
    },
}

#[derive(Deserialize)]
struct RawNativeMessage {
    sender: String,
    #[serde(default)]
    content: Value,
}

#[derive(Deserialize)]
struct StateContent {
    state: String,
}

#[derive(Deserialize)]
struct StatusContent {
    msg: String,
}

impl NativeMessage {
    /// Wire name of the sender.
    pub fn sender(&self) -> &str {
        match self {
            NativeMessage::SysEvent(_) => "sysevent",
            NativeMessage::ViscaResult(_) => "visca-result",
            NativeMessage::ViscaState(_) => "visca-state",
            NativeMessage::ViscaStatus(_) => "visca-status",
            NativeMessage::Mcast(_) => "mcast",
            NativeMessage::GuideConfig(_) => "guide-config",
            NativeMessage::Unhandled { sender } => sender,
        }
    }

    /// Decode a `{sender, content}` JSON value.
    ///
    /// Never fails: unknown senders and undecodable content come back as
    /// [`NativeMessage::Unhandled`] so the dispatcher can log and drop them.
    pub fn from_json(value: Value) -> Self {
        let raw: RawNativeMessage = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "Native message without sender");
                return NativeMessage::Unhandled {
                    sender: String::new(),
                };
            }
        };

        let RawNativeMessage { sender, content } = raw;
        let decoded = match sender.as_str() {
            "sysevent" => Some(serde_json::from_value(content).map(NativeMessage::SysEvent)),
            "visca-result" => {
                Some(serde_json::from_value(content).map(NativeMessage::ViscaResult))
            }
            "visca-state" => Some(
                serde_json::from_value::<StateContent>(content)
                    .map(|c| NativeMessage::ViscaState(c.state)),
            ),
            "visca-status" => Some(
                serde_json::from_value::<StatusContent>(content)
                    .map(|c| NativeMessage::ViscaStatus(c.msg)),
            ),
            "mcast" => Some(serde_json::from_value(content).map(NativeMessage::Mcast)),
            "guide-config" => Some(serde_json::from_value(content).map(NativeMessage::GuideConfig)),
            _ => None,
        };

        match decoded {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                debug!(sender = %sender, error = %e, "Native message content did not decode");
                NativeMessage::Unhandled { sender }
            }
            None => NativeMessage::Unhandled { sender },
        }
    }
}
