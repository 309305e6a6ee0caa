use crate::{
    CoreResult, RecorderClient, RecorderError,
    recorder::{ViscaResult, ViscaResultStatus},
    visca::{ViscaCommand, build_packet},
};

use std::{future::Future, panic::Location, sync::Arc};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default camera address.
pub const DEFAULT_VISCA_IP: &str = "10.0.1.188";

/// Default VISCA-over-IP port. Port 0 disables camera control.
pub const DEFAULT_VISCA_PORT: u16 = 52381;

/// Where VISCA commands are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViscaTarget {
    /// Camera address. Empty means not configured.
    pub ip: String,
    /// Camera port. 0 disables camera control.
    pub port: u16,
}

impl Default for ViscaTarget {
    fn default() -> Self {
        Self {
            ip: DEFAULT_VISCA_IP.to_string(),
            port: DEFAULT_VISCA_PORT,
        }
    }
}

/// Reply to a VISCA command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViscaReply {
    /// Exchange outcome.
    pub status: ViscaResultStatus,
    /// Final VISCA message, when the camera sent one.
    pub data: Option<Vec<u8>>,
}

impl ViscaReply {
    /// Reply used when camera control is disabled: success without data.
    pub fn disabled() -> Self {
        Self {
            status: ViscaResultStatus::Ok,
            data: None,
        }
    }

    /// Raw reply bytes.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

impl From<ViscaResult> for ViscaReply {
    fn from(result: ViscaResult) -> Self {
        Self {
            status: result.status,
            data: result.data,
        }
    }
}

/// Anything that can deliver a [`ViscaCommand`] to a camera.
pub trait ViscaTransport: Send + Sync {
    /// Send `cmd` and wait for the camera's reply.
    fn send(&self, cmd: ViscaCommand) -> impl Future<Output = CoreResult<ViscaReply>> + Send;
}

/// Sends VISCA commands to the configured camera through the recorder.
#[derive(Clone)]
pub struct ViscaController {
    client: Arc<RecorderClient>,
}

impl ViscaController {
    /// Create a controller that routes through `client`.
    pub fn new(client: Arc<RecorderClient>) -> Self {
        Self { client }
    }
}

impl ViscaTransport for ViscaController {
    #[instrument(skip(self, cmd), fields(cmd = %cmd))]
    async fn send(&self, cmd: ViscaCommand) -> CoreResult<ViscaReply> {
        let target = self.client.state().visca_target.get();

        if target.port == 0 {
            debug!("VISCA disabled, command skipped");
            return Ok(ViscaReply::disabled());
        }

        if target.ip.is_empty() {
            return Err(RecorderError::ViscaFailed {
                reason: "Visca IP Address not set".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.client
            .send_visca_to_device(&target.ip, target.port, build_packet(&cmd))
            .await
    }
}
