use crate::{
    AppState, CoreResult, RecorderError,
    recorder::{
        NativeMessage, PushReceiver, RECORDER_DESTINATION, RecorderBus, RecorderMessage,
        RecorderResponse, ResponsePayload, SettingsPatch, StartRecordingProps, ViscaCmdProps,
        ViscaResult,
    },
    visca::{
        CameraState, ViscaCorrelator, ViscaReply, ViscaTransport, ZoomSettle, apply_camera_state,
        query_camera_state,
    },
};

use std::{panic::Location, sync::Arc, time::Duration};

use chrono::Utc;
use error_location::ErrorLocation;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// How long a VISCA request waits for its pushed result by default.
pub const DEFAULT_VISCA_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

const MCAST_WAYPOINT_COMMANDS: [&str; 2] = ["split-video", "info"];
const ERROR_PREFIX: &str = "Error:";

/// Application-side wrapper around the recorder destination.
///
/// Stamps outgoing requests from [`AppState`], post-processes responses back
/// into it, and dispatches the recorder's push channel.
pub struct RecorderClient {
    bus: Arc<RecorderBus>,
    state: Arc<AppState>,
    correlator: ViscaCorrelator,
    visca_reply_timeout: Duration,
}

impl RecorderClient {
    /// Create a client sending on `bus` and tracking `state`.
    pub fn new(bus: Arc<RecorderBus>, state: Arc<AppState>) -> Self {
        Self {
            bus,
            state,
            correlator: ViscaCorrelator::new(),
            visca_reply_timeout: DEFAULT_VISCA_REPLY_TIMEOUT,
        }
    }

    /// Override how long VISCA requests wait for their result.
    pub fn with_visca_reply_timeout(mut self, timeout: Duration) -> Self {
        self.visca_reply_timeout = timeout;
        self
    }

    /// Shared application state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// VISCA requests awaiting a result.
    pub fn correlator(&self) -> &ViscaCorrelator {
        &self.correlator
    }

    async fn send(&self, message: RecorderMessage) -> RecorderResponse {
        self.bus.send(RECORDER_DESTINATION, message).await
    }

    /// Start recording with the stored props merged over the defaults.
    #[instrument(skip(self))]
    pub async fn start_recording(&self) -> RecorderResponse {
        self.state
            .recording_start_time
            .set(u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0));
        self.state.recording_props_pending.set(false);
        self.state.is_recording.set(true);

        let props = StartRecordingProps {
            recording: self.state.recording_props.get(),
            guide: self.state.guide.get(),
            report_all_gaps: self.state.report_all_gaps.get(),
            add_time_overlay: self.state.add_time_overlay.get(),
        };

        let response = self.send(RecorderMessage::StartRecording(props)).await;
        if response.is_ok() {
            info!("Recording started");
        } else {
            warn!(error = ?response.error, "Start recording failed");
        }
        response
    }

    /// Stop recording. Succeeds when already stopped.
    #[instrument(skip(self))]
    pub async fn stop_recording(&self) -> RecorderResponse {
        self.state.is_recording.set(false);
        self.state.recording_props_pending.set(false);

        let response = self.send(RecorderMessage::StopRecording).await;
        if !response.is_ok() {
            warn!(error = ?response.error, "Stop recording failed");
        }
        response
    }

    /// Query recorder status and publish it to state.
    ///
    /// A successful response always carries a status payload; when the
    /// recorder omitted it, the default status is substituted.
    #[instrument(skip(self))]
    pub async fn query_recording_status(&self) -> RecorderResponse {
        let mut response = self.send(RecorderMessage::RecordingStatus).await;

        if response.is_ok() {
            if !matches!(response.payload, ResponsePayload::Status(_)) {
                response.payload = ResponsePayload::Status(Default::default());
            }
            if let ResponsePayload::Status(status) = &response.payload {
                self.state.recording_status.set(status.clone());
            }
        } else {
            debug!(error = ?response.error, "Recording status unavailable");
        }

        response
    }

    /// Fetch the recorder's event log.
    #[instrument(skip(self))]
    pub async fn query_recording_log(&self) -> RecorderResponse {
        self.send(RecorderMessage::RecordingLog).await
    }

    /// List cameras the recorder has discovered.
    #[instrument(skip(self))]
    pub async fn query_camera_list(&self) -> RecorderResponse {
        self.send(RecorderMessage::GetCameraList).await
    }

    /// Grab a frame into the most-recent-frame slot.
    ///
    /// Only an `OK` response carrying a frame replaces the slot; failures and
    /// empty responses keep the previous frame so the preview never blanks.
    pub async fn request_video_frame(&self) -> RecorderResponse {
        let response = self.send(RecorderMessage::GrabFrame).await;

        match response.frame() {
            Some(frame) if response.is_ok() => {
                self.state.frame_grab.set(Arc::clone(frame));
            }
            _ if !response.is_ok() => {
                debug!(error = ?response.error, "Frame grab failed, keeping previous frame");
            }
            _ => {}
        }

        response
    }

    /// Send a settings patch to the recorder.
    #[instrument(skip(self))]
    pub async fn update_settings(&self, patch: SettingsPatch) -> RecorderResponse {
        self.send(RecorderMessage::Settings(patch)).await
    }

    /// Send raw VISCA bytes to `ip:port` and wait for the pushed result.
    ///
    /// The pending entry is removed when the result arrives, when the send
    /// itself fails, or when the reply timeout passes.
    ///
    /// # Errors
    ///
    /// `ViscaFailed` when the recorder rejects the request, `Timeout` when no
    /// result arrives in time.
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub async fn send_visca_to_device(
        &self,
        ip: &str,
        port: u16,
        data: Vec<u8>,
    ) -> CoreResult<ViscaReply> {
        let (id, rx) = self.correlator.register().await;

        let props = ViscaCmdProps {
            id: id.clone(),
            ip: ip.to_string(),
            port,
            data,
        };

        let response = self.send(RecorderMessage::SendViscaCmd(props)).await;
        if !response.is_ok() {
            self.correlator.cancel(&id).await;
            return Err(RecorderError::ViscaFailed {
                reason: response
                    .error
                    .unwrap_or_else(|| "send-visca-cmd failed".to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match tokio::time::timeout(self.visca_reply_timeout, rx).await {
            Ok(Ok(result)) => Ok(result.into()),
            Ok(Err(_)) => Err(RecorderError::ViscaFailed {
                reason: format!("VISCA request {} dropped before completion", id),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(_) => {
                self.correlator.cancel(&id).await;
                warn!(id = %id, "VISCA reply timed out");
                Err(RecorderError::Timeout {
                    operation: format!("VISCA reply {}", id),
                    waited_ms: self.visca_reply_timeout.as_millis(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Dispatch one message from the recorder push channel.
    #[instrument(skip(self, message), fields(sender = message.sender()))]
    pub async fn handle_native_message(&self, message: NativeMessage) {
        match message {
            NativeMessage::SysEvent(entry) => {
                info!(subsystem = %entry.subsystem, "{}", entry.message);
                if entry.message.starts_with(ERROR_PREFIX) {
                    self.state.logger_alert.update(|count| *count += 1);
                }
                self.state.system_log.update(|log| log.push(entry));
            }
            NativeMessage::ViscaResult(result) => {
                self.resolve_visca(result).await;
            }
            NativeMessage::ViscaState(state) => {
                info!(state = %state, "Visca state");
                self.state.visca_state.set(state);
            }
            NativeMessage::ViscaStatus(status) => {
                info!("{}", status);
            }
            NativeMessage::Mcast(content) => {
                if MCAST_WAYPOINT_COMMANDS.contains(&content.cmd.as_str())
                    && !content.wp.is_empty()
                    && self.state.add_waypoint(&content.wp)
                {
                    debug!(waypoint = %content.wp, "Waypoint discovered");
                }
            }
            NativeMessage::GuideConfig(guide) => {
                self.state.guide.set(guide);
            }
            NativeMessage::Unhandled { sender } => {
                warn!(sender = %sender, "Unhandled message sender");
            }
        }
    }

    async fn resolve_visca(&self, result: ViscaResult) {
        self.correlator.resolve(result).await;
    }

    /// Query the camera and publish the result to state.
    pub async fn refresh_camera_state<T: ViscaTransport>(&self, transport: &T) -> CameraState {
        let camera = query_camera_state(transport).await;
        self.state.camera_state.set(camera);
        camera
    }

    /// Query the camera and save its state into preset `slot`.
    #[instrument(skip(self, transport))]
    pub async fn save_preset<T: ViscaTransport>(&self, transport: &T, slot: u8) -> CameraState {
        let camera = self.refresh_camera_state(transport).await;
        self.state.store_preset(slot, camera);
        info!(slot, "Camera preset saved");
        camera
    }

    /// Apply preset `slot` to the camera.
    ///
    /// Returns `None` when nothing is saved in `slot`.
    ///
    /// # Errors
    ///
    /// Returns the first failed set command.
    #[instrument(skip(self, transport))]
    pub async fn load_preset<T: ViscaTransport>(
        &self,
        transport: &T,
        slot: u8,
    ) -> CoreResult<Option<ZoomSettle>> {
        let Some(camera) = self.state.preset(slot) else {
            warn!(slot, "No camera preset saved");
            return Ok(None);
        };

        let settle = apply_camera_state(transport, &camera.into()).await?;
        self.state.camera_state.set(camera);
        Ok(Some(settle))
    }

    /// Drain `push_rx` into [`RecorderClient::handle_native_message`] until it closes.
    pub fn spawn_push_listener(self: &Arc<Self>, mut push_rx: PushReceiver) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(message) = push_rx.recv().await {
                client.handle_native_message(message).await;
            }
            debug!("Recorder push channel closed");
        })
    }
}
