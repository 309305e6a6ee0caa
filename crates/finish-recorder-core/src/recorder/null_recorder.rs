//! In-process recorder used when no capture backend is attached.
//!
//! Accepts every operation, serves a test-pattern frame stamped with the
//! current time, and answers VISCA commands as if no camera were connected.

use crate::{
    CoreResult, RecorderError,
    recorder::{
        FrameGrab, FrameProcessorStatus, NativeMessage, PushSender, RecorderBackend,
        RecorderMessage, RecorderResponse, RecordingLogEntry, RecordingStatus, ResponsePayload,
        SettingsPatch, StartRecordingProps, ViscaCmdProps, ViscaResult, ViscaResultStatus,
    },
    timestamp::{encode_timestamp_row, millis_to_ticks},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::Utc;
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

const SUBSYSTEM: &str = "NullRecorder";
const NOMINAL_FPS: f64 = 30.0;
const VISCA_HEADER: u8 = 0x81;

struct Session {
    props: StartRecordingProps,
    started_at: Instant,
}

#[derive(Default)]
struct NullRecorderState {
    session: Option<Session>,
    settings: SettingsPatch,
    log: Vec<RecordingLogEntry>,
}

/// Recorder backend that records nothing.
pub struct NullRecorder {
    state: Mutex<NullRecorderState>,
    pattern: Arc<FrameGrab>,
    push_tx: PushSender,
}

impl NullRecorder {
    /// Create a null recorder that pushes events on `push_tx`.
    pub fn new(push_tx: PushSender) -> Self {
        Self {
            state: Mutex::new(NullRecorderState::default()),
            pattern: Arc::new(FrameGrab::test_pattern()),
            push_tx,
        }
    }

    /// Settings received through `settings` operations so far.
    #[track_caller]
    pub fn settings(&self) -> CoreResult<SettingsPatch> {
        Ok(self.lock()?.settings.clone())
    }

    #[track_caller]
    fn lock(&self) -> CoreResult<MutexGuard<'_, NullRecorderState>> {
        let caller = Location::caller();
        self.state.lock().map_err(|_| RecorderError::HandlerFailure {
            reason: "NullRecorder state lock poisoned".to_string(),
            location: ErrorLocation::from(caller),
        })
    }

    fn log_event(&self, state: &mut NullRecorderState, message: String) {
        let entry = RecordingLogEntry {
            ts_milli: now_millis(),
            subsystem: SUBSYSTEM.to_string(),
            message,
        };
        state.log.push(entry.clone());
        // The receiver may be gone during shutdown; the entry stays in the log.
        let _ = self.push_tx.send(NativeMessage::SysEvent(entry));
    }

    fn start(&self, props: StartRecordingProps) -> CoreResult<RecorderResponse> {
        let mut state = self.lock()?;

        let message = format!(
            "Recording started: folder={} prefix={} duration={}s",
            props.recording.recording_folder,
            props.recording.recording_prefix,
            props.recording.recording_duration
        );
        state.session = Some(Session {
            props,
            started_at: Instant::now(),
        });
        self.log_event(&mut state, message);

        Ok(RecorderResponse::ok())
    }

    fn stop(&self) -> CoreResult<RecorderResponse> {
        let mut state = self.lock()?;

        if let Some(session) = state.session.take() {
            let elapsed = session.started_at.elapsed().as_secs();
            self.log_event(&mut state, format!("Recording stopped after {}s", elapsed));
        } else {
            debug!("Stop requested while already stopped");
        }

        Ok(RecorderResponse::ok())
    }

    fn status(&self) -> CoreResult<RecorderResponse> {
        let state = self.lock()?;

        let status = match &state.session {
            Some(session) => RecordingStatus {
                recording: true,
                recording_duration: session.started_at.elapsed().as_secs(),
                error: String::new(),
                frame_processor: FrameProcessorStatus {
                    recording: true,
                    filename: format!(
                        "{}/{}null.mp4",
                        session.props.recording.recording_folder.trim_end_matches('/'),
                        session.props.recording.recording_prefix
                    ),
                    width: self.pattern.width,
                    height: self.pattern.height,
                    fps: NOMINAL_FPS,
                    last_ts_milli: now_millis(),
                    ..FrameProcessorStatus::default()
                },
            },
            None => RecordingStatus::default(),
        };

        Ok(RecorderResponse::ok_with(ResponsePayload::Status(status)))
    }

    fn grab_frame(&self) -> RecorderResponse {
        let ts_milli = now_millis();
        let mut frame = FrameGrab::clone(&self.pattern);
        encode_timestamp_row(
            &mut frame.data,
            0,
            frame.width as usize,
            millis_to_ticks(ts_milli),
        );
        frame.ts_milli = ts_milli;

        RecorderResponse::ok_with(ResponsePayload::Frame(Arc::new(frame)))
    }

    fn update_settings(&self, patch: SettingsPatch) -> CoreResult<RecorderResponse> {
        let mut state = self.lock()?;
        debug!(keys = ?patch.keys().collect::<Vec<_>>(), "Settings updated");
        state.settings.extend(patch);
        Ok(RecorderResponse::ok())
    }

    fn send_visca(&self, props: ViscaCmdProps) -> RecorderResponse {
        if props.data.first() != Some(&VISCA_HEADER) {
            return RecorderResponse::fail(format!(
                "Invalid VISCA packet for {}:{}",
                props.ip, props.port
            ));
        }

        let result = NativeMessage::ViscaResult(ViscaResult {
            id: props.id,
            status: ViscaResultStatus::NotConnected,
            data: None,
        });
        if self.push_tx.send(result).is_err() {
            debug!("Push receiver gone, VISCA result dropped");
        }

        RecorderResponse::ok()
    }
}

impl RecorderBackend for NullRecorder {
    #[instrument(skip(self, message), fields(op = message.op()))]
    fn handle(&self, message: RecorderMessage) -> CoreResult<RecorderResponse> {
        match message {
            RecorderMessage::StartRecording(props) => {
                info!("Null recorder start");
                self.start(props)
            }
            RecorderMessage::StopRecording => self.stop(),
            RecorderMessage::RecordingStatus => self.status(),
            RecorderMessage::RecordingLog => {
                let entries = self.lock()?.log.clone();
                Ok(RecorderResponse::ok_with(ResponsePayload::Log(entries)))
            }
            RecorderMessage::GrabFrame => Ok(self.grab_frame()),
            RecorderMessage::GetCameraList => {
                Ok(RecorderResponse::ok_with(ResponsePayload::Cameras(Vec::new())))
            }
            RecorderMessage::Settings(patch) => self.update_settings(patch),
            RecorderMessage::SendViscaCmd(props) => Ok(self.send_visca(props)),
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
