use crate::{
    AppState, CoreResult, RecorderClient, RecorderError,
    recorder::{RecorderBus, ViscaResultStatus},
    settings::StoredSettings,
    visca::{
        COMMAND_SETTLE_DELAY, CameraState, CameraStatePatch, ExposureMode, ViscaCommand,
        ViscaReply, ViscaTarget, ViscaTransport, ZOOM_POLL_INTERVAL, ZOOM_SETTLE_TIMEOUT,
        ZoomSettle, apply_camera_state, query_camera_state,
    },
};

use std::{
    panic::Location,
    sync::{Arc, Mutex},
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::time::Instant;

/// In-memory camera that records every command it receives.
struct ScriptedCamera {
    sent: Mutex<Vec<ViscaCommand>>,
    zoom: Mutex<u16>,
    /// Whether SET_ZOOM moves the reported zoom position.
    zoom_follows: bool,
    /// Reply to every inquiry with no data.
    silent: bool,
}

impl ScriptedCamera {
    fn new(zoom: u16, zoom_follows: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            zoom: Mutex::new(zoom),
            zoom_follows,
            silent: false,
        }
    }

    fn silent() -> Self {
        Self {
            silent: true,
            ..Self::new(0, false)
        }
    }

    #[allow(clippy::unwrap_used)]
    fn sent(&self) -> Vec<ViscaCommand> {
        self.sent.lock().unwrap().clone()
    }
}

fn reply(data: Vec<u8>) -> ViscaReply {
    ViscaReply {
        status: ViscaResultStatus::Ok,
        data: Some(data),
    }
}

fn word_reply(v: u16) -> ViscaReply {
    reply(vec![
        0x90,
        0x50,
        ((v >> 12) & 0x0f) as u8,
        ((v >> 8) & 0x0f) as u8,
        ((v >> 4) & 0x0f) as u8,
        (v & 0x0f) as u8,
        0xff,
    ])
}

impl ViscaTransport for ScriptedCamera {
    #[allow(clippy::unwrap_used)]
    async fn send(&self, cmd: ViscaCommand) -> CoreResult<ViscaReply> {
        self.sent.lock().unwrap().push(cmd);

        if self.silent {
            return Ok(ViscaReply::disabled());
        }

        let mut zoom = self.zoom.lock().unwrap();
        Ok(match cmd {
            ViscaCommand::SetZoom(v) if self.zoom_follows => {
                *zoom = v;
                reply(vec![0x90, 0x51, 0xff])
            }
            ViscaCommand::ZoomValue => word_reply(*zoom),
            ViscaCommand::FocusValue => word_reply(0x0400),
            ViscaCommand::AutoFocusValue => reply(vec![0x90, 0x50, 0x03, 0xff]),
            ViscaCommand::ExposureModeValue => reply(vec![0x90, 0x50, 0x03, 0xff]),
            ViscaCommand::IrisValue => reply(vec![0x90, 0x50, 0x00, 0x00, 0x01, 0x02, 0xff]),
            _ => reply(vec![0x90, 0x51, 0xff]),
        })
    }
}

/// Fails every command.
struct UnreachableCamera;

impl ViscaTransport for UnreachableCamera {
    async fn send(&self, _cmd: ViscaCommand) -> CoreResult<ViscaReply> {
        Err(RecorderError::ViscaFailed {
            reason: "socket closed".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// WHAT: Apply sends exposure-dependent fields first, zoom next and focus last
/// WHY: Iris, shutter and gain only stick after the exposure mode is set
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_full_patch_when_applying_then_commands_in_dependency_order() {
    // Given: A camera whose zoom follows SET_ZOOM and a complete patch
    let camera = ScriptedCamera::new(0, true);
    let patch = CameraStatePatch::from(CameraState {
        auto_focus: false,
        exposure_mode: ExposureMode::Manual,
        iris: 1,
        shutter: 2,
        gain: 3,
        brightness: 4,
        focus: 500,
        zoom: 6000,
    });
    let started = Instant::now();

    // When: Applying
    let settle = apply_camera_state(&camera, &patch).await.unwrap();

    // Then: Each of the six discrete sets waited out its settle delay, plus one zoom poll
    assert!(started.elapsed() >= 6 * COMMAND_SETTLE_DELAY + ZOOM_POLL_INTERVAL);

    // Then: Fixed order, one zoom poll, zoom settled
    assert_eq!(
        camera.sent(),
        vec![
            ViscaCommand::ExposureMode(ExposureMode::Manual),
            ViscaCommand::SetIris(1),
            ViscaCommand::SetShutter(2),
            ViscaCommand::SetGain(3),
            ViscaCommand::SetBrightness(4),
            ViscaCommand::AutoFocus(false),
            ViscaCommand::SetZoom(6000),
            ViscaCommand::ZoomValue,
            ViscaCommand::SetFocus(500),
        ]
    );
    assert_eq!(settle, ZoomSettle::Settled { position: 6000 });
}

/// WHAT: A zoom that never converges ends after the settle timeout
/// WHY: A stuck lens must not hang preset loading forever
///
/// The timeout is also logged at warn; `ZoomSettle::TimedOut` is the
/// observable outcome checked here.
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_zoom_never_converging_when_applying_then_times_out_and_continues() {
    // Given: A camera stuck at zoom 100
    let camera = ScriptedCamera::new(100, false);
    let patch = CameraStatePatch {
        zoom: Some(5000),
        focus: Some(42),
        ..CameraStatePatch::default()
    };
    let started = Instant::now();

    // When: Applying zoom and focus
    let settle = apply_camera_state(&camera, &patch).await.unwrap();

    // Then: Timed out within the bound, and focus was still sent
    let elapsed = started.elapsed();
    assert_eq!(
        settle,
        ZoomSettle::TimedOut {
            current: 100,
            target: 5000
        }
    );
    assert!(elapsed >= ZOOM_SETTLE_TIMEOUT);
    assert!(elapsed <= ZOOM_SETTLE_TIMEOUT + Duration::from_secs(1));
    assert_eq!(camera.sent().last(), Some(&ViscaCommand::SetFocus(42)));
}

/// WHAT: A single discrete set waits out the settle delay before it is sent
/// WHY: Cameras drop commands that arrive faster than they can process them
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_single_set_when_applying_then_settle_delay_precedes_it() {
    // Given: A patch with only an exposure mode
    let camera = ScriptedCamera::new(0, true);
    let patch = CameraStatePatch {
        exposure_mode: Some(ExposureMode::Auto),
        ..CameraStatePatch::default()
    };
    let started = Instant::now();

    // When: Applying
    let settle = apply_camera_state(&camera, &patch).await.unwrap();

    // Then: One settle delay elapsed and nothing else was sent
    let elapsed = started.elapsed();
    assert!(elapsed >= COMMAND_SETTLE_DELAY);
    assert!(elapsed < ZOOM_POLL_INTERVAL);
    assert_eq!(camera.sent(), vec![ViscaCommand::ExposureMode(ExposureMode::Auto)]);
    assert_eq!(settle, ZoomSettle::NotRequested);
}

/// WHAT: A zoom within tolerance of the target counts as settled
/// WHY: Lenses rarely land on the exact requested position
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_zoom_within_tolerance_when_applying_then_settled() {
    // Given: A camera resting 80 units from the target
    let camera = ScriptedCamera::new(4920, false);
    let patch = CameraStatePatch {
        zoom: Some(5000),
        ..CameraStatePatch::default()
    };

    // When: Applying
    let settle = apply_camera_state(&camera, &patch).await.unwrap();

    // Then: Settled at the reported position
    assert_eq!(settle, ZoomSettle::Settled { position: 4920 });
}

/// WHAT: Query decodes inquiry replies into camera state
/// WHY: Presets save exactly what the camera reports
#[tokio::test]
async fn given_camera_replies_when_querying_then_state_decoded() {
    // Given: A camera with known replies
    let camera = ScriptedCamera::new(0x2000, false);

    // When: Querying
    let state = query_camera_state(&camera).await;

    // Then: Each field is decoded
    assert!(!state.auto_focus);
    assert_eq!(state.exposure_mode, ExposureMode::Manual);
    assert_eq!(state.iris, 0x12);
    assert_eq!(state.zoom, 0x2000);
    assert_eq!(state.focus, 0x0400);
    assert_eq!(camera.sent().len(), 8);
}

/// WHAT: Empty or failed inquiries fall back to the decode defaults
/// WHY: Camera state must always be complete, even with no camera attached
#[tokio::test]
async fn given_no_reply_data_when_querying_then_defaults() {
    // Given: A camera answering without data, and one failing every command
    let silent = ScriptedCamera::silent();

    // When: Querying both
    let from_silent = query_camera_state(&silent).await;
    let from_unreachable = query_camera_state(&UnreachableCamera).await;

    // Then: Autofocus on, auto exposure, positions at 8
    for state in [from_silent, from_unreachable] {
        assert!(state.auto_focus);
        assert_eq!(state.exposure_mode, ExposureMode::Auto);
        assert_eq!((state.iris, state.shutter, state.gain, state.brightness), (8, 8, 8, 8));
        assert_eq!((state.focus, state.zoom), (8, 8));
    }
}

/// WHAT: A failed set command aborts apply with that error
/// WHY: Later steps depend on earlier ones taking effect
#[tokio::test(start_paused = true)]
async fn given_unreachable_camera_when_applying_then_error() {
    let patch = CameraStatePatch {
        iris: Some(3),
        ..CameraStatePatch::default()
    };

    let result = apply_camera_state(&UnreachableCamera, &patch).await;

    assert!(matches!(result, Err(RecorderError::ViscaFailed { .. })));
}

/// WHAT: Saving then loading a preset restores the saved camera state
/// WHY: Presets let an operator return to a known framing
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_saved_preset_when_loading_then_state_applied() {
    // Given: A client and a camera whose zoom follows commands
    let state = Arc::new(AppState::new(&StoredSettings::default(), ViscaTarget::default()));
    let client = RecorderClient::new(Arc::new(RecorderBus::new()), Arc::clone(&state));
    let camera = ScriptedCamera::new(0x2000, true);

    // When: Saving slot 1, then loading slot 1 and an empty slot 2
    let saved = client.save_preset(&camera, 1).await;
    let loaded = client.load_preset(&camera, 1).await.unwrap();
    let missing = client.load_preset(&camera, 2).await.unwrap();

    // Then: The preset round-trips and the empty slot is a no-op
    assert_eq!(state.preset(1), Some(saved));
    assert_eq!(loaded, Some(ZoomSettle::Settled { position: 0x2000 }));
    assert_eq!(missing, None);
    assert_eq!(state.camera_state.get(), saved);
    assert!(camera.sent().contains(&ViscaCommand::SetZoom(0x2000)));
}
