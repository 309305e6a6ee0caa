use crate::{
    AppState, CoreResult, RecorderClient, RecorderError,
    msgbus::FailureKind,
    recorder::{
        FrameGrab, JsonRecorder, NativeMessage, NullRecorder, PushReceiver, RecorderBackend,
        RecorderBus, RecorderMessage, RecorderResponse, RecordingLogEntry, ResponsePayload,
        Status, ViscaCmdProps, ViscaResult, ViscaResultStatus, push_channel, register_recorder,
    },
    settings::StoredSettings,
    visca::{ViscaCommand, ViscaTarget, build_packet},
};

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use serde_json::{Value, json};

fn new_state() -> Arc<AppState> {
    Arc::new(AppState::new(&StoredSettings::default(), ViscaTarget::default()))
}

async fn client_with<B: RecorderBackend + 'static>(backend: B) -> Arc<RecorderClient> {
    let bus = Arc::new(RecorderBus::new());
    register_recorder(&bus, Arc::new(backend)).await;
    Arc::new(RecorderClient::new(bus, new_state()))
}

async fn null_client() -> (Arc<RecorderClient>, PushReceiver) {
    let (push_tx, push_rx) = push_channel();
    (client_with(NullRecorder::new(push_tx)).await, push_rx)
}

/// Serves one good frame, then fails every grab.
struct FlakyFrames {
    grabs: AtomicUsize,
    frame: Arc<FrameGrab>,
}

impl RecorderBackend for FlakyFrames {
    fn handle(&self, message: RecorderMessage) -> CoreResult<RecorderResponse> {
        Ok(match message {
            RecorderMessage::GrabFrame if self.grabs.fetch_add(1, Ordering::SeqCst) == 0 => {
                RecorderResponse::ok_with(ResponsePayload::Frame(Arc::clone(&self.frame)))
            }
            RecorderMessage::GrabFrame => RecorderResponse::fail("no frame"),
            _ => RecorderResponse::ok(),
        })
    }
}

/// Accepts everything and never pushes anything back.
#[derive(Default)]
struct SilentRecorder {
    requests: Mutex<Vec<RecorderMessage>>,
}

impl RecorderBackend for SilentRecorder {
    fn handle(&self, message: RecorderMessage) -> CoreResult<RecorderResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(message);
        }
        Ok(RecorderResponse::ok())
    }
}

/// WHAT: Stopping twice in a row succeeds both times
/// WHY: Stop must be safe to call regardless of recorder state
#[tokio::test]
async fn given_stopped_recorder_when_stopping_twice_then_both_ok() {
    // Given: A client over the null recorder that never started
    let (client, _push_rx) = null_client().await;

    // When: Stopping twice
    let first = client.stop_recording().await;
    let second = client.stop_recording().await;

    // Then: Both responses are OK and state says not recording
    assert_eq!(first.status, Status::Ok);
    assert_eq!(second.status, Status::Ok);
    assert!(!client.state().is_recording.get());
}

/// WHAT: A failed grab keeps the previously stored frame
/// WHY: The preview must not blank out on a transient failure
#[tokio::test]
async fn given_successful_grab_when_next_grab_fails_then_previous_frame_kept() {
    // Given: A backend serving one frame and then failures
    let frame = Arc::new(FrameGrab::new(vec![7; 2 * 2 * 4], 2, 2, 42));
    let client = client_with(FlakyFrames {
        grabs: AtomicUsize::new(0),
        frame: Arc::clone(&frame),
    })
    .await;

    // When: Grabbing a good frame and then a failing one
    let ok = client.request_video_frame().await;
    let failed = client.request_video_frame().await;

    // Then: The stored frame is still the successful one
    assert!(ok.is_ok());
    assert_eq!(failed.status, Status::Fail);
    assert_eq!(failed.failure, Some(FailureKind::Recorder));
    assert_eq!(*client.state().frame_grab.get(), *frame);
}

/// WHAT: Starting a recording stamps stored props, guide and flags onto the request
/// WHY: The recorder only sees what the client sends; nothing may be dropped
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stored_props_when_starting_then_request_carries_them() {
    // Given: A backend that records requests and state with a custom guide
    let backend = Arc::new(SilentRecorder::default());
    let bus = Arc::new(RecorderBus::new());
    register_recorder(&bus, Arc::clone(&backend)).await;
    let state = new_state();
    state.guide.update(|g| g.pt1 = 12.5);
    state.add_time_overlay.set(true);
    state.recording_props_pending.set(true);
    let client = RecorderClient::new(bus, Arc::clone(&state));

    // When: Starting
    let response = client.start_recording().await;

    // Then: The request carries defaults plus stamped fields, and state updated
    assert!(response.is_ok());
    let requests = backend.requests.lock().unwrap();
    let Some(RecorderMessage::StartRecording(props)) = requests.first() else {
        unreachable!("expected start-recording, got {:?}", requests.first());
    };
    assert_eq!(props.recording.recording_prefix, "CT_");
    assert_eq!(props.recording.recording_duration, 120);
    assert_eq!(props.guide.pt1, 12.5);
    assert!(props.add_time_overlay);
    assert!(state.is_recording.get());
    assert!(!state.recording_props_pending.get());
    assert!(state.recording_start_time.get() > 0);
}

/// WHAT: Status after start reports the running null session
/// WHY: Status polling drives the recording indicator
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_started_null_recorder_when_querying_status_then_recording_reported() {
    // Given: A started null recorder
    let (client, _push_rx) = null_client().await;
    client.start_recording().await;

    // When: Querying status
    let response = client.query_recording_status().await;

    // Then: Status is recording and published to state
    let status = response.recording_status().cloned().unwrap();
    assert!(status.recording);
    assert_eq!(status.frame_processor.filename, "./CT_null.mp4");
    assert_eq!(client.state().recording_status.get(), status);
}

/// WHAT: An OK status response without data yields the default status
/// WHY: Callers always get a complete status shape on success
#[tokio::test]
async fn given_ok_without_payload_when_querying_status_then_default_status() {
    // Given: A backend answering OK with no payload
    let client = client_with(SilentRecorder::default()).await;

    // When: Querying status
    let response = client.query_recording_status().await;

    // Then: Default status is substituted
    assert_eq!(response.recording_status(), Some(&Default::default()));
}

/// WHAT: A partial JSON status merges over the defaults field by field
/// WHY: The collaborator omits fields freely; missing ones must read as defaults
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_partial_json_status_when_querying_then_merged_over_defaults() {
    // Given: A JSON recorder that returns a sparse status object
    let (push_tx, _push_rx) = push_channel();
    let endpoint = |_request: Value| -> Result<Value, String> {
        Ok(json!({
            "status": "OK",
            "recording": true,
            "frameProcessor": { "fps": 29.97 }
        }))
    };
    let client = client_with(JsonRecorder::new(endpoint, push_tx)).await;

    // When: Querying status
    let response = client.query_recording_status().await;

    // Then: Present fields are kept, absent ones default
    let status = response.recording_status().unwrap();
    assert!(status.recording);
    assert_eq!(status.recording_duration, 0);
    assert_eq!(status.error, "");
    assert_eq!(status.frame_processor.fps, 29.97);
    assert_eq!(status.frame_processor.filename, "");
}

/// WHAT: Requests reach a JSON recorder as `{op, props}` objects
/// WHY: The collaborator dispatches on `op` and reads camelCase props
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_json_recorder_when_starting_then_request_is_op_and_props() {
    // Given: A JSON recorder capturing its last request
    let (push_tx, _push_rx) = push_channel();
    let seen = Arc::new(Mutex::new(Value::Null));
    let captured = Arc::clone(&seen);
    let endpoint = move |request: Value| -> Result<Value, String> {
        if let Ok(mut slot) = captured.lock() {
            *slot = request;
        }
        Ok(json!({ "status": "OK" }))
    };
    let client = client_with(JsonRecorder::new(endpoint, push_tx)).await;

    // When: Starting a recording
    client.start_recording().await;

    // Then: The request is tagged and flattened
    let request = seen.lock().unwrap().clone();
    assert_eq!(request["op"], "start-recording");
    assert_eq!(request["props"]["recordingFolder"], "./");
    assert_eq!(request["props"]["cropArea"]["width"], 1.0);
    assert_eq!(request["props"]["reportAllGaps"], false);
}

/// WHAT: A `Fail` envelope surfaces as a Recorder failure with its message
/// WHY: Collaborator failures are data, not errors
#[tokio::test]
async fn given_fail_envelope_when_listing_cameras_then_recorder_failure() {
    // Given: A JSON recorder reporting failure
    let (push_tx, _push_rx) = push_channel();
    let endpoint = |_request: Value| -> Result<Value, String> {
        Ok(json!({ "status": "Fail", "error": "NDI not available" }))
    };
    let client = client_with(JsonRecorder::new(endpoint, push_tx)).await;

    // When: Listing cameras
    let response = client.query_camera_list().await;

    // Then: The failure carries the collaborator's error
    assert_eq!(response.status, Status::Fail);
    assert_eq!(response.error.as_deref(), Some("NDI not available"));
    assert_eq!(response.failure, Some(FailureKind::Recorder));
}

/// WHAT: A frame whose byte count does not match its size is a handler failure
/// WHY: A truncated buffer must never replace the preview frame
#[tokio::test]
async fn given_truncated_frame_when_grabbing_then_handler_failure_and_frame_kept() {
    // Given: A JSON recorder returning 3 bytes for a 2x2 frame
    let (push_tx, _push_rx) = push_channel();
    let endpoint = |_request: Value| -> Result<Value, String> {
        Ok(json!({ "status": "OK", "data": [1, 2, 3], "width": 2, "height": 2 }))
    };
    let client = client_with(JsonRecorder::new(endpoint, push_tx)).await;
    let before = client.state().frame_grab.get();

    // When: Grabbing a frame
    let response = client.request_video_frame().await;

    // Then: The bus reports a handler failure and the frame is unchanged
    assert_eq!(response.failure, Some(FailureKind::HandlerFailure));
    assert!(Arc::ptr_eq(&before, &client.state().frame_grab.get()));
}

/// WHAT: The null recorder's frames carry the current time in row 0
/// WHY: The overlay decoder needs a real timestamp even without a camera
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_null_recorder_when_grabbing_then_frame_timestamp_decodes() {
    // Given: A null recorder client
    let (client, _push_rx) = null_client().await;

    // When: Grabbing a frame
    let response = client.request_video_frame().await;

    // Then: Row 0 decodes to the frame's own timestamp
    let frame = response.frame().unwrap();
    let decoded = crate::timestamp::frame_timestamp(&frame.data, frame.width as usize);
    assert_eq!(decoded, Some(frame.ts_milli));
    assert_eq!(frame.total_bytes, frame.data.len());
}

/// WHAT: A VISCA command through the null recorder resolves as NotConnected
/// WHY: The pushed result must find its way back to the waiting caller
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_null_recorder_when_sending_visca_then_not_connected_result() {
    // Given: A null recorder client with its push listener running
    let (client, push_rx) = null_client().await;
    let _listener = client.spawn_push_listener(push_rx);

    // When: Sending a VISCA packet
    let reply = client
        .send_visca_to_device("10.0.1.188", 52381, build_packet(&ViscaCommand::FocusIn))
        .await
        .unwrap();

    // Then: The reply is resolved and the table is empty
    assert_eq!(reply.status, ViscaResultStatus::NotConnected);
    assert_eq!(reply.data, None);
    assert_eq!(client.correlator().in_flight().await, 0);
}

/// WHAT: A VISCA request with no pushed result times out and is removed
/// WHY: Unanswered ids must not leak in the pending table
#[tokio::test(start_paused = true)]
async fn given_no_visca_result_when_waiting_then_timeout_and_entry_removed() {
    // Given: A recorder that never pushes results and a short reply timeout
    let bus = Arc::new(RecorderBus::new());
    register_recorder(&bus, Arc::new(SilentRecorder::default())).await;
    let client = RecorderClient::new(bus, new_state())
        .with_visca_reply_timeout(Duration::from_millis(500));

    // When: Sending a VISCA packet
    let result = client
        .send_visca_to_device("10.0.1.188", 52381, build_packet(&ViscaCommand::ZoomValue))
        .await;

    // Then: Timeout error and no pending entry left
    assert!(matches!(result, Err(RecorderError::Timeout { waited_ms: 500, .. })));
    assert_eq!(client.correlator().in_flight().await, 0);
}

/// WHAT: A rejected VISCA send fails and clears its pending entry
/// WHY: Send failures must not leave ids waiting forever
#[tokio::test]
async fn given_rejected_visca_packet_when_sending_then_visca_failed_and_entry_removed() {
    // Given: A null recorder, which rejects packets without the 0x81 header
    let (client, _push_rx) = null_client().await;

    // When: Sending a malformed packet
    let result = client.send_visca_to_device("10.0.1.188", 52381, vec![0x00, 0xff]).await;

    // Then: ViscaFailed and the table is empty
    assert!(matches!(result, Err(RecorderError::ViscaFailed { .. })));
    assert_eq!(client.correlator().in_flight().await, 0);
}

/// WHAT: Resolving an id nobody is waiting for does nothing
/// WHY: Late or duplicate results must be harmless
#[tokio::test]
async fn given_unknown_id_when_resolving_then_no_op() {
    // Given: A client with one pending request
    let (client, _push_rx) = null_client().await;
    let (_id, _rx) = client.correlator().register().await;

    // When: A result arrives for a different id
    let resolved = client
        .correlator()
        .resolve(ViscaResult {
            id: "not-pending".to_string(),
            status: ViscaResultStatus::Ok,
            data: None,
        })
        .await;

    // Then: Nothing was resolved and the real entry is still pending
    assert!(!resolved);
    assert_eq!(client.correlator().in_flight().await, 1);
}

/// WHAT: Pushed visca-result JSON decodes its numeric status
/// WHY: The collaborator sends the status as the enum ordinal
#[test]
fn given_visca_result_json_when_decoding_then_status_and_data_read() {
    // Given: A visca-result push
    let value = json!({
        "sender": "visca-result",
        "content": { "id": "abc", "status": 1, "data": [144, 80, 2, 255] }
    });

    // When: Decoding
    let message = NativeMessage::from_json(value);

    // Then: The status ordinal maps to NotConnected
    assert_eq!(
        message,
        NativeMessage::ViscaResult(ViscaResult {
            id: "abc".to_string(),
            status: ViscaResultStatus::NotConnected,
            data: Some(vec![0x90, 0x50, 0x02, 0xff]),
        })
    );
}

/// WHAT: Unknown push senders decode as Unhandled and change no state
/// WHY: Protocol drift must be logged and dropped, not crash the dispatcher
#[tokio::test]
async fn given_unknown_sender_when_dispatching_then_dropped() {
    // Given: A client and a push from an unknown sender
    let (client, _push_rx) = null_client().await;
    let message = NativeMessage::from_json(json!({ "sender": "mystery", "content": { "x": 1 } }));

    // When: Dispatching it
    assert_eq!(message.sender(), "mystery");
    client.handle_native_message(message).await;

    // Then: Nothing changed
    assert!(client.state().system_log.get().is_empty());
    assert_eq!(client.state().logger_alert.get(), 0);
    assert!(client.state().waypoint_list.get().is_empty());
}

/// WHAT: Error sysevents raise the logger alert, others only append
/// WHY: The alert badge counts errors, not every event
#[tokio::test]
async fn given_sysevents_when_dispatching_then_log_appended_and_errors_counted() {
    // Given: A client
    let (client, _push_rx) = null_client().await;
    let event = |message: &str| {
        NativeMessage::SysEvent(RecordingLogEntry {
            ts_milli: 1,
            subsystem: "Recorder".to_string(),
            message: message.to_string(),
        })
    };

    // When: Dispatching an info event and an error event
    client.handle_native_message(event("Camera found")).await;
    client.handle_native_message(event("Error: disk full")).await;

    // Then: Both are logged, one alert raised
    assert_eq!(client.state().system_log.get().len(), 2);
    assert_eq!(client.state().logger_alert.get(), 1);
}

/// WHAT: mcast pushes add waypoints in numeric-aware order
/// WHY: Waypoint pickers list `Finish2` before `Finish10`
#[tokio::test]
async fn given_mcast_pushes_when_dispatching_then_waypoints_sorted_without_duplicates() {
    // Given: A client
    let (client, _push_rx) = null_client().await;

    // When: Dispatching waypoint announcements, one duplicate and one other command
    for (cmd, wp) in [
        ("split-video", "Finish10"),
        ("info", "finish2"),
        ("split-video", "Finish10"),
        ("ping", "Ignored"),
        ("info", "Start"),
    ] {
        let message = NativeMessage::from_json(json!({
            "sender": "mcast",
            "content": { "cmd": cmd, "wp": wp }
        }));
        client.handle_native_message(message).await;
    }

    // Then: Known commands added once each, in natural order
    assert_eq!(
        client.state().waypoint_list.get(),
        vec!["finish2".to_string(), "Finish10".to_string(), "Start".to_string()]
    );
}

/// WHAT: guide-config and visca-state pushes update state
/// WHY: The recorder can reconfigure the guide and report camera connection
#[tokio::test]
async fn given_guide_and_state_pushes_when_dispatching_then_state_updated() {
    // Given: A client
    let (client, _push_rx) = null_client().await;

    // When: Dispatching guide-config and visca-state
    client
        .handle_native_message(NativeMessage::from_json(json!({
            "sender": "guide-config",
            "content": { "pt1": 3.0, "pt2": -4.0 }
        })))
        .await;
    client
        .handle_native_message(NativeMessage::from_json(json!({
            "sender": "visca-state",
            "content": { "state": "Connected" }
        })))
        .await;

    // Then: Guide and VISCA state reflect the pushes
    let guide = client.state().guide.get();
    assert_eq!((guide.pt1, guide.pt2), (3.0, -4.0));
    assert_eq!(client.state().visca_state.get(), "Connected");
}

/// WHAT: Settings patches reach the recorder
/// WHY: Setting changes must be forwarded, not just stored locally
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_settings_patch_when_updating_then_recorder_stores_it() {
    // Given: A null recorder held directly
    let (push_tx, _push_rx) = push_channel();
    let recorder = Arc::new(NullRecorder::new(push_tx));
    let bus = Arc::new(RecorderBus::new());
    register_recorder(&bus, Arc::clone(&recorder)).await;
    let client = RecorderClient::new(bus, new_state());

    // When: Sending a settings patch
    let mut patch = serde_json::Map::new();
    patch.insert("waypoint".to_string(), json!("Finish"));
    let response = client.update_settings(patch).await;

    // Then: OK, and the recorder holds the value
    assert!(response.is_ok());
    assert_eq!(recorder.settings().unwrap()["waypoint"], "Finish");
}

/// WHAT: The recording log reflects start and stop events
/// WHY: The log view reads back what the recorder did
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_start_and_stop_when_fetching_log_then_both_events_listed() {
    // Given: A null recorder started and stopped
    let (client, _push_rx) = null_client().await;
    client.start_recording().await;
    client.stop_recording().await;

    // When: Fetching the log
    let response = client.query_recording_log().await;

    // Then: Two entries from the null recorder
    let log = response.log().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].message.starts_with("Recording started"));
    assert!(log[1].message.starts_with("Recording stopped"));
}

/// WHAT: The null recorder answers VISCA even after the push listener is gone
/// WHY: During shutdown the push channel closes before the last commands finish
#[test]
#[allow(clippy::unwrap_used)]
fn given_closed_push_channel_when_sending_visca_then_still_acknowledged() {
    // Given: A null recorder whose push receiver was dropped
    let (push_tx, push_rx) = push_channel();
    let recorder = NullRecorder::new(push_tx);
    drop(push_rx);

    // When: Sending a VISCA command
    let response = recorder
        .handle(RecorderMessage::SendViscaCmd(ViscaCmdProps {
            id: "abc".to_string(),
            ip: "10.0.1.188".to_string(),
            port: 52381,
            data: build_packet(&ViscaCommand::ZoomValue),
        }))
        .unwrap();

    // Then: The command is acknowledged
    assert!(response.is_ok());
}
