use crate::{AppCommand, AppResult, config::Config};

use finish_recorder_core::{
    RecorderClient,
    recorder::{RecorderResponse, SettingsPatch},
    timestamp::{convert_timestamp_to_string, frame_timestamp},
    visca::{ViscaCommand, ViscaController, ViscaReply, ViscaTransport, extract_visca_value},
};

use std::sync::Arc;

use serde_json::Value;
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, instrument, warn};

/// Main application state.
///
/// Polls the recorder for frames and status on fixed intervals and executes
/// console commands as they arrive. Frame grabs and camera commands run in
/// their own tasks so neither a slow grab nor a zoom settle delays the next
/// poll.
pub struct App {
    pub(crate) client: Arc<RecorderClient>,
    pub(crate) visca: ViscaController,
    pub(crate) config: Config,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the main application event loop.
    ///
    /// Returns the configuration with the current settings folded in, ready
    /// to be saved.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<Config> {
        info!("Finish-Recorder starting");

        let mut frame_tick = interval(self.config.poll.frame_interval());
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut status_tick = interval(self.config.poll.status_interval());
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut camera_tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = frame_tick.tick() => {
                    let client = Arc::clone(&self.client);
                    tokio::spawn(async move {
                        client.request_video_frame().await;
                    });
                }

                _ = status_tick.tick() => {
                    let status = self.client.query_recording_status().await;
                    let error = status.recording_status().map(|s| s.error.as_str()).unwrap_or_default();
                    if !error.is_empty() {
                        warn!(error, "Recorder reports error");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    if is_camera_command(&cmd) {
                        let client = Arc::clone(&self.client);
                        let visca = self.visca.clone();
                        camera_tasks.spawn(async move {
                            if let Err(e) = run_camera_command(&client, &visca, cmd).await {
                                error!(error = ?e, "Camera command failed");
                            }
                        });
                    } else if let Err(e) = self.handle_command(cmd).await {
                        error!(error = ?e, "Command failed");
                    }
                }

                Some(joined) = camera_tasks.join_next() => {
                    if let Err(e) = joined {
                        error!(error = ?e, "Camera command task failed");
                    }
                }

                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = ?e, "Failed to listen for ctrl-c");
                    }
                    info!("Interrupt received, shutting down");
                    break;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        if !camera_tasks.is_empty() {
            warn!(pending = camera_tasks.len(), "Abandoning camera commands in flight");
            camera_tasks.abort_all();
        }

        if self.client.state().is_recording.get() {
            let response = self.client.stop_recording().await;
            report("stop", &response);
        }

        self.config.settings = self.client.state().to_settings();

        let _ = self.shutdown_tx.send(true);
        info!("Finish-Recorder shut down successfully");

        Ok(self.config)
    }

    #[instrument(skip(self))]
    async fn handle_command(&self, cmd: AppCommand) -> AppResult<()> {
        let state = self.client.state();

        match cmd {
            AppCommand::StartRecording => {
                let response = self.client.start_recording().await;
                report("start", &response);
            }
            AppCommand::StopRecording => {
                let response = self.client.stop_recording().await;
                report("stop", &response);
            }
            AppCommand::Status => {
                let response = self.client.query_recording_status().await;
                match response.recording_status() {
                    Some(status) => println!(
                        "recording={} duration={}s file={} {}x{} @ {:.2} fps backlog={}",
                        status.recording,
                        status.recording_duration,
                        status.frame_processor.filename,
                        status.frame_processor.width,
                        status.frame_processor.height,
                        status.frame_processor.fps,
                        status.frame_processor.frame_backlog,
                    ),
                    None => report("status", &response),
                }
            }
            AppCommand::Cameras => {
                let response = self.client.query_camera_list().await;
                match response.cameras() {
                    Some([]) => println!("no cameras found"),
                    Some(cameras) => {
                        for camera in cameras {
                            println!("{} ({})", camera.name, camera.address);
                        }
                    }
                    None => report("cameras", &response),
                }
            }
            AppCommand::Log => {
                let response = self.client.query_recording_log().await;
                match response.log() {
                    Some(entries) => {
                        for entry in entries {
                            println!(
                                "{} [{}] {}",
                                convert_timestamp_to_string(entry.ts_milli as i64, None),
                                entry.subsystem,
                                entry.message
                            );
                        }
                    }
                    None => report("log", &response),
                }
            }
            AppCommand::Frame => {
                let frame = state.frame_grab.get();
                match frame_timestamp(&frame.data, frame.width as usize) {
                    Some(ts) => println!(
                        "{}x{} frame at {}",
                        frame.width,
                        frame.height,
                        convert_timestamp_to_string(ts as i64, None)
                    ),
                    None => println!("{}x{} frame without timestamp", frame.width, frame.height),
                }
            }
            AppCommand::SelectWaypoint { name } => {
                state.waypoint.set(name.clone());
                let mut patch = SettingsPatch::new();
                patch.insert("waypoint".to_string(), Value::String(name));
                let response = self.client.update_settings(patch).await;
                report("waypoint", &response);
            }
            AppCommand::Shutdown
            | AppCommand::Visca(_)
            | AppCommand::CameraState
            | AppCommand::SavePreset { .. }
            | AppCommand::LoadPreset { .. } => {
                debug!("Command handled by the event loop");
            }
        }

        Ok(())
    }
}

fn is_camera_command(cmd: &AppCommand) -> bool {
    matches!(
        cmd,
        AppCommand::Visca(_)
            | AppCommand::CameraState
            | AppCommand::SavePreset { .. }
            | AppCommand::LoadPreset { .. }
    )
}

/// Execute a command that talks to the camera.
///
/// These wait on VISCA replies and zoom settling, so the event loop runs them
/// in their own tasks.
#[instrument(skip(client, visca))]
async fn run_camera_command(
    client: &RecorderClient,
    visca: &ViscaController,
    cmd: AppCommand,
) -> AppResult<()> {
    match cmd {
        AppCommand::Visca(cmd) => {
            let reply = visca.send(cmd).await?;
            println!("{}", describe_visca_reply(cmd, &reply));
        }
        AppCommand::CameraState => {
            let camera = client.refresh_camera_state(visca).await;
            println!("{:?}", camera);
        }
        AppCommand::SavePreset { slot } => {
            let camera = client.save_preset(visca, slot).await;
            println!("preset {} saved: {:?}", slot, camera);
        }
        AppCommand::LoadPreset { slot } => match client.load_preset(visca, slot).await? {
            Some(settle) => println!("preset {} loaded: {:?}", slot, settle),
            None => println!("preset {} is empty", slot),
        },
        other => debug!(cmd = ?other, "Not a camera command"),
    }

    Ok(())
}

/// One-line console rendering of a VISCA reply, decoding inquiry values at
/// the width the inquiry carries.
pub(crate) fn describe_visca_reply(cmd: ViscaCommand, reply: &ViscaReply) -> String {
    match cmd.reply_width() {
        Some(width) => format!(
            "{} -> {:?} value={}",
            cmd,
            reply.status,
            extract_visca_value(reply.bytes(), width, 0)
        ),
        None => format!("{} -> {:?}", cmd, reply.status),
    }
}

fn report(op: &str, response: &RecorderResponse) {
    if response.is_ok() {
        println!("{}: OK", op);
    } else {
        let error = response.error.as_deref().unwrap_or("unknown error");
        warn!(op, error, "Recorder request failed");
        println!("{}: Fail ({})", op, error);
    }
}
