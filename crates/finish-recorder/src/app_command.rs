use crate::AppError;

use finish_recorder_core::visca::ViscaCommand;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Commands sent from the console handler to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start recording with the stored props.
    StartRecording,
    /// Stop recording.
    StopRecording,
    /// Show recorder status.
    Status,
    /// List cameras the recorder discovered.
    Cameras,
    /// Show the recorder event log.
    Log,
    /// Show the timestamp of the most recent frame.
    Frame,
    /// Send one VISCA command to the camera.
    Visca(ViscaCommand),
    /// Query and show the camera state.
    CameraState,
    /// Save the camera state into a preset slot.
    SavePreset {
        /// Preset slot.
        slot: u8,
    },
    /// Apply a saved preset slot to the camera.
    LoadPreset {
        /// Preset slot.
        slot: u8,
    },
    /// Select the waypoint this recorder serves.
    SelectWaypoint {
        /// Waypoint name.
        name: String,
    },
    /// Request application shutdown.
    Shutdown,
}

/// Console usage text.
pub const USAGE: &str = "commands: start | stop | status | cameras | log | frame | \
visca <CMD[=value]> | camera | preset save <n> | preset load <n> | waypoint <name> | quit";

impl FromStr for AppCommand {
    type Err = AppError;

    /// Parse one console line.
    #[track_caller]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let caller = Location::caller();
        let invalid = |reason: &str| AppError::InvalidCommand {
            input: line.to_string(),
            reason: reason.to_string(),
            location: ErrorLocation::from(caller),
        };

        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(invalid("empty command"));
        };
        let rest: Vec<&str> = words.collect();

        let cmd = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("start", []) => AppCommand::StartRecording,
            ("stop", []) => AppCommand::StopRecording,
            ("status", []) => AppCommand::Status,
            ("cameras", []) => AppCommand::Cameras,
            ("log", []) => AppCommand::Log,
            ("frame", []) => AppCommand::Frame,
            ("camera", []) => AppCommand::CameraState,
            ("quit" | "exit", []) => AppCommand::Shutdown,
            ("visca", [text]) => AppCommand::Visca(text.parse()?),
            ("preset", [action, slot]) => {
                let slot = slot
                    .parse()
                    .map_err(|_| invalid("preset slot must be 0-255"))?;
                match action.to_ascii_lowercase().as_str() {
                    "save" => AppCommand::SavePreset { slot },
                    "load" => AppCommand::LoadPreset { slot },
                    _ => return Err(invalid("expected 'preset save <n>' or 'preset load <n>'")),
                }
            }
            ("waypoint", [_, ..]) => AppCommand::SelectWaypoint {
                name: rest.join(" "),
            },
            _ => return Err(invalid(USAGE)),
        };

        Ok(cmd)
    }
}
