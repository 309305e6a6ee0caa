use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Recorder protocol errors with source location tracking.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// No handler is registered for the bus destination.
    #[error("No subscriber for destination: {destination} {location}")]
    NoSubscriber {
        /// Destination the message was addressed to.
        destination: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A bus handler or recorder backend failed.
    #[error("Handler failed: {reason} {location}")]
    HandlerFailure {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A VISCA command name or value has no entry in the command table.
    #[error("Unsupported VISCA command: {command} {location}")]
    UnsupportedCommand {
        /// The command text that could not be mapped.
        command: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The VISCA exchange could not be sent or was rejected.
    #[error("VISCA command failed: {reason} {location}")]
    ViscaFailed {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No reply arrived within the allotted time.
    #[error("Timed out waiting for {operation} after {waited_ms}ms {location}")]
    Timeout {
        /// Operation that timed out.
        operation: String,
        /// How long the caller waited.
        waited_ms: u128,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recorder collaborator returned data that does not fit the protocol.
    #[error("Protocol error: {reason} {location}")]
    Protocol {
        /// Description of the mismatch.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// JSON conversion at the collaborator boundary failed.
    #[error("JSON error: {source} {location}")]
    Json {
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for RecorderError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        RecorderError::Json {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = StdResult<T, RecorderError>;
