//! Finish Recorder Core Library
//!
//! Control core for a finish-line video recorder: an in-process message bus,
//! the recorder command protocol, VISCA camera control and frame timestamp
//! decoding.
//!
//! # Example
//!
//! ```no_run
//! use finish_recorder_core::{
//!     AppState, CoreResult, RecorderClient,
//!     recorder::{NullRecorder, RecorderBus, push_channel, register_recorder},
//!     settings::StoredSettings,
//!     visca::ViscaTarget,
//! };
//!
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let bus = Arc::new(RecorderBus::new());
//!     let (push_tx, push_rx) = push_channel();
//!     register_recorder(&bus, Arc::new(NullRecorder::new(push_tx))).await;
//!
//!     let state = Arc::new(AppState::new(&StoredSettings::default(), ViscaTarget::default()));
//!     let client = Arc::new(RecorderClient::new(bus, state));
//!     client.spawn_push_listener(push_rx);
//!
//!     client.start_recording().await;
//!     let status = client.query_recording_status().await;
//!     println!("Recording: {:?}", status.recording_status());
//!     client.stop_recording().await;
//!     Ok(())
//! }
//! ```

mod error;

/// Destination-addressed request/response routing.
pub mod msgbus;
/// Recorder command protocol, backends and the application-side client.
pub mod recorder;
/// Persisted settings.
pub mod settings;
/// Observable application state.
pub mod state;
/// Frame timestamp decoding and formatting.
pub mod timestamp;
/// VISCA camera control.
pub mod visca;

pub use {
    error::{RecorderError, Result as CoreResult},
    recorder::RecorderClient,
    state::{AppState, Observable},
};

#[cfg(test)]
mod tests;
