use crate::{
    CoreResult,
    msgbus::MessageBus,
    recorder::{NativeMessage, RecorderMessage, RecorderResponse},
};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

/// Bus destination served by the recorder.
pub const RECORDER_DESTINATION: &str = "recorder";

/// Bus carrying recorder operations.
pub type RecorderBus = MessageBus<RecorderMessage, RecorderResponse>;

/// Sender half of the recorder push channel.
pub type PushSender = mpsc::UnboundedSender<NativeMessage>;

/// Receiver half of the recorder push channel.
pub type PushReceiver = mpsc::UnboundedReceiver<NativeMessage>;

/// Create the out-of-band channel the recorder pushes [`NativeMessage`]s on.
pub fn push_channel() -> (PushSender, PushReceiver) {
    mpsc::unbounded_channel()
}

/// The recorder collaborator.
///
/// Calls are synchronous and return immediately; long-running work (VISCA
/// exchanges, recording) reports back through the push channel the backend
/// was constructed with.
pub trait RecorderBackend: Send + Sync {
    /// Handle one operation.
    fn handle(&self, message: RecorderMessage) -> CoreResult<RecorderResponse>;
}

/// Register `backend` as the [`RECORDER_DESTINATION`] handler on `bus`.
///
/// Returns `true` when it replaced a previous recorder handler.
pub async fn register_recorder<B>(bus: &RecorderBus, backend: Arc<B>) -> bool
where
    B: RecorderBackend + 'static,
{
    bus.register(RECORDER_DESTINATION, move |_dest, message: RecorderMessage| {
        let backend = Arc::clone(&backend);
        async move {
            debug!(op = message.op(), "Recorder request");
            backend.handle(message)
        }
    })
    .await
}
