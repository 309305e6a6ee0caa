use serde::{Deserialize, Serialize};

/// Why a bus call produced a failure response instead of a handler result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// No handler registered for the destination.
    NoSubscriber,
    /// The handler returned an error or panicked.
    HandlerFailure,
    /// The collaborator behind the handler reported a failure status.
    Recorder,
}

/// Response types that can carry a bus-level failure.
///
/// The bus never returns `Err` to its callers. When routing or the handler
/// fails, it asks the response type to build its own failure value so every
/// caller sees one uniform success/failure shape.
pub trait BusResponse: Send + 'static {
    /// Build a failure response of the given kind.
    fn failure(kind: FailureKind, reason: String) -> Self;
}
