use crate::{
    CoreResult,
    msgbus::{BusResponse, FailureKind},
};

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};

/// Boxed future returned by a bus handler.
pub type HandlerFuture<R> = Pin<Box<dyn Future<Output = CoreResult<R>> + Send>>;

/// A registered destination handler. Receives the destination name and the message.
pub type Handler<M, R> = Arc<dyn Fn(String, M) -> HandlerFuture<R> + Send + Sync>;

/// Single-subscriber-per-destination request/response router.
///
/// # Contract
///
/// - At most one handler per destination. [`MessageBus::register`] replaces
///   any existing handler, so the last registration wins.
/// - [`MessageBus::send`] never fails at the language level. A missing
///   handler yields `R::failure(NoSubscriber, ..)`; a handler error or panic
///   yields `R::failure(HandlerFailure, ..)`.
/// - The bus holds no queue and enforces no mutual exclusion. Concurrent
///   sends run independently; serialization is up to the handler.
pub struct MessageBus<M, R> {
    subscribers: RwLock<HashMap<String, Handler<M, R>>>,
}

impl<M, R> MessageBus<M, R>
where
    M: Send + 'static,
    R: BusResponse,
{
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register `handler` for `destination`, replacing any previous handler.
    ///
    /// Returns `true` when an existing handler was replaced.
    pub async fn register<F, Fut>(&self, destination: impl Into<String>, handler: F) -> bool
    where
        F: Fn(String, M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CoreResult<R>> + Send + 'static,
    {
        let destination = destination.into();
        let handler: Handler<M, R> = Arc::new(move |dest, msg| Box::pin(handler(dest, msg)));

        let replaced = self
            .subscribers
            .write()
            .await
            .insert(destination.clone(), handler)
            .is_some();

        if replaced {
            debug!(destination = %destination, "Replaced bus subscriber");
        } else {
            debug!(destination = %destination, "Registered bus subscriber");
        }

        replaced
    }

    /// Remove the handler for `destination`. Returns `true` if one existed.
    pub async fn unregister(&self, destination: &str) -> bool {
        self.subscribers.write().await.remove(destination).is_some()
    }

    /// Whether a handler is registered for `destination`.
    pub async fn has_subscriber(&self, destination: &str) -> bool {
        self.subscribers.read().await.contains_key(destination)
    }

    /// Route `message` to the handler for `destination` and await its result.
    #[instrument(skip(self, message))]
    pub async fn send(&self, destination: &str, message: M) -> R {
        // Clone the handler out so the lock is not held across the await.
        let handler = self.subscribers.read().await.get(destination).cloned();

        let Some(handler) = handler else {
            warn!(destination = %destination, "No subscriber for destination");
            return R::failure(
                FailureKind::NoSubscriber,
                format!("No subscriber for destination: {}", destination),
            );
        };

        // Run the handler in its own task so a panic surfaces as a JoinError
        // instead of unwinding into the caller.
        match tokio::spawn(handler(destination.to_string(), message)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(destination = %destination, error = %e, "Bus handler failed");
                R::failure(FailureKind::HandlerFailure, e.to_string())
            }
            Err(e) => {
                error!(destination = %destination, error = ?e, "Bus handler panicked");
                R::failure(
                    FailureKind::HandlerFailure,
                    format!("Handler for {} aborted: {}", destination, e),
                )
            }
        }
    }
}

impl<M, R> Default for MessageBus<M, R>
where
    M: Send + 'static,
    R: BusResponse,
{
    fn default() -> Self {
        Self::new()
    }
}
