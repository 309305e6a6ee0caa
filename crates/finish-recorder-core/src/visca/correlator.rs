use crate::recorder::ViscaResult;

use std::collections::HashMap;

use tokio::sync::{Mutex, oneshot};
use tracing::{debug, trace};
use uuid::Uuid;

/// Pending table bridging pushed `visca-result` messages back to their callers.
///
/// Each in-flight request owns one id mapped to one completion handle. An
/// entry leaves the table when it is resolved or cancelled; resolving an id
/// that is not pending does nothing.
#[derive(Default)]
pub struct ViscaCorrelator {
    pending: Mutex<HashMap<String, oneshot::Sender<ViscaResult>>>,
}

impl ViscaCorrelator {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and the receiver its result will arrive on.
    pub async fn register(&self) -> (String, oneshot::Receiver<ViscaResult>) {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock().await;

        let mut id = Uuid::new_v4().simple().to_string();
        while pending.contains_key(&id) {
            id = Uuid::new_v4().simple().to_string();
        }
        pending.insert(id.clone(), tx);
        trace!(id = %id, in_flight = pending.len(), "VISCA request registered");

        (id, rx)
    }

    /// Deliver `result` to the caller waiting on `result.id`.
    ///
    /// Returns `true` if a caller was waiting. Unknown ids are ignored.
    pub async fn resolve(&self, result: ViscaResult) -> bool {
        let Some(tx) = self.pending.lock().await.remove(&result.id) else {
            debug!(id = %result.id, "VISCA result for unknown id dropped");
            return false;
        };
        // The caller may have stopped waiting; the entry is gone either way.
        tx.send(result).is_ok()
    }

    /// Drop the entry for `id` without resolving it.
    pub async fn cancel(&self, id: &str) -> bool {
        self.pending.lock().await.remove(id).is_some()
    }

    /// Number of requests still waiting for a result.
    pub async fn in_flight(&self) -> usize {
        self.pending.lock().await.len()
    }
}
