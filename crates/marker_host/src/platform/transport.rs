use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use marker_engine::TransportError;
use marker_logging::marker_debug;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::frame::{Outbound, Reply};

/// Outbound frame queue plus the table of host-initiated calls waiting for
/// a `reply` frame.
pub struct Transport {
    outbound: mpsc::UnboundedSender<Outbound>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Reply>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    timeout: Duration,
}

impl Transport {
    pub fn new(outbound: mpsc::UnboundedSender<Outbound>, timeout: Duration) -> Self {
        Self {
            outbound,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            timeout,
        }
    }

    /// Queue a frame that expects no reply.
    pub fn send(&self, frame: Outbound) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Unreachable("output closed".into()))
    }

    /// Queue the frame built for a fresh id and wait for its reply.
    /// A reply with `ok: false` and a missing reply both count as unreachable.
    pub async fn call<F>(&self, build: F) -> Result<Value, TransportError>
    where
        F: FnOnce(u64) -> Outbound,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("browser disconnected".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);

        if let Err(err) = self.send(build(id)) {
            self.lock_pending().remove(&id);
            return Err(err);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) if reply.ok => Ok(reply.value),
            Ok(Ok(reply)) => Err(TransportError::Unreachable(
                reply.error.unwrap_or_else(|| "receiver refused".into()),
            )),
            Ok(Err(_)) => Err(TransportError::Unreachable("browser disconnected".into())),
            Err(_) => {
                self.lock_pending().remove(&id);
                Err(TransportError::Timeout(self.timeout.as_millis() as u64))
            }
        }
    }

    /// Hand a reply to the call waiting for it. Returns `false` when no call
    /// is waiting, e.g. because it already timed out.
    pub fn resolve(&self, reply: Reply) -> bool {
        let Some(waiting) = self.lock_pending().remove(&reply.id) else {
            marker_debug!("reply {} has no pending call", reply.id);
            return false;
        };
        waiting.send(reply).is_ok()
    }

    /// Fail every pending call and refuse new ones.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let dropped = self.lock_pending().drain().count();
        if dropped > 0 {
            marker_debug!("dropping {dropped} pending calls");
        }
    }

    pub fn pending(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<Reply>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
