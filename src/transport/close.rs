use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Explicit-close flag shared by a transport handle and its task.
#[derive(Clone, Default)]
pub(crate) struct CloseSignal {
    closed: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CloseSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `true` on the first call only.
    pub(crate) fn signal(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::SeqCst);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait(&self) {
        // Register before checking the flag so a concurrent signal() is not
        // lost between the check and the await.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_closed() {
            return;
        }
        notified.await;
    }
}
