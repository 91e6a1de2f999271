//! Event-style signals
//!
//! Set/clear boolean events the dispatcher blocks on. Built on a watch
//! channel so waiters wake on change instead of polling a flag.

use tokio::sync::watch;

/// A clearable boolean event
#[derive(Debug)]
pub struct Signal {
    tx: watch::Sender<bool>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    pub fn clear(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal is set. Returns immediately if already set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so the channel cannot close.
        let _ = rx.wait_for(|set| *set).await;
    }

    /// Receiver for callers that need change notifications rather than
    /// level waits.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
