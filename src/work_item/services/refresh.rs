//! Refresh signal shared by the workflow engine and the board tree.

use std::sync::Arc;
use tokio::sync::watch;

/// Generation counter that invalidates every cached read-path result.
///
/// Each [`RefreshSignal::trigger`] bumps the generation. Caches remember the
/// generation they were filled in and discard themselves when it moves on;
/// hosts can [`RefreshSignal::subscribe`] to redraw.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    sender: Arc<watch::Sender<u64>>,
}

impl RefreshSignal {
    /// Creates a signal at generation zero.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Invalidates all cached read-path results.
    pub fn trigger(&self) {
        self.sender
            .send_modify(|generation| *generation = generation.wrapping_add(1));
        tracing::debug!(generation = self.generation(), "refresh triggered");
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.sender.borrow()
    }

    /// Returns a receiver notified on every trigger.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}
