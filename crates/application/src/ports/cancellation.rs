//! Run cancellation primitives
//!
//! A watch-channel pair: the holder of the [`CancellationToken`] cancels,
//! every cloned [`CancellationReceiver`] observes it. Cancellation is
//! level-triggered; a receiver created or polled after the cancel still
//! resolves immediately.

use tokio::sync::watch;

/// Sender half; cancelling is idempotent.
#[derive(Debug)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    /// Signals cancellation to every receiver.
    pub fn cancel(&self) {
        // Receivers may all be gone already; that is not an error.
        let _ = self.sender.send(true);
    }
}

/// Receiver half; cheap to clone, one per concurrent task.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationReceiver {
    /// Resolves once cancellation has been signalled. If the token is
    /// dropped without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Returns true when cancellation has already been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Creates a connected token/receiver pair.
#[must_use]
pub fn cancellation_pair() -> (CancellationToken, CancellationReceiver) {
    let (sender, receiver) = watch::channel(false);
    (CancellationToken { sender }, CancellationReceiver { receiver })
}
