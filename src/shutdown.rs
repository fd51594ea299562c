//! Cancellation signal shared by every blocking call of a run
//!
//! A [`ShutdownTrigger`] fires once; every cloned [`Shutdown`] observes it. Remote
//! calls race against [`Shutdown::triggered`] and storage operations call
//! [`Shutdown::check`] before touching the store.

use crate::HarvestError;
use tokio::sync::watch;

/// Sending half of the cancellation signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half of the cancellation signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Creates a connected trigger/signal pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    /// Requests cancellation of everything holding the paired [`Shutdown`]
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    /// A signal that never fires
    pub fn never() -> Self {
        channel().1
    }

    /// Returns true once cancellation has been requested
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Fails with [`HarvestError::Cancelled`] if cancellation has been requested
    pub fn check(&self) -> Result<(), HarvestError> {
        if self.is_triggered() {
            Err(HarvestError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Completes when cancellation is requested
    ///
    /// If the trigger is dropped without firing, this never completes.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}
