//! Interrupt propagation to running pipelines
//!
//! The binary owns a `ShutdownTrigger` wired to Ctrl-C; every pipeline run
//! holds a `Shutdown` and checks it alongside its in-flight fetches.

use tokio::sync::watch;

/// Sending side of the shutdown signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

/// Receiving side of the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

/// Creates a connected trigger/receiver pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, Shutdown { receiver })
}

impl ShutdownTrigger {
    /// Signals every receiver; later calls are no-ops
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl Shutdown {
    /// A receiver that never fires, for runs that cannot be interrupted
    pub fn never() -> Self {
        let (trigger, shutdown) = channel();
        // Dropping the trigger closes the channel without signalling.
        drop(trigger);
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown is triggered; pends forever if the trigger is
    /// dropped without firing
    pub async fn recv(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Triggers shutdown on the first Ctrl-C
pub fn spawn_ctrl_c_listener(trigger: ShutdownTrigger) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping fetches and writing snapshots");
            trigger.trigger();
        }
    })
}
