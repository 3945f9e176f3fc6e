// Stop signal for the maintenance loop

use tokio::sync::watch;

/// Held by the code that spawned the scheduler. Dropping it stops the loop too,
/// so a command that returns early never leaves a sweeper running.
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by [`MaintenanceScheduler::run`](super::MaintenanceScheduler::run)
#[derive(Clone)]
pub struct StopToken {
    rx: watch::Receiver<bool>,
}

impl StopToken {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once stop was requested or the handle is gone
    pub async fn stopped(&mut self) {
        // Err means the handle was dropped
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

pub fn stop_signal() -> (StopHandle, StopToken) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopToken { rx })
}
