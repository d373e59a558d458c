//! Trailing-edge debounce for rebuild triggers

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle used to request a rebuild.
///
/// Every [`signal`](Debouncer::signal) restarts the quiescence window. The
/// work closure runs once the window elapses with no further signals. Work
/// runs on a single task, so invocations never overlap; signals that arrive
/// while work is running schedule exactly one more window afterwards.
#[derive(Clone, Debug)]
pub struct Debouncer {
    pending: Arc<Notify>,
}

impl Debouncer {
    /// Spawn the debounce task.
    ///
    /// The task exits when `shutdown` turns true or its sender is dropped.
    /// Work that is already running is allowed to finish.
    pub fn spawn<F, Fut>(
        window: Duration,
        shutdown: watch::Receiver<bool>,
        work: F,
    ) -> (Self, JoinHandle<()>)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let pending = Arc::new(Notify::new());
        let handle = tokio::spawn(run(window, pending.clone(), shutdown, work));
        (Self { pending }, handle)
    }

    /// Request a rebuild. Cheap and safe to call from any task.
    pub fn signal(&self) {
        self.pending.notify_one();
    }
}

async fn run<F, Fut>(
    window: Duration,
    pending: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
    work: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    'outer: loop {
        tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => break,
            _ = pending.notified() => {}
        }

        // Wait for the window to pass without another signal
        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => break 'outer,
                _ = pending.notified() => continue,
                _ = tokio::time::sleep(window) => break,
            }
        }

        work().await;
    }

    debug!("Debouncer stopped");
}

pub(crate) async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
