//! Periodic reload trigger.
//!
//! The schedule is a loop that arms a fresh one-shot delay on every
//! iteration rather than a free-running interval timer, so cancellation
//! only has to stop the next arm and never tears down an in-flight firing.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error};

/// Handler invoked on each firing of the trigger.
pub type ReloadHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Single-writer busy flag shared through the blocking-wait contract.
///
/// The trigger raises the flag before handlers run and an RAII guard lowers
/// it on every exit path, so waiters can never be left blocked by a handler
/// that panicked mid-reload.
#[derive(Clone)]
pub(crate) struct IdleGate {
    busy: Arc<watch::Sender<bool>>,
}

pub(crate) struct BusyGuard {
    busy: Arc<watch::Sender<bool>>,
}

impl IdleGate {
    fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            busy: Arc::new(busy),
        }
    }

    fn enter(&self) -> BusyGuard {
        self.busy.send_replace(true);
        BusyGuard {
            busy: Arc::clone(&self.busy),
        }
    }

    /// Wait until the gate is idle. Resolves immediately when nothing is in
    /// flight; returns `false` when `timeout` elapses first.
    async fn wait_idle(&self, timeout: Duration) -> bool {
        let mut rx = self.busy.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|busy| !*busy))
            .await
            .is_ok()
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}

/// Fires registered handlers at a fixed interval, indefinitely.
///
/// One trigger drives at most one provider. A handler failure (panic) is
/// logged and never stops the next arm of the schedule.
pub struct ReloadTrigger {
    interval: Duration,
    handlers: Arc<Mutex<Vec<ReloadHandler>>>,
    gate: IdleGate,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ReloadTrigger {
    pub fn new(interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            interval,
            handlers: Arc::new(Mutex::new(Vec::new())),
            gate: IdleGate::new(),
            shutdown,
            task: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register a handler invoked on each firing. All registered handlers
    /// run, in registration order within one firing, but no ordering is
    /// promised between handlers beyond that.
    pub fn on_triggered<F>(&self, handler: F)
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.handlers.lock().push(Arc::new(handler));
    }

    /// Begin the perpetual schedule.
    pub fn start(&self) {
        let interval = self.interval;
        let handlers = Arc::clone(&self.handlers);
        let gate = self.gate.clone();
        let mut shutdown = self.shutdown.subscribe();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // One-shot delay, re-armed after each firing.
                    () = tokio::time::sleep(interval) => {}
                    _ = shutdown.changed() => {
                        debug!("reload trigger stopped");
                        break;
                    }
                }

                let _busy = gate.enter();
                let snapshot: Vec<ReloadHandler> = handlers.lock().clone();
                for handler in snapshot {
                    // Run each handler in its own task so a panic is
                    // contained and the schedule re-arms regardless.
                    if let Err(join_err) = tokio::spawn(handler()).await {
                        error!(error = %join_err, "reload handler panicked");
                    }
                }

                if *shutdown.borrow() {
                    break;
                }
            }
        });

        *self.task.lock() = Some(task);
    }

    /// Stop future firings. An in-flight firing runs to completion.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Block until no firing is in progress, or until `timeout` elapses.
    ///
    /// Returns immediately when the trigger is idle. Exposed so a host that
    /// may be frozen between invocations (a Lambda function) can make sure a
    /// background reload is not left half-applied before yielding control.
    pub async fn block_until_idle(&self, timeout: Duration) -> bool {
        self.gate.wait_idle(timeout).await
    }
}

impl Drop for ReloadTrigger {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
