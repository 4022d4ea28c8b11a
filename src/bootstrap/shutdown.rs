use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::log::EventLog;
use crate::platform::Platform;

/// Interrupt handler that performs the graceful platform exit.
pub struct ShutdownHook {
    platform: Arc<dyn Platform>,
    log: Arc<dyn EventLog>,
    registered: AtomicBool,
    fired: AtomicBool,
    done: CancellationToken,
}

impl ShutdownHook {
    pub fn new(platform: Arc<dyn Platform>, log: Arc<dyn EventLog>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            log,
            registered: AtomicBool::new(false),
            fired: AtomicBool::new(false),
            done: CancellationToken::new(),
        })
    }

    /// Spawns the SIGINT listener and returns immediately. Later calls are no-ops.
    pub fn register(self: &Arc<Self>) {
        if self.registered.swap(true, Ordering::SeqCst) {
            return;
        }
        let hook = Arc::clone(self);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                hook.trigger().await;
            }
        });
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Logs the shutdown and exits the platform. Only the first call acts.
    pub async fn trigger(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        self.log
            .info("Received SIGINT, shutting down gracefully...", &[]);
        if let Err(err) = self.platform.exit().await {
            self.log
                .error("Platform exit failed", &[("error", err.to_string())]);
        }
        self.done.cancel();
    }

    /// Cancelled once the hook has fired.
    pub fn done(&self) -> CancellationToken {
        self.done.clone()
    }
}
