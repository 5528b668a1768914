use super::types::{ExitStatus, ShutdownPhase, ShutdownTrigger};
use crate::registry::registry::ServiceRegistry;

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct ShutdownCoordinator {
    drain_timeout: Duration,
    stop: watch::Sender<bool>,
    phase: Mutex<ShutdownPhase>,
}

impl ShutdownCoordinator {
    pub fn new(drain_timeout: Duration) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            drain_timeout,
            stop,
            phase: Mutex::new(ShutdownPhase::Running),
        }
    }

    /// Receiver that flips to `true` when listeners must stop accepting.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.stop.subscribe()
    }

    pub fn phase(&self) -> ShutdownPhase {
        match self.phase.lock() {
            Ok(phase) => *phase,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_phase(&self, next: ShutdownPhase) -> ShutdownPhase {
        let mut phase = match self.phase.lock() {
            Ok(phase) => phase,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *phase, next)
    }

    /// Runs the drain sequence once and returns the exit status.
    ///
    /// `listeners` are awaited after the stop signal so in-flight requests
    /// complete before indexes are retired. `abort` resolving (a second
    /// signal) cuts the drain short.
    pub async fn shutdown<A>(
        &self,
        trigger: ShutdownTrigger,
        registry: Arc<ServiceRegistry>,
        listeners: Vec<JoinHandle<()>>,
        abort: A,
    ) -> ExitStatus
    where
        A: Future<Output = ()>,
    {
        if self.set_phase(ShutdownPhase::Draining) != ShutdownPhase::Running {
            tracing::warn!("Shutdown requested twice ({})", trigger);
            return ExitStatus::UncleanShutdown;
        }

        tracing::info!(
            "Shutting down ({}); {} disposals pending",
            trigger,
            registry.pending_disposals()
        );
        self.stop.send_replace(true);

        let drain = tokio::spawn(async move {
            for listener in listeners {
                if let Err(e) = listener.await {
                    tracing::warn!("Listener ended abnormally: {}", e);
                }
            }
            registry.shutdown().await
        });

        let status = tokio::select! {
            result = tokio::time::timeout(self.drain_timeout, drain) => match result {
                Ok(Ok(report)) => {
                    tracing::info!(
                        "Drain complete: {} stores disposed, {} failed",
                        report.disposed,
                        report.failed
                    );
                    trigger.exit_status()
                }
                Ok(Err(e)) => {
                    tracing::error!("Drain task failed: {}", e);
                    ExitStatus::UncleanShutdown
                }
                Err(_) => {
                    tracing::error!("Drain timed out after {:?}", self.drain_timeout);
                    ExitStatus::UncleanShutdown
                }
            },
            _ = abort => {
                tracing::error!("Second signal received, aborting drain");
                ExitStatus::UncleanShutdown
            }
        };

        self.set_phase(ShutdownPhase::Stopped);
        tracing::info!("Exiting with code {}", status.code());
        status
    }
}
