//! Long-running service supervision.
//!
//! A [`ServiceHost`] runs every registered [`Service`] concurrently under one
//! shared [`CancellationToken`]. It leaves `Running` on the first of the
//! shutdown signal or any service exiting on its own, then cancels the token
//! and waits for every service to drain.
//!
//! ```text
//! Idle ─► Starting ─► Running ─► Draining ─► Stopped
//! ```
//!
//! Drain failures are logged, never returned: shutdown always completes.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A unit of work that runs until `shutdown` is cancelled.
///
/// Returning before cancellation (with `Ok` or `Err`) is treated as a
/// failure of the whole host. After cancellation the returned value is the
/// outcome of the service's drain.
#[async_trait::async_trait]
pub trait Service: Send {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Idle,
    Starting,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            RuntimeState::Idle => "idle",
            RuntimeState::Starting => "starting",
            RuntimeState::Running => "running",
            RuntimeState::Draining => "draining",
            RuntimeState::Stopped => "stopped",
        };
        f.write_str(state)
    }
}

/// What ended the `Running` state.
#[derive(Debug)]
pub enum Trigger {
    Signal,
    ServiceFailed {
        service: &'static str,
        error: anyhow::Error,
    },
}

struct Exit {
    service: &'static str,
    result: Result<()>,
}

impl Exit {
    fn from_join(
        names: &HashMap<task::Id, &'static str>,
        joined: Result<(task::Id, Result<()>), JoinError>,
    ) -> Self {
        match joined {
            Ok((id, result)) => Exit {
                service: names.get(&id).copied().unwrap_or("unknown"),
                result,
            },
            Err(e) => {
                let service = names.get(&e.id()).copied().unwrap_or("unknown");
                let result = if e.is_panic() {
                    Err(anyhow!("{} panicked", service))
                } else {
                    Err(anyhow!("{} was cancelled", service))
                };
                Exit { service, result }
            }
        }
    }
}

pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
    state: watch::Sender<RuntimeState>,
    shutdown: CancellationToken,
}

impl Default for ServiceHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceHost {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RuntimeState::Idle);
        Self {
            services: Vec::new(),
            state,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_service(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    pub fn state(&self) -> RuntimeState {
        *self.state.borrow()
    }

    /// Watch state transitions. Works before and during [`run_until`](Self::run_until).
    pub fn subscribe(&self) -> watch::Receiver<RuntimeState> {
        self.state.subscribe()
    }

    pub fn set_state(&self, state: RuntimeState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "runtime state changed");
        }
    }

    /// Cancelling this token is equivalent to the shutdown signal firing.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run every service until `signal` resolves or one of them exits, then drain.
    ///
    /// A service that panics counts as having exited with an error.
    pub async fn run_until<F>(mut self, signal: F) -> Trigger
    where
        F: Future<Output = ()>,
    {
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for service in std::mem::take(&mut self.services) {
            let name = service.name();
            let shutdown = self.shutdown.clone();

            info!(service = name, "starting service");
            let handle = tasks.spawn(async move { service.run(shutdown).await });
            names.insert(handle.id(), name);
        }

        self.set_state(RuntimeState::Running);

        let trigger = tokio::select! {
            _ = signal => {
                info!("shutdown signal received");
                Trigger::Signal
            }
            _ = self.shutdown.cancelled() => {
                info!("shutdown requested");
                Trigger::Signal
            }
            Some(joined) = tasks.join_next_with_id() => {
                let exit = Exit::from_join(&names, joined);
                let error = match exit.result {
                    Err(e) => e,
                    Ok(()) => anyhow!("{} stopped before shutdown", exit.service),
                };
                error!(service = exit.service, error = %format!("{:#}", error), "service failed");
                Trigger::ServiceFailed {
                    service: exit.service,
                    error,
                }
            }
        };

        self.set_state(RuntimeState::Draining);
        self.shutdown.cancel();

        while let Some(joined) = tasks.join_next_with_id().await {
            let exit = Exit::from_join(&names, joined);
            match exit.result {
                Ok(()) => info!(service = exit.service, "service stopped"),
                Err(e) => error!(
                    service = exit.service,
                    error = %format!("{:#}", e),
                    "service failed to drain"
                ),
            }
        }

        self.set_state(RuntimeState::Stopped);
        trigger
    }
}
