//! Waiting between cycles
//!
//! The worker never sleeps directly; it asks a [`Scheduler`], so tests can
//! run several cycles back to back.

use std::time::Duration;

/// Decides how the worker waits between two cycles
#[allow(async_fn_in_trait)]
pub trait Scheduler {
    /// Return when the next cycle should start
    async fn wait(&mut self, interval: Duration);
}

/// Sleeps on the tokio timer
///
/// On unix the sleep can be cut short with SIGHUP, which starts the next
/// cycle immediately.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    #[cfg(unix)]
    hangup: Option<tokio::signal::unix::Signal>,
}

impl TokioScheduler {
    /// Scheduler that always sleeps the full interval
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler whose sleep ends early on SIGHUP
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handler cannot be registered.
    #[cfg(unix)]
    pub fn wake_on_hangup() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            hangup: Some(signal(SignalKind::hangup())?),
        })
    }

    #[cfg(unix)]
    async fn sleep(&mut self, interval: Duration) {
        let Some(hangup) = self.hangup.as_mut() else {
            tokio::time::sleep(interval).await;
            return;
        };

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = hangup.recv() => {
                tracing::info!("Hangup received, starting next cycle early");
            }
        }
    }

    #[cfg(not(unix))]
    async fn sleep(&mut self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

impl Scheduler for TokioScheduler {
    async fn wait(&mut self, interval: Duration) {
        tracing::debug!("Next cycle in {:?}", interval);
        self.sleep(interval).await;
    }
}

/// Returns at once, remembering every requested wait
#[derive(Debug, Clone, Default)]
pub struct ImmediateScheduler {
    waits: Vec<Duration>,
}

impl ImmediateScheduler {
    /// Create a scheduler with no recorded waits
    pub fn new() -> Self {
        Self::default()
    }

    /// Intervals requested so far
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }
}

impl Scheduler for ImmediateScheduler {
    async fn wait(&mut self, interval: Duration) {
        self.waits.push(interval);
    }
}
