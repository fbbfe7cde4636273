//! Long-running usage monitor

use crate::{MonitorConfig, MonitorError, MonitorStats, Reconciler, Scheduler};
use lastused_domain::traits::{MetricsSource, TopicStore};
use std::fmt::Display;
use std::time::Duration;

/// Worker that runs reconciliation cycles on a schedule
///
/// There is no catch-and-continue: the first failing cycle ends the worker
/// and the error is returned to the caller.
///
/// # Examples
///
/// ```no_run
/// use lastused_monitor::{MonitorConfig, MonitorWorker, TokioScheduler};
/// use lastused_prometheus::StaticMetricsSource;
/// use lastused_store::MemoryTopicStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryTopicStore::new();
///     let source = StaticMetricsSource::new();
///     let mut worker = MonitorWorker::new(MonitorConfig::new("kafka", "prod"));
///
///     // Runs until a cycle fails
///     worker.run(&store, &source, &mut TokioScheduler::new()).await?;
///     Ok(())
/// }
/// ```
pub struct MonitorWorker {
    reconciler: Reconciler,
    interval: Duration,
}

impl MonitorWorker {
    /// Create a new worker with the given configuration
    pub fn new(config: MonitorConfig) -> Self {
        let interval = config.poll_interval();
        Self {
            reconciler: Reconciler::new(config),
            interval,
        }
    }

    /// Run cycles until one fails
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing cycle.
    pub async fn run<S, M, W>(&mut self, store: &S, source: &M, scheduler: &mut W) -> Result<(), MonitorError>
    where
        S: TopicStore,
        S::Error: Display,
        M: MetricsSource,
        M::Error: Display,
        W: Scheduler,
    {
        tracing::info!("Usage monitor started (interval: {:?})", self.interval);

        loop {
            if let Err(e) = self.reconciler.run_cycle(store, source).await {
                tracing::error!("Cycle {} failed: {}", self.stats().cycle_count + 1, e);
                tracing::info!("Usage monitor stopped. Final statistics:\n{}", self.stats().summary());
                return Err(e);
            }
            scheduler.wait(self.interval).await;
        }
    }

    /// Run a fixed number of cycles, waiting between them but not after the last
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing cycle; later cycles do not run.
    pub async fn run_cycles<S, M, W>(
        &mut self,
        cycles: usize,
        store: &S,
        source: &M,
        scheduler: &mut W,
    ) -> Result<(), MonitorError>
    where
        S: TopicStore,
        S::Error: Display,
        M: MetricsSource,
        M::Error: Display,
        W: Scheduler,
    {
        tracing::info!(
            "Usage monitor started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            if cycle > 0 {
                scheduler.wait(self.interval).await;
            }

            tracing::debug!("Starting cycle {}/{}", cycle + 1, cycles);
            if let Err(e) = self.reconciler.run_cycle(store, source).await {
                tracing::error!("Cycle {}/{} failed: {}", cycle + 1, cycles, e);
                return Err(e);
            }
        }

        tracing::info!(
            "Usage monitor finished {} cycles. Final statistics:\n{}",
            cycles,
            self.stats().summary()
        );

        Ok(())
    }

    /// Get a reference to the cumulative statistics
    pub fn stats(&self) -> &MonitorStats {
        self.reconciler.stats()
    }

    /// Reset the statistics counters
    pub fn reset_stats(&mut self) {
        self.reconciler.reset_stats();
    }
}
