//! Core reconciliation cycle
//!
//! One cycle is load, query bytes-in, query bytes-out, merge, write. Nothing
//! is carried from one cycle to the next except through the topic store.

use crate::merge::{merge_samples, KnownState, PendingUpdates};
use crate::stats::{CycleReport, MonitorStats};
use crate::{annotations, MonitorConfig, MonitorError, Skip};
use lastused_domain::traits::{MetricsSource, TopicStore};
use lastused_domain::{Dimension, TopicResource, UsageState};
use std::fmt::Display;
use std::time::Instant;

/// Usage reconciliation engine
///
/// Loads persisted usage state from a [`TopicStore`], folds in the counters
/// reported by a [`MetricsSource`] and writes back only the topics whose
/// usage changed.
///
/// # Examples
///
/// ```
/// use lastused_domain::TopicResource;
/// use lastused_monitor::{MonitorConfig, Reconciler};
/// use lastused_prometheus::StaticMetricsSource;
/// use lastused_store::MemoryTopicStore;
///
/// # async fn run() -> Result<(), lastused_monitor::MonitorError> {
/// let store = MemoryTopicStore::new();
/// store.insert(
///     TopicResource::new("orders")
///         .with_topic_name("orders")
///         .with_label("strimzi.io/cluster", "prod"),
/// );
///
/// let mut reconciler = Reconciler::new(MonitorConfig::new("kafka", "prod"));
/// let report = reconciler.run_cycle(&store, &StaticMetricsSource::new()).await?;
/// assert_eq!(report.bootstrapped, 1);
/// # Ok(())
/// # }
/// ```
pub struct Reconciler {
    config: MonitorConfig,
    stats: MonitorStats,
}

impl Reconciler {
    /// Create a reconciler for the given configuration
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            stats: MonitorStats::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get a reference to the cumulative statistics
    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Reset statistics counters
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Run one complete cycle
    ///
    /// 1. Loads known usage state, bootstrapping topics without any
    /// 2. Queries bytes-in, then bytes-out, merging each into pending updates
    /// 3. Patches every topic with a pending update
    ///
    /// Any error aborts the cycle. Patches issued before the error stay
    /// applied.
    pub async fn run_cycle<S, M>(&mut self, store: &S, source: &M) -> Result<CycleReport, MonitorError>
    where
        S: TopicStore,
        S::Error: Display,
        M: MetricsSource,
        M::Error: Display,
    {
        let start = Instant::now();
        let mut report = CycleReport::new();

        tracing::info!("Checking for new metrics");
        let known = self.load_known_state(store, &mut report).await?;

        let mut pending = PendingUpdates::new();
        for dimension in Dimension::ALL {
            let query = self.config.metric_query(dimension);
            tracing::debug!("Querying {} with {}", dimension, query);

            let samples = source
                .query(query)
                .await
                .map_err(|e| MonitorError::Metrics(e.to_string()))?;

            let outcome = merge_samples(dimension, &samples, &known, &mut pending);
            tracing::debug!(
                "{}: {} samples, {} merged, {} ignored, {} newly changed",
                dimension,
                samples.len(),
                outcome.merged,
                outcome.ignored,
                outcome.newly_dirty
            );
            report.samples_ignored += outcome.ignored;
            report.samples_merged += outcome.merged;
        }
        report.topics_dirty = pending.len();

        if pending.is_empty() {
            tracing::info!("No topic usage changes");
        } else {
            report.topics_written = self.submit_updates(store, &pending).await?;
        }

        self.stats.record_cycle(&report, start.elapsed());
        tracing::info!("Cycle complete: {}", report.summary());

        Ok(report)
    }

    /// Decide whether a resource takes part in the cycle
    ///
    /// Returns the Kafka topic name for monitored resources.
    pub fn classify<'a>(&self, resource: &'a TopicResource) -> Result<&'a str, Skip> {
        let topic_name = resource.topic_name.as_deref().ok_or(Skip::Unnamed)?;

        match resource.label(&self.config.cluster_label()) {
            Some(cluster) if cluster == self.config.cluster => Ok(topic_name),
            _ => Err(Skip::OtherCluster),
        }
    }

    /// Read usage state for every monitored topic
    ///
    /// Topics without usage annotations get zero-valued state, which is
    /// written to the store before it is returned. The zero state then takes
    /// part in change detection like any persisted state.
    pub async fn load_known_state<S>(
        &self,
        store: &S,
        report: &mut CycleReport,
    ) -> Result<KnownState, MonitorError>
    where
        S: TopicStore,
        S::Error: Display,
    {
        let resources = store
            .list_topics()
            .await
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut known = KnownState::with_capacity(resources.len());
        for resource in &resources {
            let topic_name = match self.classify(resource) {
                Ok(name) => name,
                Err(reason) => {
                    tracing::debug!("Skipping {}: {}", resource.name, reason);
                    report.record_skip(reason);
                    continue;
                }
            };

            let state = match annotations::decode(topic_name, resource)? {
                Some(state) => state,
                None => {
                    let state = UsageState::bootstrap(topic_name);
                    tracing::info!("Initialising usage annotations on {}", resource.name);
                    self.patch(store, &resource.name, &state).await?;
                    report.bootstrapped += 1;
                    state
                }
            };

            known.insert(topic_name.to_string(), state);
        }

        report.topics_known = known.len();
        tracing::debug!("Loaded usage state for {} topics", known.len());

        Ok(known)
    }

    /// Write pending updates back to the store
    ///
    /// Resources are listed again so that topics deleted since the load are
    /// not patched. Returns the number of patches issued.
    pub async fn submit_updates<S>(&self, store: &S, pending: &PendingUpdates) -> Result<usize, MonitorError>
    where
        S: TopicStore,
        S::Error: Display,
    {
        let resources = store
            .list_topics()
            .await
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut written = 0;
        for resource in &resources {
            let Ok(topic_name) = self.classify(resource) else {
                continue;
            };

            if let Some(update) = pending.get(topic_name) {
                tracing::info!("Updating usage of {}", update);
                self.patch(store, &resource.name, update).await?;
                written += 1;
            }
        }

        Ok(written)
    }

    async fn patch<S>(&self, store: &S, resource_name: &str, state: &UsageState) -> Result<(), MonitorError>
    where
        S: TopicStore,
        S::Error: Display,
    {
        store
            .patch_annotations(resource_name, &annotations::encode(state))
            .await
            .map_err(|e| MonitorError::Store(e.to_string()))
    }
}
