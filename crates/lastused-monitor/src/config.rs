//! Configuration for the usage monitor
//!
//! Built once at startup (see [`crate::cli::Cli`]) and passed to every
//! component that needs it.

use crate::MonitorError;
use lastused_domain::{Dimension, TopicFlavor};
use std::time::Duration;

/// Default query for per-topic inbound bytes
pub const DEFAULT_BYTES_IN_METRIC: &str = "kafka_server_brokertopicmetrics_bytesin_total";

/// Default query for per-topic outbound bytes
pub const DEFAULT_BYTES_OUT_METRIC: &str = "kafka_server_brokertopicmetrics_bytesout_total";

/// Default delay between cycles: one hour
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60 * 60;

/// Settings of the usage monitor
///
/// # Examples
///
/// ```
/// use lastused_monitor::MonitorConfig;
///
/// let config = MonitorConfig::new("kafka", "prod");
/// assert_eq!(config.poll_interval_secs, 3600);
/// assert_eq!(config.cluster_label(), "strimzi.io/cluster");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Namespace holding the KafkaTopic resources
    pub namespace: String,

    /// Kafka cluster name topics must be labelled with
    pub cluster: String,

    /// Operator flavor owning the topic resources
    pub flavor: TopicFlavor,

    /// Query returning cumulative bytes-in per topic
    pub bytes_in_metric: String,

    /// Query returning cumulative bytes-out per topic
    pub bytes_out_metric: String,

    /// Prometheus query endpoint, without trailing slash
    pub prometheus_url: String,

    /// Seconds to wait between cycles
    pub poll_interval_secs: u64,
}

impl MonitorConfig {
    /// Configuration with defaults for everything but namespace and cluster
    pub fn new(namespace: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            cluster: cluster.into(),
            flavor: TopicFlavor::default(),
            bytes_in_metric: DEFAULT_BYTES_IN_METRIC.to_string(),
            bytes_out_metric: DEFAULT_BYTES_OUT_METRIC.to_string(),
            prometheus_url: lastused_prometheus::client::DEFAULT_ENDPOINT.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// Check the settings and normalize the Prometheus URL
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`] for a blank namespace, cluster or
    /// query, a blank URL, or a zero poll interval.
    pub fn validate(mut self) -> Result<Self, MonitorError> {
        for (key, value) in [
            ("NAMESPACE", &self.namespace),
            ("CLUSTER", &self.cluster),
            ("BYTES_IN_METRIC", &self.bytes_in_metric),
            ("BYTES_OUT_METRIC", &self.bytes_out_metric),
            ("PROMETHEUS_URL", &self.prometheus_url),
        ] {
            if value.trim().is_empty() {
                return Err(MonitorError::Config(format!(
                    "Missing required environment variable {}",
                    key
                )));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(MonitorError::Config(
                "POLL_INTERVAL_SECONDS must be at least 1".to_string(),
            ));
        }

        if self.prometheus_url.ends_with('/') {
            self.prometheus_url.pop();
        }

        Ok(self)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Query string for a dimension
    pub fn metric_query(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::BytesIn => &self.bytes_in_metric,
            Dimension::BytesOut => &self.bytes_out_metric,
        }
    }

    /// Label key whose value must equal [`MonitorConfig::cluster`]
    pub fn cluster_label(&self) -> String {
        self.flavor.cluster_label()
    }

    /// Log every effective setting
    pub fn log_settings(&self) {
        tracing::info!("NAMESPACE = {}", self.namespace);
        tracing::info!("CLUSTER = {}", self.cluster);
        tracing::info!("MODE = {}", self.flavor);
        tracing::info!("BYTES_IN_METRIC = {}", self.bytes_in_metric);
        tracing::info!("BYTES_OUT_METRIC = {}", self.bytes_out_metric);
        tracing::info!("PROMETHEUS_URL = {}", self.prometheus_url);
        tracing::info!("POLL_INTERVAL_SECONDS = {}", self.poll_interval_secs);
    }
}
