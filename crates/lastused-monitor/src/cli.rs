//! Command-line and environment argument parsing

use crate::config::{DEFAULT_BYTES_IN_METRIC, DEFAULT_BYTES_OUT_METRIC, DEFAULT_POLL_INTERVAL_SECS};
use crate::{MonitorConfig, MonitorError};
use clap::Parser;
use lastused_domain::TopicFlavor;
use lastused_prometheus::client::DEFAULT_ENDPOINT;

/// Kafka topic usage monitor - records when topics last saw traffic.
///
/// Every setting can be given as a flag or as the environment variable
/// shown next to it.
#[derive(Debug, Parser)]
#[command(name = "lastused")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Namespace containing the KafkaTopic resources
    #[arg(long, env = "NAMESPACE")]
    pub namespace: String,

    /// Name of the Kafka cluster to monitor
    #[arg(long, env = "CLUSTER")]
    pub cluster: String,

    /// Operator managing the topics: "strimzi" or "eventstreams"
    #[arg(long, env = "MODE", default_value = "strimzi")]
    pub mode: String,

    /// Prometheus query returning cumulative bytes-in per topic
    #[arg(long, env = "BYTES_IN_METRIC", default_value = DEFAULT_BYTES_IN_METRIC)]
    pub bytes_in_metric: String,

    /// Prometheus query returning cumulative bytes-out per topic
    #[arg(long, env = "BYTES_OUT_METRIC", default_value = DEFAULT_BYTES_OUT_METRIC)]
    pub bytes_out_metric: String,

    /// Prometheus (or Thanos querier) base URL
    #[arg(long, env = "PROMETHEUS_URL", default_value = DEFAULT_ENDPOINT)]
    pub prometheus_url: String,

    /// Seconds to wait between cycles
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_seconds: u64,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Build the validated monitor configuration
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`] if validation fails.
    pub fn into_config(self) -> Result<MonitorConfig, MonitorError> {
        MonitorConfig {
            namespace: self.namespace,
            cluster: self.cluster,
            flavor: TopicFlavor::from_mode(&self.mode),
            bytes_in_metric: self.bytes_in_metric,
            bytes_out_metric: self.bytes_out_metric,
            prometheus_url: self.prometheus_url,
            poll_interval_secs: self.poll_interval_seconds,
        }
        .validate()
    }
}
