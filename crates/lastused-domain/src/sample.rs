//! Metric sample module

use crate::Timestamp;

/// One observation of a cumulative byte counter for one topic
///
/// Samples are produced per query dimension per poll cycle and are already
/// scoped to the monitored cluster and namespace by the metrics source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    /// Kafka topic name the counter belongs to
    pub topic_name: String,

    /// When the backend took the sample
    pub timestamp: Timestamp,

    /// Cumulative counter value (not a delta)
    pub total_bytes: u64,
}

impl MetricSample {
    /// Create a new sample
    pub fn new(topic_name: impl Into<String>, timestamp: Timestamp, total_bytes: u64) -> Self {
        Self {
            topic_name: topic_name.into(),
            timestamp,
            total_bytes,
        }
    }
}
