//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the reconciliation engine and
//! its transports. Implementations live in other crates.

use crate::{MetricSample, TopicResource};
use std::collections::BTreeMap;

/// Trait for listing and patching topic resources
///
/// Implemented by the infrastructure layer (lastused-store)
#[allow(async_fn_in_trait)]
pub trait TopicStore {
    /// Error type for store operations
    type Error;

    /// List every topic resource in the configured namespace
    async fn list_topics(&self) -> Result<Vec<TopicResource>, Self::Error>;

    /// Merge the given annotations into one resource
    ///
    /// Only the listed keys are written; every other label, annotation and
    /// field of the resource is left untouched.
    async fn patch_annotations(
        &self,
        resource_name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), Self::Error>;
}

/// Trait for querying cumulative byte counters
///
/// Implemented by the infrastructure layer (lastused-prometheus)
#[allow(async_fn_in_trait)]
pub trait MetricsSource {
    /// Error type for query operations
    type Error;

    /// Run an instant query, returning samples for the monitored cluster and
    /// namespace only
    async fn query(&self, query: &str) -> Result<Vec<MetricSample>, Self::Error>;
}
