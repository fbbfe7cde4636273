//! Error types for monitor operations

use lastused_prometheus::PrometheusError;
use lastused_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Fatal errors: any of these ends the current cycle and the process
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Invalid or missing setting, detected before the first cycle
    #[error("Configuration error: {0}")]
    Config(String),

    /// Topic store could not be listed or patched
    #[error("Storage error: {0}")]
    Store(String),

    /// Metrics backend could not be queried
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// A usage annotation is present but cannot be parsed
    ///
    /// Treated as fatal rather than re-bootstrapped, so a parsing bug never
    /// silently discards real usage history.
    #[error("Invalid annotations on {resource}: {key}={value:?}")]
    MalformedState {
        /// Resource carrying the annotation
        resource: String,
        /// Annotation key
        key: String,
        /// Raw annotation value
        value: String,
    },
}

impl From<StoreError> for MonitorError {
    fn from(e: StoreError) -> Self {
        MonitorError::Store(e.to_string())
    }
}

impl From<PrometheusError> for MonitorError {
    fn from(e: PrometheusError) -> Self {
        MonitorError::Metrics(e.to_string())
    }
}

/// Why a topic resource is left out of a cycle
///
/// Not an error: the resource is silently excluded and the cycle goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skip {
    /// The operator has not reported a topic name yet
    Unnamed,

    /// The resource belongs to a different Kafka cluster
    OtherCluster,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::Unnamed => f.write_str("no topic name"),
            Skip::OtherCluster => f.write_str("other cluster"),
        }
    }
}
