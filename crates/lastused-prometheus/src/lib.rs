//! lastused Prometheus Layer
//!
//! Implementations of the `MetricsSource` trait from `lastused-domain`.
//!
//! # Sources
//!
//! - `PrometheusClient`: instant queries against a Prometheus (or Thanos
//!   querier) HTTP API, scoped to one cluster and namespace
//! - `StaticMetricsSource`: deterministic canned samples for testing
//!
//! # Examples
//!
//! ```
//! use lastused_domain::{MetricSample, Timestamp};
//! use lastused_prometheus::StaticMetricsSource;
//!
//! let mut source = StaticMetricsSource::new();
//! source.add_samples("bytes_in", vec![MetricSample::new("orders", Timestamp::from_millis(1), 42)]);
//! assert_eq!(source.call_count(), 0);
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod response;

use lastused_domain::traits::MetricsSource;
use lastused_domain::MetricSample;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use client::{PrometheusClient, SampleScope};

/// Errors that can occur while querying Prometheus
#[derive(Error, Debug)]
pub enum PrometheusError {
    /// Network or TLS communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The API answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The query itself was rejected (`"status": "error"`)
    #[error("Query failed: {0}")]
    Query(String),

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No bearer token could be found
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Client could not be built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential files could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PrometheusError {
    fn from(e: reqwest::Error) -> Self {
        PrometheusError::Communication(e.to_string())
    }
}

impl From<serde_json::Error> for PrometheusError {
    fn from(e: serde_json::Error) -> Self {
        PrometheusError::InvalidResponse(format!("Failed to parse response: {}", e))
    }
}

#[derive(Debug, Default)]
struct Canned {
    samples: HashMap<String, Vec<MetricSample>>,
    errors: Vec<String>,
    queries: Vec<String>,
}

/// Metrics source returning pre-configured samples
///
/// Queries without configured samples return an empty result, as Prometheus
/// does for a metric with no series.
///
/// # Examples
///
/// ```
/// use lastused_domain::traits::MetricsSource;
/// use lastused_prometheus::StaticMetricsSource;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut source = StaticMetricsSource::new();
/// source.add_error("broken_metric");
/// assert!(source.query("broken_metric").await.is_err());
/// assert!(source.query("other_metric").await.unwrap().is_empty());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticMetricsSource {
    canned: Arc<Mutex<Canned>>,
}

impl StaticMetricsSource {
    /// Create a source with no samples
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the samples returned for a query
    pub fn add_samples(&mut self, query: impl Into<String>, samples: Vec<MetricSample>) {
        self.canned
            .lock()
            .unwrap()
            .samples
            .insert(query.into(), samples);
    }

    /// Configure a query to fail
    pub fn add_error(&mut self, query: impl Into<String>) {
        self.canned.lock().unwrap().errors.push(query.into());
    }

    /// Queries issued so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.canned.lock().unwrap().queries.clone()
    }

    /// Number of queries issued
    pub fn call_count(&self) -> usize {
        self.canned.lock().unwrap().queries.len()
    }
}

impl MetricsSource for StaticMetricsSource {
    type Error = PrometheusError;

    async fn query(&self, query: &str) -> Result<Vec<MetricSample>, Self::Error> {
        let mut canned = self.canned.lock().unwrap();
        canned.queries.push(query.to_string());

        if canned.errors.iter().any(|q| q == query) {
            return Err(PrometheusError::Query(format!("Mock error for {}", query)));
        }
        Ok(canned.samples.get(query).cloned().unwrap_or_default())
    }
}
