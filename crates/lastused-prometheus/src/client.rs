//! Prometheus HTTP client
//!
//! Runs instant queries against `/api/v1/query`, authenticating with the
//! pod's Kubernetes service account token (as expected by the OpenShift
//! Thanos querier) and trusting an optional private CA.

use crate::response::parse_response;
use crate::PrometheusError;
use lastused_domain::traits::MetricsSource;
use lastused_domain::{MetricSample, TopicFlavor};
use std::fs;
use std::path::{Path, PathBuf};

/// Default query endpoint (OpenShift cluster monitoring)
pub const DEFAULT_ENDPOINT: &str = "https://thanos-querier.openshift-monitoring.svc:9091";

/// Path of the instant query API, relative to the endpoint
pub const INSTANT_QUERY_PATH: &str = "/api/v1/query";

/// CA certificate for the Prometheus endpoint, when running with local credentials
pub const CA_CERT_PATH: &str = "creds/prometheus-ca.crt";

/// Service account token mounted into every pod
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Token file used when running outside a cluster
pub const LOCAL_TOKEN_PATH: &str = "creds/k8s-token";

/// Which series belong to the monitored cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleScope {
    cluster_label: &'static str,
    cluster: String,
    namespace: String,
}

impl SampleScope {
    /// Scope samples to one cluster (by the flavor's metric label) and namespace
    pub fn new(flavor: TopicFlavor, cluster: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            cluster_label: flavor.metrics_cluster_label(),
            cluster: cluster.into(),
            namespace: namespace.into(),
        }
    }

    /// True if the series labels (looked up through `label`) are in scope
    pub fn matches<'a, F>(&self, label: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        label(self.cluster_label) == Some(self.cluster.as_str())
            && label("namespace") == Some(self.namespace.as_str())
    }
}

/// `MetricsSource` backed by the Prometheus HTTP API
pub struct PrometheusClient {
    endpoint: String,
    client: reqwest::Client,
    scope: SampleScope,
    token_paths: Vec<PathBuf>,
}

impl PrometheusClient {
    /// Create a client for `endpoint`
    ///
    /// A trailing slash on the endpoint is removed. If [`CA_CERT_PATH`]
    /// exists it is added as a trusted root.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate exists but cannot be parsed.
    pub fn new(endpoint: impl Into<String>, scope: SampleScope) -> Result<Self, PrometheusError> {
        let ca_path = Path::new(CA_CERT_PATH);
        let ca_file = ca_path.exists().then_some(ca_path);
        Self::with_ca_file(endpoint, scope, ca_file)
    }

    /// Create a client trusting an explicit CA certificate
    pub fn with_ca_file(
        endpoint: impl Into<String>,
        scope: SampleScope,
        ca_file: Option<&Path>,
    ) -> Result<Self, PrometheusError> {
        tracing::debug!("Creating HTTP client for Prometheus API");

        let mut builder = reqwest::Client::builder();
        if let Some(ca_file) = ca_file {
            let pem = fs::read(ca_file)?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                PrometheusError::Config(format!("invalid CA certificate {}: {}", ca_file.display(), e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }
        let client = builder
            .build()
            .map_err(|e| PrometheusError::Config(format!("failed to build HTTP client: {}", e)))?;

        let mut endpoint = endpoint.into();
        if endpoint.ends_with('/') {
            endpoint.pop();
        }

        Ok(Self {
            endpoint,
            client,
            scope,
            token_paths: vec![
                PathBuf::from(SERVICE_ACCOUNT_TOKEN_PATH),
                PathBuf::from(LOCAL_TOKEN_PATH),
            ],
        })
    }

    /// Replace the token files tried, in order, before each query
    pub fn with_token_paths(mut self, token_paths: Vec<PathBuf>) -> Self {
        self.token_paths = token_paths;
        self
    }

    /// Endpoint queries are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_url(&self) -> String {
        format!("{}{}", self.endpoint, INSTANT_QUERY_PATH)
    }

    /// Read the first token file that exists
    ///
    /// Read on every query so rotated tokens are picked up.
    fn bearer_token(&self) -> Result<String, PrometheusError> {
        let path = self
            .token_paths
            .iter()
            .find(|path| path.exists())
            .ok_or_else(|| {
                PrometheusError::Credentials("Kubernetes service token not found".to_string())
            })?;
        Ok(fs::read_to_string(path)?.trim().to_string())
    }
}

impl MetricsSource for PrometheusClient {
    type Error = PrometheusError;

    async fn query(&self, query: &str) -> Result<Vec<MetricSample>, Self::Error> {
        tracing::debug!("prometheus query {}", query);

        let response = self
            .client
            .get(self.query_url())
            .query(&[("query", query)])
            .bearer_auth(self.bearer_token()?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::trace!("{}", body);

        // Prometheus reports bad queries as 400/422 with a JSON error body
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(PrometheusError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body, &self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scope() -> SampleScope {
        SampleScope::new(TopicFlavor::Strimzi, "prod", "kafka")
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let client = PrometheusClient::with_ca_file("https://prom:9091/", scope(), None).unwrap();
        assert_eq!(client.endpoint(), "https://prom:9091");
        assert_eq!(client.query_url(), "https://prom:9091/api/v1/query");
    }

    #[test]
    fn test_only_one_trailing_slash_is_stripped() {
        let client = PrometheusClient::with_ca_file("http://prom//", scope(), None).unwrap();
        assert_eq!(client.endpoint(), "http://prom/");
    }

    #[test]
    fn test_scope_matching() {
        let scope = scope();
        let labels = |key: &str| match key {
            "strimzi_io_cluster" => Some("prod"),
            "namespace" => Some("kafka"),
            _ => None,
        };
        assert!(scope.matches(labels));
        assert!(!scope.matches(|key: &str| (key == "namespace").then_some("kafka")));
    }

    #[test]
    fn test_token_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let local = dir.path().join("k8s-token");
        let mut file = fs::File::create(&local).unwrap();
        writeln!(file, "local-token").unwrap();

        let client = PrometheusClient::with_ca_file("http://prom", scope(), None)
            .unwrap()
            .with_token_paths(vec![missing, local]);
        assert_eq!(client.bearer_token().unwrap(), "local-token");
    }

    #[test]
    fn test_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let client = PrometheusClient::with_ca_file("http://prom", scope(), None)
            .unwrap()
            .with_token_paths(vec![dir.path().join("nope")]);
        assert!(matches!(
            client.bearer_token(),
            Err(PrometheusError::Credentials(_))
        ));
    }

    #[test]
    fn test_missing_ca_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let ca_file = dir.path().join("prometheus-ca.crt");

        let result = PrometheusClient::with_ca_file("http://prom", scope(), Some(&ca_file));
        assert!(matches!(result, Err(PrometheusError::Io(_))));
    }

    #[tokio::test]
    async fn test_query_without_token_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let client = PrometheusClient::with_ca_file("http://localhost:9", scope(), None)
            .unwrap()
            .with_token_paths(vec![dir.path().join("nope")]);

        let result = client.query("up").await;
        assert!(matches!(result, Err(PrometheusError::Credentials(_))));
    }
}
