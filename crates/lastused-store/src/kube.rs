//! Kubernetes REST implementation of `TopicStore`
//!
//! Lists and patches KafkaTopic custom resources through the API server.
//! One client covers both operator flavors; the [`TopicFlavor`] descriptor
//! supplies the API group and version.

use crate::StoreError;
use lastused_domain::traits::TopicStore;
use lastused_domain::{TopicFlavor, TopicResource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Mount point of the pod's service account credentials
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Where and how to reach the API server
///
/// The bearer token is re-read from `token_file` on every request, so
/// projected service account tokens can rotate underneath a running monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeConnection {
    /// API server base URL, without trailing slash
    pub api_url: String,

    /// File holding the bearer token
    pub token_file: PathBuf,

    /// PEM bundle trusted for the API server certificate
    pub ca_file: Option<PathBuf>,
}

impl KubeConnection {
    /// Build the connection from the process environment
    ///
    /// See [`KubeConnection::from_lookup`] for the variables consulted.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the connection from a key lookup
    ///
    /// - `KUBE_API_URL` overrides the in-cluster address derived from
    ///   `KUBERNETES_SERVICE_HOST` / `KUBERNETES_SERVICE_PORT`
    /// - `KUBE_TOKEN_FILE` overrides the service account token
    /// - `KUBE_CA_FILE` overrides the service account CA bundle
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] when no API server address can be found.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("KUBE_API_URL") {
            Some(url) => url,
            None => {
                let host = lookup("KUBERNETES_SERVICE_HOST").ok_or_else(|| {
                    StoreError::Config(
                        "not running in a cluster: set KUBE_API_URL or KUBERNETES_SERVICE_HOST"
                            .to_string(),
                    )
                })?;
                let port = lookup("KUBERNETES_SERVICE_PORT").unwrap_or_else(|| "443".to_string());
                if host.contains(':') {
                    format!("https://[{}]:{}", host, port)
                } else {
                    format!("https://{}:{}", host, port)
                }
            }
        };

        let service_account = Path::new(SERVICE_ACCOUNT_DIR);
        let token_file = lookup("KUBE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| service_account.join("token"));
        let ca_file = match lookup("KUBE_CA_FILE") {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let path = service_account.join("ca.crt");
                path.exists().then_some(path)
            }
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token_file,
            ca_file,
        })
    }

    fn bearer_token(&self) -> Result<String, StoreError> {
        let token = fs::read_to_string(&self.token_file)?;
        Ok(token.trim().to_string())
    }
}

/// `TopicStore` backed by KafkaTopic custom resources in one namespace
pub struct KubeTopicStore {
    client: reqwest::Client,
    connection: KubeConnection,
    namespace: String,
    flavor: TopicFlavor,
}

impl KubeTopicStore {
    /// Create a store client
    ///
    /// # Errors
    ///
    /// Returns an error if the CA bundle cannot be read or parsed.
    pub fn new(
        connection: KubeConnection,
        namespace: impl Into<String>,
        flavor: TopicFlavor,
    ) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(ca_file) = &connection.ca_file {
            let pem = fs::read(ca_file)?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                StoreError::Config(format!("invalid CA bundle {}: {}", ca_file.display(), e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            "Kubernetes client for {} topics ({}) at {}",
            flavor,
            flavor.api_group(),
            connection.api_url
        );

        Ok(Self {
            client,
            connection,
            namespace: namespace.into(),
            flavor,
        })
    }

    /// The flavor this store was created for
    pub fn flavor(&self) -> TopicFlavor {
        self.flavor
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/apis/{}/{}/namespaces/{}/{}",
            self.connection.api_url,
            self.flavor.api_group(),
            self.flavor.api_version(),
            self.namespace,
            self.flavor.plural()
        )
    }

    fn resource_url(&self, resource_name: &str) -> String {
        format!("{}/{}", self.collection_url(), resource_name)
    }
}

impl TopicStore for KubeTopicStore {
    type Error = StoreError;

    async fn list_topics(&self) -> Result<Vec<TopicResource>, Self::Error> {
        let response = self
            .client
            .get(self.collection_url())
            .bearer_auth(self.connection.bearer_token()?)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;

        let topics = parse_topic_list(&body)?;
        tracing::debug!("found {} topic resources in {}", topics.len(), self.namespace);
        Ok(topics)
    }

    async fn patch_annotations(
        &self,
        resource_name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), Self::Error> {
        let body = serde_json::to_vec(&annotation_patch(annotations))?;
        let response = self
            .client
            .patch(self.resource_url(resource_name))
            .bearer_auth(self.connection.bearer_token()?)
            .header(reqwest::header::CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        match ensure_success(response).await {
            Err(StoreError::Api { status: 404, .. }) => {
                Err(StoreError::NotFound(resource_name.to_string()))
            }
            Err(e) => Err(e),
            Ok(_) => Ok(()),
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(StoreError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Merge patch that sets the given annotations and nothing else
pub(crate) fn annotation_patch(annotations: &BTreeMap<String, String>) -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "annotations": annotations,
        }
    })
}

#[derive(Deserialize)]
struct TopicList {
    #[serde(default)]
    items: Vec<TopicObject>,
}

#[derive(Deserialize)]
struct TopicObject {
    metadata: ObjectMeta,
    #[serde(default)]
    status: Option<TopicStatus>,
}

#[derive(Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    annotations: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicStatus {
    #[serde(default)]
    topic_name: Option<String>,
}

impl From<TopicObject> for TopicResource {
    fn from(object: TopicObject) -> Self {
        TopicResource {
            name: object.metadata.name,
            topic_name: object.status.and_then(|status| status.topic_name),
            labels: object.metadata.labels.unwrap_or_default(),
            annotations: object.metadata.annotations,
        }
    }
}

/// Parse a KafkaTopic list response
pub(crate) fn parse_topic_list(body: &str) -> Result<Vec<TopicResource>, StoreError> {
    let list: TopicList = serde_json::from_str(body)?;
    Ok(list.items.into_iter().map(TopicResource::from).collect())
}
