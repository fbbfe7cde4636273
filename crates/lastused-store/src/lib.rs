//! lastused Storage Layer
//!
//! Implements the `TopicStore` trait against KafkaTopic custom resources.
//!
//! # Architecture
//!
//! - [`KubeTopicStore`]: talks to the Kubernetes API server over REST, for
//!   either operator flavor (Strimzi or Event Streams)
//! - [`MemoryTopicStore`]: in-process store for tests and dry runs
//!
//! Usage state lives in annotations; patches are JSON merge patches that
//! only touch the annotation keys they carry.
//!
//! # Examples
//!
//! ```
//! use lastused_domain::TopicResource;
//! use lastused_store::MemoryTopicStore;
//!
//! let store = MemoryTopicStore::new();
//! store.insert(TopicResource::new("orders").with_topic_name("orders"));
//! assert_eq!(store.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod kube;
pub mod memory;

use thiserror::Error;

pub use kube::{KubeConnection, KubeTopicStore};
pub use memory::{MemoryTopicStore, PatchRecord};

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network or TLS communication error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The API server answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the server
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing or unusable connection settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource does not exist
    #[error("Topic resource not found: {0}")]
    NotFound(String),

    /// Credential files could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            StoreError::Api {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            StoreError::Connection(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::InvalidResponse(format!("JSON parsing error: {}", e))
    }
}
