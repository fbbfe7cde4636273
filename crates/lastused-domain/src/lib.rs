//! lastused Domain Layer
//!
//! Core model for topic usage reconciliation. This crate has no external
//! dependencies and defines the entities, the merge rule and the trait
//! interfaces that the infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **UsageState**: last-known cumulative bytes-in/out of a topic and the
//!   instant they were confirmed
//! - **MetricSample**: one backend observation of a cumulative counter
//! - **Dimension**: which counter a sample belongs to (bytes-in or bytes-out)
//! - **TopicResource**: the store's record for a topic, carrying the
//!   persisted usage annotations
//! - **TopicFlavor**: which operator's KafkaTopic resources are monitored
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Trait definitions for the metrics backend and the topic store
//! - Transport implementations live in `lastused-store` and `lastused-prometheus`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod flavor;
pub mod sample;
pub mod timestamp;
pub mod topic;
pub mod traits;
pub mod usage;

// Re-exports for convenience
pub use flavor::TopicFlavor;
pub use sample::MetricSample;
pub use timestamp::Timestamp;
pub use topic::TopicResource;
pub use usage::{Dimension, UsageState};
