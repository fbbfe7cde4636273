//! lastused monitor
//!
//! Records when Kafka topics were last used, by reconciling broker
//! throughput metrics from Prometheus with usage annotations on the
//! KafkaTopic custom resources.
//!
//! # Overview
//!
//! Each cycle:
//! - **Load**: reads usage state from every topic resource in the monitored
//!   namespace and cluster, writing zero-valued state on topics without any
//! - **Merge**: queries cumulative bytes-in, then bytes-out, and folds every
//!   changed counter into a pending update
//! - **Write**: patches the three usage annotations of each changed topic
//!
//! Then it waits for the poll interval and starts again. The first error
//! ends the monitor; restarting is left to the process supervisor.
//!
//! # Persisted state
//!
//! | Annotation | Value |
//! |------------|-------|
//! | `dalelane.co.uk/lastused-bytesin` | last bytes-in counter |
//! | `dalelane.co.uk/lastused-bytesout` | last bytes-out counter |
//! | `dalelane.co.uk/lastused-timestamp` | epoch milliseconds of the newest sample that changed a counter |
//!
//! # Usage
//!
//! ## One cycle
//!
//! ```
//! use lastused_domain::{MetricSample, Timestamp, TopicResource};
//! use lastused_monitor::{MonitorConfig, Reconciler};
//! use lastused_prometheus::StaticMetricsSource;
//! use lastused_store::MemoryTopicStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), lastused_monitor::MonitorError> {
//! let store = MemoryTopicStore::new();
//! store.insert(
//!     TopicResource::new("orders")
//!         .with_topic_name("orders")
//!         .with_label("strimzi.io/cluster", "prod"),
//! );
//!
//! let mut source = StaticMetricsSource::new();
//! source.add_samples(
//!     "kafka_server_brokertopicmetrics_bytesin_total",
//!     vec![MetricSample::new("orders", Timestamp::from_millis(1_000), 512)],
//! );
//!
//! let mut reconciler = Reconciler::new(MonitorConfig::new("kafka", "prod"));
//! let report = reconciler.run_cycle(&store, &source).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background worker
//!
//! ```no_run
//! use lastused_monitor::{MonitorConfig, MonitorWorker, TokioScheduler};
//! use lastused_prometheus::{PrometheusClient, SampleScope};
//! use lastused_store::{KubeConnection, KubeTopicStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::new("kafka", "prod").validate()?;
//!     let store = KubeTopicStore::new(KubeConnection::from_env()?, &config.namespace, config.flavor)?;
//!     let scope = SampleScope::new(config.flavor, &config.cluster, &config.namespace);
//!     let source = PrometheusClient::new(&config.prometheus_url, scope)?;
//!
//!     let mut worker = MonitorWorker::new(config);
//!     worker.run(&store, &source, &mut TokioScheduler::new()).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotations;
pub mod cli;
mod config;
mod error;
pub mod merge;
mod reconciler;
mod scheduler;
mod stats;
mod worker;

pub use cli::Cli;
pub use config::{MonitorConfig, DEFAULT_BYTES_IN_METRIC, DEFAULT_BYTES_OUT_METRIC, DEFAULT_POLL_INTERVAL_SECS};
pub use error::{MonitorError, Skip};
pub use reconciler::Reconciler;
pub use scheduler::{ImmediateScheduler, Scheduler, TokioScheduler};
pub use stats::{CycleReport, MonitorStats};
pub use worker::MonitorWorker;
