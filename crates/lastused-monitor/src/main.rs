//! lastused - Kafka topic usage monitor
//!
//! Runs reconciliation cycles against the Kubernetes API and Prometheus
//! until one fails, then exits with status 1.

use clap::Parser;
use lastused_monitor::{Cli, ImmediateScheduler, MonitorError, MonitorWorker, TokioScheduler};
use lastused_prometheus::{PrometheusClient, SampleScope};
use lastused_store::{KubeConnection, KubeTopicStore};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("Failed to monitor topic usage: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), MonitorError> {
    let once = cli.once;
    let config = cli.into_config()?;
    config.log_settings();

    let store = KubeTopicStore::new(KubeConnection::from_env()?, &config.namespace, config.flavor)?;
    let scope = SampleScope::new(config.flavor, &config.cluster, &config.namespace);
    let source = PrometheusClient::new(&config.prometheus_url, scope)?;

    let mut worker = MonitorWorker::new(config);
    if once {
        return worker
            .run_cycles(1, &store, &source, &mut ImmediateScheduler::new())
            .await;
    }

    let mut scheduler = scheduler()?;
    worker.run(&store, &source, &mut scheduler).await
}

#[cfg(unix)]
fn scheduler() -> Result<TokioScheduler, MonitorError> {
    TokioScheduler::wake_on_hangup()
        .map_err(|e| MonitorError::Config(format!("failed to register SIGHUP handler: {}", e)))
}

#[cfg(not(unix))]
fn scheduler() -> Result<TokioScheduler, MonitorError> {
    Ok(TokioScheduler::new())
}
