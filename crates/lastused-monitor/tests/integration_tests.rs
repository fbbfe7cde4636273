//! Integration tests for lastused-monitor
//!
//! These tests drive whole cycles through the worker against the in-memory
//! store and a static metrics source.

use lastused_domain::{MetricSample, Timestamp, TopicFlavor, TopicResource};
use lastused_monitor::annotations::{BYTES_IN_KEY, BYTES_OUT_KEY, TIMESTAMP_KEY};
use lastused_monitor::{ImmediateScheduler, MonitorConfig, MonitorError, MonitorWorker, Reconciler};
use lastused_prometheus::StaticMetricsSource;
use lastused_store::MemoryTopicStore;
use std::time::Duration;

const IN_QUERY: &str = "kafka_server_brokertopicmetrics_bytesin_total";
const OUT_QUERY: &str = "kafka_server_brokertopicmetrics_bytesout_total";

fn monitored(resource: &str, topic_name: &str) -> TopicResource {
    TopicResource::new(resource)
        .with_topic_name(topic_name)
        .with_label("strimzi.io/cluster", "prod")
}

fn with_usage(resource: TopicResource, bytes_in: u64, bytes_out: u64, millis: u64) -> TopicResource {
    resource
        .with_annotation(BYTES_IN_KEY, bytes_in.to_string())
        .with_annotation(BYTES_OUT_KEY, bytes_out.to_string())
        .with_annotation(TIMESTAMP_KEY, millis.to_string())
}

fn sample(topic_name: &str, millis: u64, bytes: u64) -> MetricSample {
    MetricSample::new(topic_name, Timestamp::from_millis(millis), bytes)
}

fn usage(store: &MemoryTopicStore, resource: &str) -> (String, String, String) {
    let stored = store.get(resource).unwrap();
    (
        stored.annotation(BYTES_IN_KEY).unwrap_or_default().to_string(),
        stored.annotation(BYTES_OUT_KEY).unwrap_or_default().to_string(),
        stored.annotation(TIMESTAMP_KEY).unwrap_or_default().to_string(),
    )
}

#[tokio::test]
async fn test_mixed_topics_single_cycle() {
    let store = MemoryTopicStore::new();
    // changed bytes-in
    store.insert(with_usage(monitored("t1-cr", "t1"), 100, 200, 1_000));
    // unchanged on both
    store.insert(with_usage(monitored("t2-cr", "t2"), 5, 5, 1_000));
    // absent from both queries
    store.insert(with_usage(monitored("t4-cr", "t4"), 7, 7, 1_000));

    let mut source = StaticMetricsSource::new();
    source.add_samples(
        IN_QUERY,
        vec![
            sample("t1", 2_000, 150),
            sample("t2", 2_000, 5),
            // not a known topic
            sample("t3", 2_000, 999),
        ],
    );
    source.add_samples(
        OUT_QUERY,
        vec![sample("t1", 3_000, 200), sample("t2", 3_000, 5)],
    );

    let mut worker = MonitorWorker::new(MonitorConfig::new("kafka", "prod"));
    worker
        .run_cycles(1, &store, &source, &mut ImmediateScheduler::new())
        .await
        .unwrap();

    let patches = store.patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].resource_name, "t1-cr");
    assert_eq!(
        usage(&store, "t1-cr"),
        ("150".to_string(), "200".to_string(), "3000".to_string())
    );
    assert_eq!(
        usage(&store, "t2-cr"),
        ("5".to_string(), "5".to_string(), "1000".to_string())
    );
    assert_eq!(
        usage(&store, "t4-cr"),
        ("7".to_string(), "7".to_string(), "1000".to_string())
    );

    let report = worker.stats().last_cycle.clone().unwrap();
    assert_eq!(report.topics_known, 3);
    assert_eq!(report.samples_ignored, 1);
    assert_eq!(report.topics_written, 1);
}

#[tokio::test]
async fn test_repeated_cycles_are_idempotent() {
    let store = MemoryTopicStore::new();
    store.insert(with_usage(monitored("t1-cr", "t1"), 100, 200, 1_000));

    let mut source = StaticMetricsSource::new();
    source.add_samples(IN_QUERY, vec![sample("t1", 2_000, 150)]);
    source.add_samples(OUT_QUERY, vec![sample("t1", 2_000, 250)]);

    let mut scheduler = ImmediateScheduler::new();
    let mut worker = MonitorWorker::new(MonitorConfig::new("kafka", "prod"));
    worker.run_cycles(3, &store, &source, &mut scheduler).await.unwrap();

    // only the first cycle sees a change
    assert_eq!(store.patches().len(), 1);
    assert_eq!(worker.stats().cycle_count, 3);
    assert_eq!(worker.stats().total_written, 1);
    assert_eq!(scheduler.waits(), &[Duration::from_secs(3600); 2]);
}

#[tokio::test]
async fn test_new_topic_lifecycle() {
    let store = MemoryTopicStore::new();
    store.insert(monitored("fresh-cr", "fresh"));

    let mut source = StaticMetricsSource::new();
    let mut reconciler = Reconciler::new(MonitorConfig::new("kafka", "prod"));

    // first sight: zero state persisted, no traffic yet
    let report = reconciler.run_cycle(&store, &source).await.unwrap();
    assert_eq!(report.bootstrapped, 1);
    assert_eq!(report.topics_written, 0);
    assert_eq!(
        usage(&store, "fresh-cr"),
        ("0".to_string(), "0".to_string(), "0".to_string())
    );

    // traffic arrives
    source.add_samples(IN_QUERY, vec![sample("fresh", 60_000, 10)]);
    source.add_samples(OUT_QUERY, vec![sample("fresh", 60_500, 4)]);
    let report = reconciler.run_cycle(&store, &source).await.unwrap();
    assert_eq!(report.bootstrapped, 0);
    assert_eq!(report.topics_written, 1);
    assert_eq!(
        usage(&store, "fresh-cr"),
        ("10".to_string(), "4".to_string(), "60500".to_string())
    );

    // traffic stops: timestamp stays at the last change
    let report = reconciler.run_cycle(&store, &source).await.unwrap();
    assert_eq!(report.topics_written, 0);
    assert_eq!(store.patches().len(), 2);
}

#[tokio::test]
async fn test_event_streams_flavor() {
    let store = MemoryTopicStore::new();
    store.insert(with_usage(
        TopicResource::new("t1-cr")
            .with_topic_name("t1")
            .with_label("eventstreams.ibm.com/cluster", "prod"),
        1,
        1,
        1,
    ));
    store.insert(with_usage(monitored("strimzi-cr", "t2"), 1, 1, 1));

    let mut source = StaticMetricsSource::new();
    source.add_samples(IN_QUERY, vec![sample("t1", 5, 2), sample("t2", 5, 2)]);

    let config = MonitorConfig {
        flavor: TopicFlavor::EventStreams,
        ..MonitorConfig::new("kafka", "prod")
    };
    let mut reconciler = Reconciler::new(config);
    let report = reconciler.run_cycle(&store, &source).await.unwrap();

    assert_eq!(report.topics_known, 1);
    assert_eq!(report.topics_written, 1);
    assert_eq!(store.patches()[0].resource_name, "t1-cr");
}

#[tokio::test]
async fn test_custom_queries_are_used() {
    let store = MemoryTopicStore::new();
    let source = StaticMetricsSource::new();

    let config = MonitorConfig {
        bytes_in_metric: "sum by (topic) (in)".to_string(),
        bytes_out_metric: "sum by (topic) (out)".to_string(),
        ..MonitorConfig::new("kafka", "prod")
    };
    let mut reconciler = Reconciler::new(config);
    reconciler.run_cycle(&store, &source).await.unwrap();

    assert_eq!(
        source.queries(),
        vec!["sum by (topic) (in)".to_string(), "sum by (topic) (out)".to_string()]
    );
}

#[tokio::test]
async fn test_failure_keeps_earlier_writes() {
    let store = MemoryTopicStore::new();
    store.insert(monitored("fresh-cr", "fresh"));
    store.insert(with_usage(monitored("t1-cr", "t1"), 1, 1, 1));

    let mut source = StaticMetricsSource::new();
    source.add_error(IN_QUERY);

    let mut worker = MonitorWorker::new(MonitorConfig::new("kafka", "prod"));
    let result = worker
        .run_cycles(2, &store, &source, &mut ImmediateScheduler::new())
        .await;

    assert!(matches!(result, Err(MonitorError::Metrics(_))));
    // the bootstrap write happened before the query failed
    assert_eq!(store.patches().len(), 1);
    assert_eq!(store.patches()[0].resource_name, "fresh-cr");
    assert_eq!(worker.stats().cycle_count, 0);
}
