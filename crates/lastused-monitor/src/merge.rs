//! Change detection and merging of metric samples
//!
//! Called once per dimension per cycle. The pending map is shared between
//! the two calls: once a topic is dirty from the first dimension, every
//! later sample for it is folded in without comparison.

use lastused_domain::{Dimension, MetricSample, UsageState};
use std::collections::HashMap;

/// Usage state per topic name, as loaded at the start of a cycle
pub type KnownState = HashMap<String, UsageState>;

/// Usage state per topic name that must be written at the end of a cycle
pub type PendingUpdates = HashMap<String, UsageState>;

/// Counts from one [`merge_samples`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Samples for topics absent from known state
    pub ignored: usize,

    /// Samples matching the known counter of a clean topic
    pub unchanged: usize,

    /// Samples folded into a pending update
    pub merged: usize,

    /// Topics that became dirty during this call
    pub newly_dirty: usize,
}

/// Fold one dimension's samples into the pending updates
///
/// For each sample:
/// - topic unknown: ignored
/// - topic already pending: applied unconditionally
/// - counter differs from the known value: a pending update is seeded from
///   known state and the sample applied to it
/// - otherwise nothing happens
///
/// # Examples
///
/// ```
/// use lastused_domain::{Dimension, MetricSample, Timestamp, UsageState};
/// use lastused_monitor::merge::{merge_samples, KnownState, PendingUpdates};
///
/// let mut known = KnownState::new();
/// known.insert("t1".into(), UsageState::new("t1", 100, 200, Timestamp::from_millis(1)));
///
/// let mut pending = PendingUpdates::new();
/// let samples = [MetricSample::new("t1", Timestamp::from_millis(2), 150)];
/// merge_samples(Dimension::BytesIn, &samples, &known, &mut pending);
///
/// assert_eq!(pending["t1"].last_bytes_in, 150);
/// assert_eq!(known["t1"].last_bytes_in, 100);
/// ```
pub fn merge_samples(
    dimension: Dimension,
    samples: &[MetricSample],
    known: &KnownState,
    pending: &mut PendingUpdates,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for sample in samples {
        let Some(known_state) = known.get(&sample.topic_name) else {
            // reported by the backend but not a monitored topic resource
            outcome.ignored += 1;
            continue;
        };

        if let Some(update) = pending.get_mut(&sample.topic_name) {
            update.apply(dimension, sample);
            outcome.merged += 1;
        } else if known_state.differs_from(dimension, sample) {
            let mut update = known_state.clone();
            update.apply(dimension, sample);
            tracing::debug!("{} changed: {}", dimension, update);
            pending.insert(sample.topic_name.clone(), update);
            outcome.merged += 1;
            outcome.newly_dirty += 1;
        } else {
            outcome.unchanged += 1;
        }
    }

    outcome
}
