//! Statistics collected across reconciliation cycles

use crate::Skip;
use std::collections::HashMap;
use std::time::Duration;

/// What happened during one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Topics loaded into known state
    pub topics_known: usize,

    /// Topics that got zero-valued usage state this cycle
    pub bootstrapped: usize,

    /// Resources excluded from the cycle, per reason
    pub skipped: HashMap<Skip, usize>,

    /// Samples for topics not in known state
    pub samples_ignored: usize,

    /// Samples folded into a pending update
    pub samples_merged: usize,

    /// Topics with a pending update after both queries
    pub topics_dirty: usize,

    /// Patches issued by the state writer
    pub topics_written: usize,
}

impl CycleReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an excluded resource
    pub fn record_skip(&mut self, reason: Skip) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    /// Resources excluded for any reason
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "{} known, {} bootstrapped, {} skipped, {} samples ignored, {} dirty, {} written",
            self.topics_known,
            self.bootstrapped,
            self.total_skipped(),
            self.samples_ignored,
            self.topics_dirty,
            self.topics_written
        )
    }
}

/// Cumulative statistics since the monitor started
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    /// Completed cycles
    pub cycle_count: usize,

    /// Topics bootstrapped over all cycles
    pub total_bootstrapped: usize,

    /// Patches issued by the state writer over all cycles
    pub total_written: usize,

    /// Time spent inside cycles (waits excluded)
    pub total_runtime: Duration,

    /// Report of the most recent cycle
    pub last_cycle: Option<CycleReport>,
}

impl MonitorStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed cycle
    pub fn record_cycle(&mut self, report: &CycleReport, elapsed: Duration) {
        self.cycle_count += 1;
        self.total_bootstrapped += report.bootstrapped;
        self.total_written += report.topics_written;
        self.total_runtime += elapsed;
        self.last_cycle = Some(report.clone());
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Usage Monitor Summary".to_string(),
            "=====================".to_string(),
            format!("Cycles: {}", self.cycle_count),
            format!("Total runtime: {:.1}s", self.total_runtime.as_secs_f64()),
            format!("Topics bootstrapped: {}", self.total_bootstrapped),
            format!("Usage updates written: {}", self.total_written),
        ];

        if let Some(last) = &self.last_cycle {
            lines.push(format!("Last cycle: {}", last.summary()));
        }

        lines.join("\n")
    }
}
