//! Cumulative time spent per task name.
//!
//! Keyed by NAME, not index: renaming a task starts a fresh counter. That
//! is inherited, documented behavior -- stats survive routine edits for
//! tasks whose names are unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Monotonically growing task-name -> milliseconds map. Cleared only by
/// explicit user action; session resets leave it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsAccumulator {
    totals_ms: BTreeMap<String, u64>,
}

impl StatsAccumulator {
    /// Add elapsed time to a task's total, creating the entry if absent.
    pub fn record(&mut self, task: &str, elapsed_ms: u64) {
        if elapsed_ms == 0 {
            return;
        }
        let total = self.totals_ms.entry(task.to_string()).or_insert(0);
        *total = total.saturating_add(elapsed_ms);
    }

    pub fn clear(&mut self) {
        self.totals_ms.clear();
    }

    /// The full mapping, for display.
    pub fn snapshot(&self) -> &BTreeMap<String, u64> {
        &self.totals_ms
    }

    pub fn total_ms(&self, task: &str) -> u64 {
        self.totals_ms.get(task).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.totals_ms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_per_name() {
        let mut stats = StatsAccumulator::default();
        stats.record("Focus", 1_000);
        stats.record("Focus", 2_500);
        stats.record("Review", 100);
        assert_eq!(stats.total_ms("Focus"), 3_500);
        assert_eq!(stats.total_ms("Review"), 100);
        assert_eq!(stats.total_ms("Absent"), 0);
    }

    #[test]
    fn zero_increment_creates_no_entry() {
        let mut stats = StatsAccumulator::default();
        stats.record("Focus", 0);
        assert!(stats.is_empty());
    }

    #[test]
    fn clear_wipes_everything() {
        let mut stats = StatsAccumulator::default();
        stats.record("Focus", 1_000);
        stats.clear();
        assert!(stats.is_empty());
    }

    #[test]
    fn rapid_increments_never_lose_time() {
        let mut stats = StatsAccumulator::default();
        for _ in 0..1_000 {
            stats.record("Focus", 10);
        }
        assert_eq!(stats.total_ms("Focus"), 10_000);
    }

    #[test]
    fn totals_saturate_instead_of_wrapping() {
        let mut stats = StatsAccumulator::default();
        stats.record("Focus", u64::MAX);
        stats.record("Focus", 1);
        assert_eq!(stats.total_ms("Focus"), u64::MAX);
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let mut stats = StatsAccumulator::default();
        stats.record("Focus", 1_000);
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"Focus":1000}"#);
        let back: StatsAccumulator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
