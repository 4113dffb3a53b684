//! The tuple the presentation layer renders: current task, remaining time
//! as `HH:MM:SS`, completion fraction, and the upcoming task.

use serde::{Deserialize, Serialize};

/// Placeholder task name once the routine is done.
pub const FINISHED_SENTINEL: &str = "finished";

/// Snapshot of everything a display needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Current task name, or [`FINISHED_SENTINEL`] past the last task.
    pub task: String,
    /// Remaining time formatted as `HH:MM:SS`.
    pub remaining: String,
    /// Completed fraction of the current task, 0.0 ..= 1.0.
    pub progress: f64,
    /// Next task's name; `None` on the last task.
    pub next_task: Option<String>,
}

/// Format a millisecond count as zero-padded `HH:MM:SS`.
pub fn format_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hms_pads_zeroes() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(999), "00:00:00");
        assert_eq!(format_hms(1_000), "00:00:01");
        assert_eq!(format_hms(61_000), "00:01:01");
        assert_eq!(format_hms(3_661_000), "01:01:01");
    }

    #[test]
    fn format_hms_exceeds_a_day() {
        assert_eq!(format_hms(100 * 3_600_000), "100:00:00");
    }
}
