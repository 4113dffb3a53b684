use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::display::DisplayState;

/// Every state change in the session produces an Event.
///
/// The presentation layer maps `TaskSwitched` / `RoutineFinished` to
/// notifications and renders `DisplayUpdated`; the controller routes
/// `TimeRecorded` into the stats accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        task_index: usize,
        task: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionSkipped {
        from_index: usize,
        to_index: usize,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// The countdown crossed into the next task.
    TaskSwitched {
        from_index: usize,
        to_index: usize,
        task: String,
        at: DateTime<Utc>,
    },
    /// The last task finished.
    RoutineFinished {
        at: DateTime<Utc>,
    },
    /// Wall-clock time actually spent on a task since the previous tick.
    TimeRecorded {
        task: String,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    DisplayUpdated {
        display: DisplayState,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether the presentation layer should play a notification for this
    /// event.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Event::TaskSwitched { .. } | Event::RoutineFinished { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_by_type() {
        let event = Event::RoutineFinished { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RoutineFinished");
    }

    #[test]
    fn only_switch_and_finish_notify() {
        assert!(Event::RoutineFinished { at: Utc::now() }.is_notification());
        assert!(!Event::SessionReset { at: Utc::now() }.is_notification());
    }
}
