//! The drift-corrected countdown state machine.
//!
//! The engine is a wall-clock-based state machine with no internal thread
//! and no hidden clock: every command takes the current epoch milliseconds
//! explicitly, and the caller is responsible for invoking [`tick`] while
//! the session runs.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v (last task done)
//!        Finished
//! ```
//!
//! ## Drift correction
//!
//! While `Running`, remaining time is *derived*, never stored: it is
//! recomputed on every tick as `duration - (now - anchor)`, clamped to
//! zero, where the anchor is fixed at start/resume time. Repeated
//! per-tick subtraction would accumulate rounding error from slow or
//! skipped ticks; the anchor form cannot.
//!
//! [`tick`]: SessionEngine::tick

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::display::{format_hms, DisplayState, FINISHED_SENTINEL};
use crate::events::Event;
use crate::routine::Routine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Persisted subset of the engine state, enough to resume after a reload.
///
/// Only `Running` and `Paused` sessions are worth a snapshot; `Idle` and
/// `Finished` are represented by the absence of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionSnapshot {
    Paused {
        current_index: usize,
        remaining_ms: u64,
    },
    Running {
        current_index: usize,
        anchor_epoch_ms: u64,
        duration_ms: u64,
    },
}

/// Core countdown state machine.
///
/// Commands return the list of side-effect [`Event`]s they produced; the
/// engine itself performs no I/O.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    routine: Routine,
    current_index: usize,
    status: SessionStatus,
    /// Remaining time in milliseconds for the current task. Authoritative
    /// while `Paused`; while `Running` it is a cache of the last derived
    /// value.
    remaining_ms: u64,
    /// Wall-clock anchor the remaining time is derived from while
    /// `Running`: `remaining = duration - (now - anchor)`.
    anchor_epoch_ms: Option<u64>,
    /// Timestamp of the previous tick, for wall-clock stats deltas.
    last_tick_epoch_ms: Option<u64>,
}

impl SessionEngine {
    /// Create an engine at the start of the routine, `Idle`, with the first
    /// task's full duration remaining.
    pub fn new(routine: Routine) -> Self {
        let remaining_ms = routine.task(0).map(|t| t.duration_ms).unwrap_or(0);
        Self {
            routine,
            current_index: 0,
            status: SessionStatus::Idle,
            remaining_ms,
            anchor_epoch_ms: None,
            last_tick_epoch_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    pub fn current_task(&self) -> Option<&crate::routine::Task> {
        self.routine.task(self.current_index)
    }

    /// The display tuple for the presentation layer.
    pub fn display(&self) -> DisplayState {
        match self.current_task() {
            Some(task) => DisplayState {
                task: task.name.clone(),
                remaining: format_hms(self.remaining_ms),
                progress: if task.duration_ms == 0 {
                    0.0
                } else {
                    1.0 - self.remaining_ms as f64 / task.duration_ms as f64
                },
                next_task: self
                    .routine
                    .task(self.current_index + 1)
                    .map(|t| t.name.clone()),
            },
            None => DisplayState {
                task: FINISHED_SENTINEL.to_string(),
                remaining: format_hms(0),
                progress: 1.0,
                next_task: None,
            },
        }
    }

    /// Persistable state, or `None` when there is nothing worth resuming.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        match self.status {
            SessionStatus::Running => Some(SessionSnapshot::Running {
                current_index: self.current_index,
                anchor_epoch_ms: self.anchor_epoch_ms?,
                duration_ms: self.current_task()?.duration_ms,
            }),
            SessionStatus::Paused => Some(SessionSnapshot::Paused {
                current_index: self.current_index,
                remaining_ms: self.remaining_ms,
            }),
            SessionStatus::Idle | SessionStatus::Finished => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from `Idle` or resume from `Paused`. No-op otherwise.
    ///
    /// A remaining time of zero re-arms to the current task's full
    /// duration. The anchor is placed at `now - (duration - remaining)` so
    /// the derived remaining time continues exactly where it left off.
    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        match self.status {
            SessionStatus::Idle | SessionStatus::Paused => {
                let Some((name, duration_ms)) = self.current_task_info() else {
                    // Routine shrank under the stored index.
                    self.force_finished();
                    return vec![self.display_event()];
                };
                if self.remaining_ms == 0 || self.remaining_ms > duration_ms {
                    self.remaining_ms = duration_ms;
                }
                let consumed = duration_ms.saturating_sub(self.remaining_ms);
                self.anchor_epoch_ms = Some(now_ms.saturating_sub(consumed));
                self.last_tick_epoch_ms = Some(now_ms);
                self.status = SessionStatus::Running;
                vec![
                    Event::SessionStarted {
                        task_index: self.current_index,
                        task: name,
                        duration_ms,
                        at: Utc::now(),
                    },
                    self.display_event(),
                ]
            }
            SessionStatus::Running | SessionStatus::Finished => Vec::new(),
        }
    }

    /// Advance the countdown. Call periodically while `Running`; no-op in
    /// any other state.
    ///
    /// Emits a [`Event::TimeRecorded`] carrying the wall-clock delta since
    /// the previous tick -- not the remaining-time delta, which would
    /// under-count whenever ticks are skipped. When the derived remaining
    /// time reaches zero the engine advances to the next task (or
    /// finishes).
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        if self.status != SessionStatus::Running {
            return Vec::new();
        }
        let Some((name, duration_ms)) = self.current_task_info() else {
            self.force_finished();
            return vec![self.display_event()];
        };

        let mut events = Vec::new();
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed > 0 {
                events.push(Event::TimeRecorded {
                    task: name,
                    elapsed_ms: elapsed,
                    at: Utc::now(),
                });
            }
        }
        self.last_tick_epoch_ms = Some(now_ms);

        let anchor = self.anchor_epoch_ms.unwrap_or(now_ms);
        let remaining = duration_ms.saturating_sub(now_ms.saturating_sub(anchor));
        let changed = remaining != self.remaining_ms;
        self.remaining_ms = remaining;

        if remaining == 0 {
            events.extend(self.advance(now_ms, true));
        } else if changed {
            events.push(self.display_event());
        }
        events
    }

    /// Freeze the countdown. Only meaningful from `Running`; pausing twice
    /// is a no-op the second time (no double stats flush, no double
    /// snapshot).
    pub fn pause(&mut self, now_ms: u64) -> Vec<Event> {
        if self.status != SessionStatus::Running {
            return Vec::new();
        }
        let mut events = Vec::new();
        if let Some((name, duration_ms)) = self.current_task_info() {
            if let Some(last) = self.last_tick_epoch_ms {
                let elapsed = now_ms.saturating_sub(last);
                if elapsed > 0 {
                    events.push(Event::TimeRecorded {
                        task: name,
                        elapsed_ms: elapsed,
                        at: Utc::now(),
                    });
                }
            }
            let anchor = self.anchor_epoch_ms.unwrap_or(now_ms);
            self.remaining_ms = duration_ms.saturating_sub(now_ms.saturating_sub(anchor));
        }
        self.status = SessionStatus::Paused;
        self.anchor_epoch_ms = None;
        self.last_tick_epoch_ms = None;
        events.push(Event::SessionPaused {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        });
        events.push(self.display_event());
        events
    }

    /// Force an immediate advance, regardless of remaining time. Stats are
    /// not credited beyond what ticks already recorded. Skipping the last
    /// task still fires [`Event::RoutineFinished`].
    pub fn skip(&mut self, now_ms: u64) -> Vec<Event> {
        if self.status == SessionStatus::Finished {
            return Vec::new();
        }
        let from = self.current_index;
        let advanced = self.advance(now_ms, true);
        let mut events = vec![Event::SessionSkipped {
            from_index: from,
            to_index: self.current_index,
            at: Utc::now(),
        }];
        events.extend(advanced);
        events
    }

    /// Back to `Idle` at the first task, full duration remaining. Valid
    /// from any state.
    pub fn reset(&mut self) -> Vec<Event> {
        self.current_index = 0;
        self.status = SessionStatus::Idle;
        self.remaining_ms = self.routine.task(0).map(|t| t.duration_ms).unwrap_or(0);
        self.anchor_epoch_ms = None;
        self.last_tick_epoch_ms = None;
        vec![Event::SessionReset { at: Utc::now() }, self.display_event()]
    }

    /// Replace the routine wholesale and reset the session (editing the
    /// routine mid-session invalidates progress).
    pub fn set_routine(&mut self, routine: Routine) -> Vec<Event> {
        self.routine = routine;
        self.reset()
    }

    /// Rebuild an engine from a persisted snapshot.
    ///
    /// A `Running` snapshot has its remaining time recomputed from the
    /// stored anchor; if the task would already have finished the engine
    /// advances *silently* -- no `TaskSwitched` or `RoutineFinished`
    /// notification events -- so reopening the program does not ring a
    /// stale notification. An index beyond the routine is clamped to
    /// `Finished`.
    pub fn restore(routine: Routine, snapshot: SessionSnapshot, now_ms: u64) -> (Self, Vec<Event>) {
        let mut engine = Self::new(routine);
        match snapshot {
            SessionSnapshot::Paused {
                current_index,
                remaining_ms,
            } => {
                let Some(duration_ms) =
                    engine.routine.task(current_index).map(|t| t.duration_ms)
                else {
                    engine.force_finished();
                    let event = engine.display_event();
                    return (engine, vec![event]);
                };
                engine.current_index = current_index;
                engine.remaining_ms = remaining_ms.min(duration_ms);
                engine.status = SessionStatus::Paused;
                let event = engine.display_event();
                (engine, vec![event])
            }
            SessionSnapshot::Running {
                current_index,
                anchor_epoch_ms,
                duration_ms,
            } => {
                if engine.routine.task(current_index).is_none() {
                    engine.force_finished();
                    let event = engine.display_event();
                    return (engine, vec![event]);
                }
                engine.current_index = current_index;
                let remaining =
                    duration_ms.saturating_sub(now_ms.saturating_sub(anchor_epoch_ms));
                let events = if remaining > 0 {
                    engine.remaining_ms = remaining;
                    engine.start(now_ms)
                } else {
                    // The task ran out while the program was closed.
                    engine.advance(now_ms, false)
                };
                (engine, events)
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move to the next task and auto-continue, or finish the routine.
    /// `notify` gates the `TaskSwitched` / `RoutineFinished` events, which
    /// restore suppresses.
    fn advance(&mut self, now_ms: u64, notify: bool) -> Vec<Event> {
        let from = self.current_index;
        if self.current_index + 1 < self.routine.len() {
            self.current_index += 1;
            self.status = SessionStatus::Idle;
            self.remaining_ms = 0; // start() re-arms to the full duration
            self.anchor_epoch_ms = None;
            self.last_tick_epoch_ms = None;
            let mut events = Vec::new();
            if notify {
                if let Some(task) = self.routine.task(self.current_index) {
                    events.push(Event::TaskSwitched {
                        from_index: from,
                        to_index: self.current_index,
                        task: task.name.clone(),
                        at: Utc::now(),
                    });
                }
            }
            // No idle gap between tasks.
            events.extend(self.start(now_ms));
            events
        } else {
            self.force_finished();
            let mut events = Vec::new();
            if notify {
                events.push(Event::RoutineFinished { at: Utc::now() });
            }
            events.push(self.display_event());
            events
        }
    }

    fn force_finished(&mut self) {
        self.current_index = self.routine.len();
        self.status = SessionStatus::Finished;
        self.remaining_ms = 0;
        self.anchor_epoch_ms = None;
        self.last_tick_epoch_ms = None;
    }

    fn current_task_info(&self) -> Option<(String, u64)> {
        self.routine
            .task(self.current_index)
            .map(|t| (t.name.clone(), t.duration_ms))
    }

    fn display_event(&self) -> Event {
        Event::DisplayUpdated {
            display: self.display(),
            at: Utc::now(),
        }
    }
}
