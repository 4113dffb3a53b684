//! Orchestration: engine + stats + storage + clock as one owned context.
//!
//! The controller is the only writer of persistent state. After every
//! command it routes the engine's events -- `TimeRecorded` into the stats
//! accumulator, everything else straight through to the caller -- and
//! re-persists the session snapshot (or deletes the key when there is
//! nothing to resume). There are no globals: callers construct a
//! controller, use it, and drop it.

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, StorageError};
use crate::events::Event;
use crate::routine::{parse_routine, Routine};
use crate::session::{SessionEngine, SessionSnapshot, SessionStatus};
use crate::stats::StatsAccumulator;
use crate::storage::{Database, RoutineStore};

/// KV key holding the in-flight session snapshot.
pub const SESSION_KEY: &str = "session";
/// KV key holding the per-task statistics map.
pub const STATS_KEY: &str = "stats";

/// Owns one session end to end.
pub struct SessionController<C: Clock = SystemClock> {
    engine: SessionEngine,
    stats: StatsAccumulator,
    db: Database,
    clock: C,
}

impl SessionController<SystemClock> {
    /// Open the default on-disk database and restore the routine, stats,
    /// and any in-flight session from it.
    pub fn open() -> Result<Self, CoreError> {
        Self::with_clock(Database::open()?, SystemClock)
    }
}

impl<C: Clock> SessionController<C> {
    /// Build a controller over an already-open database, restoring
    /// persisted state. Corrupt payloads fall back to defaults; a stale
    /// `Running` snapshot is caught up silently (no notification events).
    pub fn with_clock(db: Database, clock: C) -> Result<Self, CoreError> {
        let routine = RoutineStore::new(&db).load();
        let stats = match db.kv_get(STATS_KEY)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            None => StatsAccumulator::default(),
        };
        let snapshot = db
            .kv_get(SESSION_KEY)?
            .and_then(|json| serde_json::from_str::<SessionSnapshot>(&json).ok());
        let engine = match snapshot {
            Some(snap) => {
                let now = clock.now_ms();
                let (engine, _events) = SessionEngine::restore(routine, snap, now);
                engine
            }
            None => SessionEngine::new(routine),
        };
        let controller = Self {
            engine,
            stats,
            db,
            clock,
        };
        // Re-sync: a restore may have landed Finished, clearing the key.
        controller.persist_snapshot()?;
        Ok(controller)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn status(&self) -> SessionStatus {
        self.engine.status()
    }

    pub fn display(&self) -> crate::display::DisplayState {
        self.engine.display()
    }

    pub fn routine(&self) -> &Routine {
        self.engine.routine()
    }

    pub fn stats(&self) -> &StatsAccumulator {
        &self.stats
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Vec<Event>, CoreError> {
        let now = self.clock.now_ms();
        let events = self.engine.start(now);
        self.apply(&events)?;
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>, CoreError> {
        let now = self.clock.now_ms();
        let events = self.engine.pause(now);
        self.apply(&events)?;
        Ok(events)
    }

    pub fn skip(&mut self) -> Result<Vec<Event>, CoreError> {
        let now = self.clock.now_ms();
        let events = self.engine.skip(now);
        self.apply(&events)?;
        Ok(events)
    }

    pub fn reset(&mut self) -> Result<Vec<Event>, CoreError> {
        let events = self.engine.reset();
        self.apply(&events)?;
        Ok(events)
    }

    /// Drive the countdown. Persistence failures here are swallowed: a
    /// slow or broken disk must not stall the tick cadence, and the next
    /// successful write repairs the stored state.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let events = self.engine.tick(now);
        let _ = self.apply(&events);
        events
    }

    /// Validate and persist an edited routine, then reset the session.
    ///
    /// # Errors
    ///
    /// A [`FormatError`](crate::error::FormatError) leaves the routine,
    /// session, and stats exactly as they were.
    pub fn save_routine(&mut self, text: &str) -> Result<Vec<Event>, CoreError> {
        let routine = parse_routine(text)?;
        RoutineStore::new(&self.db).save(&routine)?;
        let events = self.engine.set_routine(routine);
        self.apply(&events)?;
        Ok(events)
    }

    /// Wipe all recorded statistics.
    pub fn clear_stats(&mut self) -> Result<(), CoreError> {
        self.stats.clear();
        self.db.kv_delete(STATS_KEY)?;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, events: &[Event]) -> Result<(), CoreError> {
        let mut stats_dirty = false;
        for event in events {
            if let Event::TimeRecorded {
                task, elapsed_ms, ..
            } = event
            {
                self.stats.record(task, *elapsed_ms);
                stats_dirty = true;
            }
        }
        if stats_dirty {
            let json = serde_json::to_string(&self.stats).map_err(StorageError::from)?;
            self.db.kv_set(STATS_KEY, &json)?;
        }
        self.persist_snapshot()?;
        Ok(())
    }

    fn persist_snapshot(&self) -> Result<(), StorageError> {
        match self.engine.snapshot() {
            Some(snap) => {
                let json = serde_json::to_string(&snap)?;
                self.db.kv_set(SESSION_KEY, &json)
            }
            None => self.db.kv_delete(SESSION_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::FormatError;

    fn controller(start_ms: u64) -> SessionController<ManualClock> {
        let db = Database::open_memory().unwrap();
        let store = RoutineStore::new(&db);
        store
            .save(&parse_routine("Focus;1.5\nReview;0.5").unwrap())
            .unwrap();
        SessionController::with_clock(db, ManualClock::new(start_ms)).unwrap()
    }

    #[test]
    fn loads_persisted_routine() {
        let controller = controller(0);
        assert_eq!(controller.routine().len(), 2);
        assert_eq!(controller.display().task, "Focus");
    }

    #[test]
    fn ticks_accumulate_and_persist_stats() {
        let mut controller = controller(0);
        controller.start().unwrap();
        for i in 1..=10u64 {
            controller.clock.set(i * 1_000);
            controller.tick();
        }
        controller.clock.set(10_000);
        controller.pause().unwrap();
        assert_eq!(controller.stats().total_ms("Focus"), 10_000);

        let persisted = controller.db.kv_get(STATS_KEY).unwrap().unwrap();
        let stored: StatsAccumulator = serde_json::from_str(&persisted).unwrap();
        assert_eq!(stored.total_ms("Focus"), 10_000);
    }

    #[test]
    fn snapshot_key_tracks_the_session_state() {
        let mut controller = controller(0);
        assert!(controller.db.kv_get(SESSION_KEY).unwrap().is_none());

        controller.start().unwrap();
        assert!(controller.db.kv_get(SESSION_KEY).unwrap().is_some());

        controller.reset().unwrap();
        assert!(controller.db.kv_get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn reopening_resumes_a_paused_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routinely.db");
        {
            let db = Database::open_at(&path).unwrap();
            let mut controller =
                SessionController::with_clock(db, ManualClock::new(0)).unwrap();
            controller.start().unwrap();
            controller.clock.set(30_000);
            controller.pause().unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        let controller = SessionController::with_clock(db, ManualClock::new(500_000)).unwrap();
        assert_eq!(controller.status(), SessionStatus::Paused);
        // Default routine, first task is 2h; 30s were consumed.
        assert_eq!(controller.engine().remaining_ms(), 2 * 3_600_000 - 30_000);
    }

    #[test]
    fn reopening_long_after_the_last_task_lands_finished_and_clears_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routinely.db");
        {
            let db = Database::open_at(&path).unwrap();
            RoutineStore::new(&db)
                .save(&parse_routine("Only;0.5").unwrap())
                .unwrap();
            let mut controller = SessionController::with_clock(db, ManualClock::new(0)).unwrap();
            controller.start().unwrap();
        }
        // 30min task, reopened 31min later.
        let db = Database::open_at(&path).unwrap();
        let controller =
            SessionController::with_clock(db, ManualClock::new(31 * 60_000)).unwrap();
        assert_eq!(controller.status(), SessionStatus::Finished);
        assert!(controller.db.kv_get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn save_routine_resets_the_session() {
        let mut controller = controller(0);
        controller.start().unwrap();
        controller.clock.set(5_000);
        controller.tick();
        controller.save_routine("Deep Work;2").unwrap();
        assert_eq!(controller.status(), SessionStatus::Idle);
        assert_eq!(controller.routine().len(), 1);
        assert!(controller.db.kv_get(SESSION_KEY).unwrap().is_none());
        // Stats survive a routine edit.
        assert_eq!(controller.stats().total_ms("Focus"), 5_000);
    }

    #[test]
    fn invalid_edit_text_changes_nothing() {
        let mut controller = controller(0);
        controller.start().unwrap();
        let err = controller.save_routine("Focus;1.5\nReview;").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Format(FormatError::BadHours { line_no: 2, .. })
        ));
        assert_eq!(controller.routine().len(), 2);
        assert_eq!(controller.status(), SessionStatus::Running);
    }

    #[test]
    fn clear_stats_wipes_memory_and_storage() {
        let mut controller = controller(0);
        controller.start().unwrap();
        controller.clock.set(3_000);
        controller.tick();
        assert!(!controller.stats().is_empty());
        controller.clear_stats().unwrap();
        assert!(controller.stats().is_empty());
        assert!(controller.db.kv_get(STATS_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_stats_payload_falls_back_to_empty() {
        let db = Database::open_memory().unwrap();
        db.kv_set(STATS_KEY, "{broken").unwrap();
        let controller = SessionController::with_clock(db, ManualClock::new(0)).unwrap();
        assert!(controller.stats().is_empty());
    }

    #[test]
    fn corrupt_session_payload_starts_idle() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SESSION_KEY, "{broken").unwrap();
        let controller = SessionController::with_clock(db, ManualClock::new(0)).unwrap();
        assert_eq!(controller.status(), SessionStatus::Idle);
        // The unusable snapshot was dropped from storage.
        assert!(controller.db.kv_get(SESSION_KEY).unwrap().is_none());
    }
}
