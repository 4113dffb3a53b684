//! # Routinely Core Library
//!
//! Core business logic for Routinely, a routine timer that walks through a
//! fixed ordered list of named tasks, counting each one down and advancing
//! automatically when time runs out.
//!
//! ## Architecture
//!
//! - **Session engine**: a wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()` for progress updates. Remaining
//!   time is always derived from a fixed start anchor, never decremented
//!   per tick, so slow or skipped ticks cannot accumulate drift.
//! - **Storage**: SQLite-backed key-value store holding the routine
//!   definition, the in-flight session snapshot, and per-task statistics;
//!   TOML-based configuration.
//! - **Controller**: owns the engine, stats, and storage, routes events and
//!   persists state after every command.
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: core countdown state machine
//! - [`SessionController`]: engine + stats + storage orchestration
//! - [`Routine`]: the ordered task list and its `Name;Hours` edit format
//! - [`StatsAccumulator`]: cumulative time spent per task name
//! - [`Database`]: key-value persistence

pub mod clock;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod events;
pub mod routine;
pub mod session;
pub mod stats;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use controller::SessionController;
pub use display::{format_hms, DisplayState, FINISHED_SENTINEL};
pub use error::{ConfigError, CoreError, FormatError, StorageError};
pub use events::Event;
pub use routine::{parse_routine, Routine, Task};
pub use session::{SessionEngine, SessionSnapshot, SessionStatus};
pub use stats::StatsAccumulator;
pub use storage::{Database, RoutineStore};
