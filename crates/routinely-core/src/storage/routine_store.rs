//! Persistence for the routine definition.

use super::Database;
use crate::error::StorageError;
use crate::routine::Routine;

/// KV key holding the serialized routine.
pub const ROUTINE_KEY: &str = "routine";

/// Loads and saves the routine definition as a single JSON value.
pub struct RoutineStore<'a> {
    db: &'a Database,
}

impl<'a> RoutineStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Read the persisted routine. An absent or unparseable value falls
    /// back to the built-in default -- never an error to the caller.
    pub fn load(&self) -> Routine {
        match self.db.kv_get(ROUTINE_KEY) {
            Ok(Some(json)) => {
                serde_json::from_str(&json).unwrap_or_else(|_| Routine::default_routine())
            }
            _ => Routine::default_routine(),
        }
    }

    /// Persist the routine wholesale (replace-whole-value semantics).
    pub fn save(&self, routine: &Routine) -> Result<(), StorageError> {
        let json = serde_json::to_string(routine)?;
        self.db.kv_set(ROUTINE_KEY, &json)
    }
}
