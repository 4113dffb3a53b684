//! The routine model: an ordered list of named tasks with fixed durations,
//! plus the line-oriented `Name;Hours` edit format.
//!
//! A routine is replaced wholesale on edit, never mutated in place.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// A named unit of work with a fixed nominal duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl Task {
    pub fn new(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            duration_ms,
        }
    }

    /// Build a task from a decimal hours figure, as used by the edit format.
    pub fn from_hours(name: impl Into<String>, hours: f64) -> Self {
        Self::new(name, (hours * 3_600_000.0).round() as u64)
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_ms / 1000
    }

    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.duration_ms > 0
    }
}

/// The ordered task list making up one session.
///
/// Invariant: at least one task, every name non-empty, every duration
/// positive. Enforced on construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Task>", into = "Vec<Task>")]
pub struct Routine {
    tasks: Vec<Task>,
}

impl TryFrom<Vec<Task>> for Routine {
    type Error = FormatError;

    fn try_from(tasks: Vec<Task>) -> Result<Self, FormatError> {
        if tasks.is_empty() {
            return Err(FormatError::EmptyRoutine);
        }
        if let Some(bad) = tasks.iter().find(|t| !t.is_valid()) {
            return Err(FormatError::InvalidTask {
                name: bad.name.clone(),
            });
        }
        Ok(Self { tasks })
    }
}

impl From<Routine> for Vec<Task> {
    fn from(routine: Routine) -> Self {
        routine.tasks
    }
}

impl Routine {
    /// Validated constructor; see the type-level invariant.
    pub fn new(tasks: Vec<Task>) -> Result<Self, FormatError> {
        Self::try_from(tasks)
    }

    /// The built-in routine used when nothing has been persisted yet.
    pub fn default_routine() -> Self {
        Self {
            tasks: vec![
                Task::from_hours("Programming (Block 1)", 2.0),
                Task::from_hours("Reading", 1.0),
                Task::from_hours("Programming (Block 2)", 2.0),
                Task::from_hours("Language study", 1.5),
            ],
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.tasks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.duration_ms))
    }

    /// Render back into the `Name;Hours` edit format, one task per line.
    ///
    /// Round trips through [`parse_routine`] for durations down to
    /// sub-second precision (hours are printed with up to three decimals).
    pub fn to_edit_text(&self) -> String {
        self.tasks
            .iter()
            .map(|t| format!("{};{}", t.name, format_hours(t.duration_ms)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Routine {
    fn default() -> Self {
        Self::default_routine()
    }
}

fn format_hours(duration_ms: u64) -> String {
    let hours = duration_ms as f64 / 3_600_000.0;
    let text = format!("{hours:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Parse the line-oriented edit format: one task per line, `Name;Hours`,
/// fields trimmed, blank lines ignored, `.` or `,` as the decimal
/// separator.
///
/// # Errors
///
/// Returns a [`FormatError`] naming the offending line when a line does not
/// split into exactly two fields, the name is empty, the hours field is not
/// a positive finite number, or no tasks remain at all.
pub fn parse_routine(text: &str) -> Result<Routine, FormatError> {
    let mut tasks = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(';');
        let (name, hours_field) = match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(hours), None) => (name.trim(), hours.trim()),
            _ => {
                return Err(FormatError::FieldCount {
                    line_no,
                    line: line.to_string(),
                })
            }
        };
        if name.is_empty() {
            return Err(FormatError::EmptyName { line_no });
        }
        let hours: f64 = hours_field
            .replace(',', ".")
            .parse()
            .map_err(|_| FormatError::BadHours {
                line_no,
                value: hours_field.to_string(),
            })?;
        if !hours.is_finite() || hours <= 0.0 {
            return Err(FormatError::BadHours {
                line_no,
                value: hours_field.to_string(),
            });
        }
        tasks.push(Task::from_hours(name, hours));
    }
    Routine::new(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routine_shape() {
        let routine = Routine::default_routine();
        assert_eq!(routine.len(), 4);
        assert_eq!(routine.task(0).unwrap().duration_secs(), 2 * 60 * 60);
        assert_eq!(routine.task(3).unwrap().duration_secs(), 5400);
        assert_eq!(
            routine.total_duration_ms(),
            (2 + 1 + 2) * 3_600_000 + 5_400_000
        );
    }

    #[test]
    fn parse_two_tasks() {
        let routine = parse_routine("Focus;1.5\nReview;0.5").unwrap();
        assert_eq!(routine.len(), 2);
        assert_eq!(routine.task(0).unwrap().name, "Focus");
        assert_eq!(routine.task(0).unwrap().duration_secs(), 5400);
        assert_eq!(routine.task(1).unwrap().duration_secs(), 1800);
    }

    #[test]
    fn parse_accepts_comma_decimal_separator() {
        let routine = parse_routine("Focus;1,5").unwrap();
        assert_eq!(routine.task(0).unwrap().duration_secs(), 5400);
    }

    #[test]
    fn parse_trims_fields_and_skips_blank_lines() {
        let routine = parse_routine("  Focus ; 1.5  \n\n   \nReview;2\n").unwrap();
        assert_eq!(routine.len(), 2);
        assert_eq!(routine.task(0).unwrap().name, "Focus");
        assert_eq!(routine.task(1).unwrap().name, "Review");
    }

    #[test]
    fn missing_hours_field_names_second_line() {
        let err = parse_routine("Focus;1.5\nReview;").unwrap_err();
        assert_eq!(
            err,
            FormatError::BadHours {
                line_no: 2,
                value: String::new(),
            }
        );
    }

    #[test]
    fn too_many_fields_is_rejected() {
        let err = parse_routine("Focus;1.5;extra").unwrap_err();
        assert!(matches!(err, FormatError::FieldCount { line_no: 1, .. }));
    }

    #[test]
    fn single_field_is_rejected() {
        let err = parse_routine("Focus").unwrap_err();
        assert!(matches!(err, FormatError::FieldCount { line_no: 1, .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = parse_routine(";1.5").unwrap_err();
        assert_eq!(err, FormatError::EmptyName { line_no: 1 });
    }

    #[test]
    fn zero_and_negative_hours_are_rejected() {
        assert!(matches!(
            parse_routine("Focus;0").unwrap_err(),
            FormatError::BadHours { line_no: 1, .. }
        ));
        assert!(matches!(
            parse_routine("Focus;-2").unwrap_err(),
            FormatError::BadHours { line_no: 1, .. }
        ));
    }

    #[test]
    fn blank_text_is_an_empty_routine() {
        assert_eq!(parse_routine("").unwrap_err(), FormatError::EmptyRoutine);
        assert_eq!(parse_routine("\n  \n").unwrap_err(), FormatError::EmptyRoutine);
    }

    #[test]
    fn edit_text_round_trips() {
        let routine = Routine::default_routine();
        let reparsed = parse_routine(&routine.to_edit_text()).unwrap();
        assert_eq!(reparsed, routine);
    }

    #[test]
    fn json_round_trips() {
        let routine = parse_routine("Focus;1.5\nReview;0.5").unwrap();
        let json = serde_json::to_string(&routine).unwrap();
        let back: Routine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, routine);
    }

    #[test]
    fn deserialization_enforces_invariants() {
        assert!(serde_json::from_str::<Routine>("[]").is_err());
        assert!(serde_json::from_str::<Routine>(
            r#"[{"name":"","duration_ms":1000}]"#
        )
        .is_err());
        assert!(serde_json::from_str::<Routine>(
            r#"[{"name":"Focus","duration_ms":0}]"#
        )
        .is_err());
    }
}
