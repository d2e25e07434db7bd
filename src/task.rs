//! Task data structure and completion accounting.
//!
//! This module defines the wire-level `Task` struct as the backend serves it,
//! plus the derived completion percentage used by the home screen cards and
//! the detail screen progress bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single actionable item within a todo list.
///
/// Tasks are owned by exactly one todo. The server copy is authoritative:
/// the client discards and replaces its in-memory tasks wholesale on every
/// refetch and never edits them in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Task {
    /// Due date rendered for list rows, or a dash when unset.
    pub fn format_date(&self) -> String {
        match self.date {
            Some(d) => d.format("%Y-%m-%d %H:%M").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Percentage of completed tasks, rounded to the nearest whole number.
///
/// An empty list counts as zero completed out of one, so it yields 0
/// rather than dividing by zero.
pub fn completion_percentage(tasks: &[Task]) -> u8 {
    let total = tasks.len().max(1) as f64;
    let completed = tasks.iter().filter(|t| t.completed).count() as f64;
    (completed / total * 100.0).round() as u8
}
