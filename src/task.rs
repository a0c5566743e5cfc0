//! Task record and its persisted row form.
//!
//! A `TaskRecord` is the validated in-memory shape of one task. `TaskRow` is
//! the positional nine-field form written to disk; converting a row back into
//! a record re-checks every invariant, so hand-edited or corrupt rows are
//! caught at the storage boundary.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::fields::{format_due_date, parse_due_date, Status, UNDECIDED};
use crate::users::UserId;

pub type TaskId = u64;

/// One task on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub status: Status,
    pub person_in_charge: UserId,
    pub due_date: Option<NaiveDate>,
    pub creator: UserId,
    /// Last user to change the task. `None` until the first edit.
    pub editor: Option<UserId>,
    pub created_at: NaiveDateTime,
    pub additional_info: String,
}

impl TaskRecord {
    /// Due date as shown to users.
    pub fn due_label(&self) -> String {
        match self.due_date {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => UNDECIDED.to_string(),
        }
    }

    /// Due date strictly before `today`. Undated tasks are never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|d| d < today)
    }

    /// Coarse human-readable distance to the due date, `None` when undated.
    pub fn due_summary(&self, today: NaiveDate) -> Option<String> {
        let days = (self.due_date? - today).num_days();
        let plural = |n: i64| if n == 1 { "" } else { "s" };
        Some(match days {
            d if d < 0 => format!("Overdue by {} day{}", -d, plural(-d)),
            0 => "Due today".to_string(),
            1 => "Due tomorrow".to_string(),
            d if d < 7 => format!("Due in {d} days"),
            d if d < 30 => {
                let weeks = d / 7;
                format!("Due in {weeks} week{}", plural(weeks))
            }
            d => {
                let months = d / 30;
                format!("Due in {months} month{}", plural(months))
            }
        })
    }
}

/// Persisted row: `(id, title, status, person_in_charge, created_at,
/// due_date, creator, editor, additional_info)`.
///
/// Serialises as a JSON array so the column order is the file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow(
    pub TaskId,
    pub String,
    pub String,
    pub UserId,
    pub NaiveDateTime,
    pub String,
    pub UserId,
    pub Option<UserId>,
    pub String,
);

impl From<&TaskRecord> for TaskRow {
    fn from(t: &TaskRecord) -> Self {
        TaskRow(
            t.id,
            t.title.clone(),
            t.status.as_str().to_string(),
            t.person_in_charge,
            t.created_at,
            format_due_date(t.due_date),
            t.creator,
            t.editor,
            t.additional_info.clone(),
        )
    }
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = BoardError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let TaskRow(id, title, status, person_in_charge, created_at, due, creator, editor, info) = row;
        if title.trim().is_empty() {
            return Err(BoardError::InvalidTitle);
        }
        Ok(TaskRecord {
            id,
            title,
            status: status.parse()?,
            person_in_charge,
            due_date: parse_due_date(&due)?,
            creator,
            editor,
            created_at,
            additional_info: info,
        })
    }
}
