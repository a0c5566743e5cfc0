//! Due-date notifications.
//!
//! The scanner reads the raw task rows positionally rather than going through
//! the store, so it also sees rows the store would refuse. Only the id and
//! the due date columns must be readable; every other column is shown as
//! stored. A row without a usable id or due date produces no notice.
//!
//! A due date counts through its last instant, 23:59:59.999999. A task is
//! reported when that day is before today (overdue) or falls between today
//! and today plus the horizon, both ends included.

use std::fmt;
use std::path::Path;

use chrono::{Days, NaiveDate, NaiveDateTime, TimeDelta};
use serde_json::Value;
use tracing::debug;

use crate::db::Database;
use crate::error::StorageError;
use crate::fields::parse_due_date;
use crate::task::TaskId;
use crate::users::{display_name, UserDirectory};

pub const DEFAULT_HORIZON_DAYS: u32 = 14;

/// Time left or time past, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDelta {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl DueDelta {
    /// Split a non-negative duration into days, hours and minutes.
    fn from_duration(delta: TimeDelta) -> Self {
        let secs = delta.num_seconds().max(0);
        DueDelta {
            days: secs / 86_400,
            hours: secs % 86_400 / 3_600,
            minutes: secs % 3_600 / 60,
        }
    }
}

impl fmt::Display for DueDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {:02}h {:02}m", self.days, self.hours, self.minutes)
    }
}

/// How a task relates to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueNotice {
    Overdue(DueDelta),
    /// Due on today's date. Days is always 0.
    DueToday(DueDelta),
    DueIn(DueDelta),
}

impl DueNotice {
    pub fn delta(&self) -> DueDelta {
        match *self {
            DueNotice::Overdue(d) | DueNotice::DueToday(d) | DueNotice::DueIn(d) => d,
        }
    }
}

impl fmt::Display for DueNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueNotice::Overdue(d) => write!(f, "overdue by {d}"),
            DueNotice::DueToday(d) => write!(f, "due today (in {d})"),
            DueNotice::DueIn(d) => write!(f, "due in {d}"),
        }
    }
}

/// One overdue or upcoming task, ready to show to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
    pub task_id: TaskId,
    pub title: String,
    /// Status text as stored.
    pub status: String,
    pub person_in_charge: String,
    pub creator: String,
    pub editor: String,
    /// `YYYY-MM-DD HH:MM:SS`, or the stored text when it is not a timestamp.
    pub created_at: String,
    pub due_date: String,
    pub additional_info: String,
    pub notice: DueNotice,
}

impl fmt::Display for NotificationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Task {}]", self.notice)?;
        writeln!(f, "Task ID: {}", self.task_id)?;
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Person in charge: {}", self.person_in_charge)?;
        writeln!(f, "Creation date: {}", self.created_at)?;
        writeln!(f, "Due date: {}", self.due_date)?;
        writeln!(f, "Creator: {}", self.creator)?;
        writeln!(f, "Editor: {}", self.editor)?;
        write!(f, "Additional information: {}", self.additional_info)
    }
}

const MISSING: &str = "-";

/// A text column as stored; numbers and booleans are shown as written.
fn column_text(row: &[Value], index: usize) -> String {
    match row.get(index) {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => MISSING.to_string(),
    }
}

/// A user column resolved to a display name. Digit strings count as ids.
fn column_user(row: &[Value], index: usize, directory: &impl UserDirectory) -> String {
    match row.get(index) {
        None | Some(Value::Null) => display_name(directory, None),
        Some(v) => match v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())) {
            Some(id) => display_name(directory, Some(id)),
            None => column_text(row, index),
        },
    }
}

fn column_timestamp(row: &[Value], index: usize) -> String {
    let text = column_text(row, index);
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or(text)
}

fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
}

/// Classify a due date against `now`, or `None` if it needs no notice.
pub fn classify(due: NaiveDate, now: NaiveDateTime, horizon_days: u32) -> Option<DueNotice> {
    let today = now.date();
    let limit = today
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);
    let due_end = end_of_day(due)?;

    if due < today {
        Some(DueNotice::Overdue(DueDelta::from_duration(now - due_end)))
    } else if due <= limit {
        let delta = DueDelta::from_duration(due_end - now);
        if due == today {
            Some(DueNotice::DueToday(DueDelta { days: 0, ..delta }))
        } else {
            Some(DueNotice::DueIn(delta))
        }
    } else {
        None
    }
}

/// Scans the task rows for overdue and upcoming work.
#[derive(Debug, Clone, Copy)]
pub struct NotificationScanner {
    pub horizon_days: u32,
}

impl Default for NotificationScanner {
    fn default() -> Self {
        NotificationScanner { horizon_days: DEFAULT_HORIZON_DAYS }
    }
}

impl NotificationScanner {
    pub fn new(horizon_days: u32) -> Self {
        NotificationScanner { horizon_days }
    }

    /// Notices for every row in `db`, in storage order.
    pub fn scan(
        &self,
        db: &Database,
        directory: &impl UserDirectory,
        now: NaiveDateTime,
    ) -> Vec<NotificationEntry> {
        db.rows()
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| self.entry(i, raw, directory, now))
            .collect()
    }

    /// Scan the task file at `path`. A missing file yields no notices.
    pub fn scan_file(
        &self,
        path: &Path,
        directory: &impl UserDirectory,
        now: NaiveDateTime,
    ) -> Result<Vec<NotificationEntry>, StorageError> {
        if !path.exists() {
            debug!(path = %path.display(), "no task file, nothing to notify");
            return Ok(Vec::new());
        }
        let db = Database::open(path)?;
        Ok(self.scan(&db, directory, now))
    }

    fn entry(
        &self,
        index: usize,
        raw: &Value,
        directory: &impl UserDirectory,
        now: NaiveDateTime,
    ) -> Option<NotificationEntry> {
        let Some(row) = raw.as_array() else {
            debug!(row = index, "task row is not an array, no notice");
            return None;
        };
        let Some(id) = row.first().and_then(Value::as_u64) else {
            debug!(row = index, "task row has no readable id, no notice");
            return None;
        };
        let due_text = row.get(5).and_then(Value::as_str)?.trim();
        let due = match parse_due_date(due_text) {
            Ok(Some(d)) => d,
            Ok(None) => return None,
            Err(e) => {
                debug!(task = id, error = %e, "due date unreadable, no notice");
                return None;
            }
        };
        let notice = classify(due, now, self.horizon_days)?;
        Some(NotificationEntry {
            task_id: id,
            title: column_text(row, 1),
            status: column_text(row, 2),
            person_in_charge: column_user(row, 3, directory),
            creator: column_user(row, 6, directory),
            editor: column_user(row, 7, directory),
            created_at: column_timestamp(row, 4),
            due_date: due_text.to_string(),
            additional_info: column_text(row, 8),
            notice,
        })
    }
}
