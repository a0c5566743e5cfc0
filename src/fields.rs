//! Enumerations and field types for the task board.
//!
//! The board has exactly four columns. `Status` is the only way a column is
//! represented in memory, so an unknown column name can never reach a record.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;

use crate::error::BoardError;

/// Board column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    ToDo,
    InProgress,
    WaitingReview,
    Finished,
}

impl Status {
    /// All columns in board order.
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::InProgress,
        Status::WaitingReview,
        Status::Finished,
    ];

    /// Label used on screen and in the persisted rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::ToDo => "To-Do",
            Status::InProgress => "In Progress",
            Status::WaitingReview => "Waiting Review",
            Status::Finished => "Finished",
        }
    }

    /// Map the menu codes 1-4 onto columns.
    pub fn from_code(code: u8) -> Option<Status> {
        match code {
            1 => Some(Status::ToDo),
            2 => Some(Status::InProgress),
            3 => Some(Status::WaitingReview),
            4 => Some(Status::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the display label or the variant name, ignoring case, spaces,
/// hyphens and underscores ("To-Do", "todo", "in_progress", "WaitingReview").
impl FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "todo" => Ok(Status::ToDo),
            "inprogress" => Ok(Status::InProgress),
            "waitingreview" => Ok(Status::WaitingReview),
            "finished" => Ok(Status::Finished),
            _ => Err(BoardError::InvalidStatus(s.to_string())),
        }
    }
}

/// Parse status input from the CLI: either a menu code (1-4) or a name.
pub fn parse_status_input(s: &str) -> Result<Status, BoardError> {
    let trimmed = s.trim();
    if let Ok(code) = trimmed.parse::<u8>() {
        return Status::from_code(code).ok_or_else(|| BoardError::InvalidStatus(trimmed.to_string()));
    }
    trimmed.parse()
}

/// Text shown for a task without a due date.
pub const UNDECIDED: &str = "Undecided";

/// Check the `YYYY-MM-DD` shape: 4-digit year, 2-digit month and day.
pub fn is_date_shape(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == 3
        && [4, 2, 2]
            .iter()
            .zip(&parts)
            .all(|(&len, p)| p.len() == len && p.chars().all(|c| c.is_ascii_digit()))
}

/// Parse due date input.
///
/// Blank text and `Undecided` mean "no due date". Anything else must have
/// the `YYYY-MM-DD` shape and name a real calendar day.
pub fn parse_due_date(s: &str) -> Result<Option<NaiveDate>, BoardError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(UNDECIDED) {
        return Ok(None);
    }
    if !is_date_shape(s) {
        return Err(BoardError::InvalidDueDateFormat(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BoardError::InvalidDueDateFormat(s.to_string()))
}

/// Format an optional due date the way it is persisted (`""` when undecided).
pub fn format_due_date(due: Option<NaiveDate>) -> String {
    due.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Due date, then title. Undated tasks come first.
    #[default]
    Due,
    /// Title, case-insensitive.
    Title,
    /// Person in charge (display name), then due date.
    Assignee,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_labels_and_variant_names() {
        assert_eq!("To-Do".parse::<Status>().unwrap(), Status::ToDo);
        assert_eq!("in progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("WaitingReview".parse::<Status>().unwrap(), Status::WaitingReview);
        assert_eq!("finished".parse::<Status>().unwrap(), Status::Finished);
        for s in Status::ALL {
            assert_eq!(s.as_str().parse::<Status>().unwrap(), s);
        }
    }

    #[test]
    fn status_rejects_unknown_column() {
        let err = "Blocked".parse::<Status>().unwrap_err();
        assert!(matches!(err, BoardError::InvalidStatus(s) if s == "Blocked"));
    }

    #[test]
    fn status_input_accepts_menu_codes() {
        assert_eq!(parse_status_input("1").unwrap(), Status::ToDo);
        assert_eq!(parse_status_input(" 4 ").unwrap(), Status::Finished);
        assert!(matches!(parse_status_input("5"), Err(BoardError::InvalidStatus(_))));
        assert_eq!(parse_status_input("waiting review").unwrap(), Status::WaitingReview);
    }

    #[test]
    fn due_date_shape_is_strict() {
        assert!(is_date_shape("2024-01-09"));
        assert!(!is_date_shape("2024-1-09"));
        assert!(!is_date_shape("24-01-09"));
        assert!(!is_date_shape("2024/01/09"));
        assert!(!is_date_shape("2024-01-0x"));
    }

    #[test]
    fn due_date_parsing() {
        assert_eq!(parse_due_date("").unwrap(), None);
        assert_eq!(parse_due_date("Undecided").unwrap(), None);
        assert_eq!(
            parse_due_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(matches!(
            parse_due_date("2023-02-29"),
            Err(BoardError::InvalidDueDateFormat(_))
        ));
        assert!(matches!(
            parse_due_date("tomorrow"),
            Err(BoardError::InvalidDueDateFormat(_))
        ));
    }
}
