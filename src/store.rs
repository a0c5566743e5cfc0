//! Task store: the only code path that creates, edits or removes tasks.
//!
//! Every input is re-validated here even when the CLI already checked it.
//! Each mutation is one [`Database::transact`] call, so it is either fully
//! written or not visible at all.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::BoardError;
use crate::fields::{parse_due_date, SortKey, Status};
use crate::task::{TaskId, TaskRecord};
use crate::users::{UserDirectory, UserId};
use crate::board::{self, Column};

/// Input for [`TaskStore::add`].
///
/// Status and due date are raw text; the store parses them itself.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub status: String,
    pub person_in_charge: UserId,
    /// `YYYY-MM-DD`, or blank / `Undecided` for no due date.
    pub due_date: String,
    pub creator: UserId,
    pub additional_info: String,
}

/// Partial edit for [`TaskStore::edit`].
///
/// `None` keeps the current value. Blank strings are treated the same as
/// `None`; use `clear_due_date` to remove a due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<String>,
    pub person_in_charge: Option<UserId>,
    pub due_date: Option<String>,
    pub clear_due_date: bool,
    pub additional_info: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }
}

/// Fluent construction of a [`TaskUpdate`].
pub struct TaskUpdateBuilder(TaskUpdate);

impl TaskUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TaskUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    /// Accepts a [`Status`] or any status text.
    #[must_use]
    pub fn status(mut self, status: impl ToString) -> Self {
        self.0.status = Some(status.to_string());
        self
    }

    #[must_use]
    pub fn person_in_charge(mut self, user: UserId) -> Self {
        self.0.person_in_charge = Some(user);
        self
    }

    #[must_use]
    pub fn due_date(mut self, due: impl Into<String>) -> Self {
        self.0.due_date = Some(due.into());
        self
    }

    #[must_use]
    pub fn clear_due_date(mut self) -> Self {
        self.0.clear_due_date = true;
        self
    }

    #[must_use]
    pub fn additional_info(mut self, info: impl Into<String>) -> Self {
        self.0.additional_info = Some(info.into());
        self
    }

    #[must_use]
    pub fn build(self) -> TaskUpdate {
        self.0
    }
}

impl Default for TaskUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`TaskStore::delete_many`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchDeleteReport {
    pub deleted: Vec<TaskRecord>,
    pub not_found: Vec<TaskId>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Owns the task table and validates every write against a user directory.
pub struct TaskStore<D> {
    db: Database,
    directory: D,
}

impl<D: UserDirectory> TaskStore<D> {
    pub fn new(db: Database, directory: D) -> Self {
        TaskStore { db, directory }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    fn require_user(&self, id: UserId) -> Result<(), BoardError> {
        if self.directory.user_exists(id) {
            Ok(())
        } else {
            Err(BoardError::UnknownUser(id))
        }
    }

    /// Create a task stamped with the current local time.
    pub fn add(&mut self, new: NewTask) -> Result<TaskRecord, BoardError> {
        self.add_at(new, Local::now().naive_local())
    }

    /// Create a task with an explicit creation timestamp.
    pub fn add_at(&mut self, new: NewTask, created_at: NaiveDateTime) -> Result<TaskRecord, BoardError> {
        let status: Status = new.status.trim().parse()?;
        self.require_user(new.person_in_charge)?;
        self.require_user(new.creator)?;
        let title = new.title.trim();
        if title.is_empty() {
            return Err(BoardError::InvalidTitle);
        }
        let due_date = parse_due_date(&new.due_date)?;

        let task = self.db.transact(|table| {
            let task = TaskRecord {
                id: table.allocate_id()?,
                title: title.to_string(),
                status,
                person_in_charge: new.person_in_charge,
                due_date,
                creator: new.creator,
                editor: None,
                created_at,
                additional_info: new.additional_info.clone(),
            };
            table.push(&task);
            Ok(task)
        })?;
        info!(task = task.id, status = %task.status, "added task");
        Ok(task)
    }

    /// Apply a partial edit on behalf of `editor`.
    ///
    /// Everything is validated before any field is touched. The editor is
    /// recorded only when at least one field actually changes; an edit that
    /// changes nothing succeeds without writing.
    pub fn edit(&mut self, id: TaskId, editor: UserId, update: TaskUpdate) -> Result<TaskRecord, BoardError> {
        let (index, current) = self.db.table().find(id).ok_or(BoardError::TaskNotFound(id))?;
        self.require_user(editor)?;

        let status = non_blank(update.status)
            .map(|s| s.trim().parse::<Status>())
            .transpose()?;
        let due_date = if update.clear_due_date {
            Some(None)
        } else {
            non_blank(update.due_date).map(|s| parse_due_date(&s)).transpose()?
        };
        if let Some(pic) = update.person_in_charge {
            self.require_user(pic)?;
        }

        let mut next = current.clone();
        if let Some(title) = non_blank(update.title) {
            next.title = title.trim().to_string();
        }
        if let Some(status) = status {
            next.status = status;
        }
        if let Some(pic) = update.person_in_charge {
            next.person_in_charge = pic;
        }
        if let Some(due) = due_date {
            next.due_date = due;
        }
        if let Some(info) = non_blank(update.additional_info) {
            next.additional_info = info;
        }

        if next == current {
            debug!(task = id, "edit changed nothing");
            return Ok(current);
        }
        next.editor = Some(editor);
        self.db.transact(|table| {
            table.replace(index, &next);
            Ok(())
        })?;
        info!(task = id, editor, "edited task");
        Ok(next)
    }

    /// Move a task to another column. Shorthand for a status-only edit.
    pub fn move_task(&mut self, id: TaskId, editor: UserId, status: &str) -> Result<TaskRecord, BoardError> {
        self.edit(id, editor, TaskUpdateBuilder::new().status(status).build())
    }

    /// Remove a task, returning it as it was just before removal.
    pub fn delete(&mut self, id: TaskId) -> Result<TaskRecord, BoardError> {
        let task = self.db.transact(|table| {
            let (index, task) = table.find(id).ok_or(BoardError::TaskNotFound(id))?;
            table.remove(index);
            Ok(task)
        })?;
        info!(task = id, "deleted task");
        Ok(task)
    }

    /// Remove several tasks in one write. Unknown ids are reported, not fatal.
    pub fn delete_many(&mut self, ids: &[TaskId]) -> Result<BatchDeleteReport, BoardError> {
        let report = self.db.transact(|table| {
            let mut report = BatchDeleteReport::default();
            for &id in ids {
                match table.find(id) {
                    Some((index, task)) => {
                        table.remove(index);
                        report.deleted.push(task);
                    }
                    None => report.not_found.push(id),
                }
            }
            Ok(report)
        })?;
        info!(deleted = report.deleted.len(), missing = report.not_found.len(), "batch delete");
        Ok(report)
    }

    /// The task with this id, if it exists and decodes.
    pub fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.db.table().find(id).map(|(_, task)| task)
    }

    /// All tasks in storage order.
    pub fn list(&self) -> Vec<TaskRecord> {
        self.db.table().records()
    }

    /// All tasks sorted by `key`.
    pub fn sorted(&self, key: SortKey) -> Vec<TaskRecord> {
        let mut tasks = self.list();
        board::sort_tasks(&mut tasks, key, &self.directory);
        tasks
    }

    /// Tasks grouped into the four board columns, each sorted by `key`.
    pub fn columns(&self, key: SortKey) -> Vec<Column> {
        board::group_by_status(self.sorted(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::UserBook;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const ADA: UserId = 5550001;
    const BOB: UserId = 5550002;
    const NOBODY: UserId = 5559999;

    fn store() -> TaskStore<UserBook> {
        let mut users = UserBook::in_memory();
        users.register(ADA, "Ada", "Engineer").unwrap();
        users.register(BOB, "Bob", "Manager").unwrap();
        TaskStore::new(Database::in_memory(), users)
    }

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn new_task(title: &str, status: &str) -> NewTask {
        NewTask {
            title: title.into(),
            status: status.into(),
            person_in_charge: ADA,
            due_date: "2024-01-20".into(),
            creator: BOB,
            additional_info: "first draft".into(),
        }
    }

    #[test]
    fn add_then_get_returns_what_was_supplied() {
        let mut store = store();
        let added = store.add_at(new_task("Write report", "In Progress"), created()).unwrap();
        let got = store.get(added.id).unwrap();
        assert_eq!(got, added);
        assert_eq!(
            got,
            TaskRecord {
                id: 1,
                title: "Write report".into(),
                status: Status::InProgress,
                person_in_charge: ADA,
                due_date: NaiveDate::from_ymd_opt(2024, 1, 20),
                creator: BOB,
                editor: None,
                created_at: created(),
                additional_info: "first draft".into(),
            }
        );
    }

    #[test]
    fn add_rejects_unknown_status_and_persists_nothing() {
        let mut store = store();
        let err = store.add_at(new_task("Write report", "Blocked"), created()).unwrap_err();
        assert!(matches!(err, BoardError::InvalidStatus(s) if s == "Blocked"));
        assert!(store.list().is_empty());
        assert!(store.database().rows().is_empty());
    }

    #[test]
    fn add_validates_users_title_and_due_date() {
        let mut store = store();

        let mut t = new_task("x", "To-Do");
        t.person_in_charge = NOBODY;
        assert!(matches!(store.add_at(t, created()), Err(BoardError::UnknownUser(NOBODY))));

        let mut t = new_task("x", "To-Do");
        t.creator = NOBODY;
        assert!(matches!(store.add_at(t, created()), Err(BoardError::UnknownUser(NOBODY))));

        assert!(matches!(
            store.add_at(new_task("   ", "To-Do"), created()),
            Err(BoardError::InvalidTitle)
        ));

        let mut t = new_task("x", "To-Do");
        t.due_date = "2024-13-01".into();
        assert!(matches!(store.add_at(t, created()), Err(BoardError::InvalidDueDateFormat(_))));

        assert!(store.list().is_empty());
    }

    #[test]
    fn add_accepts_undecided_due_date() {
        let mut store = store();
        let mut t = new_task("Someday", "To-Do");
        t.due_date = String::new();
        assert_eq!(store.add_at(t, created()).unwrap().due_date, None);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = store();
        let a = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let b = store.add_at(new_task("b", "To-Do"), created()).unwrap();
        store.delete(b.id).unwrap();
        let c = store.add_at(new_task("c", "To-Do"), created()).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[test]
    fn empty_edit_is_a_no_op() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let after = store.edit(task.id, BOB, TaskUpdate::default()).unwrap();
        assert_eq!(after, task);
        assert_eq!(store.get(task.id).unwrap().editor, None);
    }

    #[test]
    fn blank_fields_are_ignored() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let update = TaskUpdateBuilder::new()
            .title("")
            .status(" ")
            .due_date("")
            .additional_info("")
            .build();
        assert_eq!(store.edit(task.id, BOB, update).unwrap(), task);
    }

    #[test]
    fn setting_the_same_value_records_no_editor() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let update = TaskUpdateBuilder::new().status(Status::ToDo).title("a").build();
        assert_eq!(store.edit(task.id, BOB, update).unwrap().editor, None);
    }

    #[test]
    fn status_only_edit_leaves_other_fields_alone() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let after = store.move_task(task.id, BOB, "Finished").unwrap();

        assert_eq!(after.status, Status::Finished);
        assert_eq!(after.editor, Some(BOB));
        assert_eq!(
            TaskRecord { status: task.status, editor: task.editor, ..after.clone() },
            task
        );
        assert_eq!(store.get(task.id).unwrap(), after);
    }

    #[test]
    fn editor_is_overwritten_not_accumulated() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        store.move_task(task.id, BOB, "In Progress").unwrap();
        let after = store.move_task(task.id, ADA, "Waiting Review").unwrap();
        assert_eq!(after.editor, Some(ADA));
        assert_eq!(after.creator, BOB);
        assert_eq!(after.created_at, created());
    }

    #[test]
    fn invalid_status_rejects_the_whole_edit() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let update = TaskUpdateBuilder::new()
            .title("renamed")
            .status("Blocked")
            .additional_info("changed")
            .build();
        assert!(matches!(store.edit(task.id, BOB, update), Err(BoardError::InvalidStatus(_))));
        assert_eq!(store.get(task.id).unwrap(), task);
    }

    #[test]
    fn invalid_due_date_rejects_the_whole_edit() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let update = TaskUpdateBuilder::new()
            .title("renamed")
            .due_date("2024-02-30")
            .additional_info("changed")
            .build();
        assert!(matches!(
            store.edit(task.id, BOB, update),
            Err(BoardError::InvalidDueDateFormat(_))
        ));
        assert_eq!(store.get(task.id).unwrap(), task);
    }

    #[test]
    fn edit_checks_task_and_users() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        assert!(matches!(
            store.edit(99, BOB, TaskUpdate::default()),
            Err(BoardError::TaskNotFound(99))
        ));
        assert!(matches!(
            store.edit(task.id, NOBODY, TaskUpdate::default()),
            Err(BoardError::UnknownUser(NOBODY))
        ));
        let update = TaskUpdateBuilder::new().person_in_charge(NOBODY).title("b").build();
        assert!(matches!(store.edit(task.id, BOB, update), Err(BoardError::UnknownUser(NOBODY))));
        assert_eq!(store.get(task.id).unwrap(), task);
    }

    #[test]
    fn edit_changes_every_supplied_field() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let update = TaskUpdateBuilder::new()
            .title("  b ")
            .status("3")
            .person_in_charge(BOB)
            .due_date("2024-02-29")
            .additional_info("second draft")
            .build();
        // "3" is a menu code, which the store does not accept as a status.
        assert!(matches!(store.edit(task.id, ADA, update.clone()), Err(BoardError::InvalidStatus(_))));

        let update = TaskUpdate { status: Some("Waiting Review".into()), ..update };
        let after = store.edit(task.id, ADA, update).unwrap();
        assert_eq!(after.title, "b");
        assert_eq!(after.status, Status::WaitingReview);
        assert_eq!(after.person_in_charge, BOB);
        assert_eq!(after.due_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(after.additional_info, "second draft");
        assert_eq!(after.editor, Some(ADA));
    }

    #[test]
    fn due_date_can_be_cleared_explicitly() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let after = store
            .edit(task.id, ADA, TaskUpdateBuilder::new().clear_due_date().build())
            .unwrap();
        assert_eq!(after.due_date, None);
        assert_eq!(after.editor, Some(ADA));
    }

    #[test]
    fn delete_returns_the_removed_task() {
        let mut store = store();
        let task = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        assert_eq!(store.delete(task.id).unwrap(), task);
        assert_eq!(store.get(task.id), None);
        assert!(matches!(store.delete(task.id), Err(BoardError::TaskNotFound(1))));
    }

    #[test]
    fn batch_delete_reports_missing_ids() {
        let mut store = store();
        let a = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let b = store.add_at(new_task("b", "To-Do"), created()).unwrap();
        let report = store.delete_many(&[a.id, 42, b.id]).unwrap();
        assert_eq!(report.deleted, vec![a, b]);
        assert_eq!(report.not_found, vec![42]);
        assert!(store.list().is_empty());
    }

    #[test]
    fn mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut users = UserBook::in_memory();
        users.register(ADA, "Ada", "Engineer").unwrap();
        users.register(BOB, "Bob", "Manager").unwrap();

        let mut store = TaskStore::new(Database::open(&path).unwrap(), users);
        let a = store.add_at(new_task("a", "To-Do"), created()).unwrap();
        let b = store.add_at(new_task("b", "To-Do"), created()).unwrap();
        let a = store.move_task(a.id, ADA, "Finished").unwrap();
        store.delete(b.id).unwrap();

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.table().records(), vec![a]);
        assert_eq!(reopened.table().next_id, 3);
    }
}
