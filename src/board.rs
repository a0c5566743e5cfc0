//! Board views: sorting, grouping by column, and table rendering.

use chrono::NaiveDate;

use crate::fields::{SortKey, Status};
use crate::task::TaskRecord;
use crate::users::{display_name, UserDirectory};

/// One board column and the tasks in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub status: Status,
    pub tasks: Vec<TaskRecord>,
}

/// Sort tasks in place. Undated tasks sort before dated ones.
pub fn sort_tasks(tasks: &mut [TaskRecord], key: SortKey, directory: &impl UserDirectory) {
    match key {
        SortKey::Due => tasks.sort_by(|a, b| (a.due_date, &a.title).cmp(&(b.due_date, &b.title))),
        SortKey::Title => tasks.sort_by_key(|t| t.title.to_lowercase()),
        SortKey::Assignee => {
            tasks.sort_by_cached_key(|t| (display_name(directory, Some(t.person_in_charge)), t.due_date))
        }
    }
}

/// Partition tasks into the four columns in board order, keeping the
/// relative order of tasks within each column.
pub fn group_by_status(tasks: Vec<TaskRecord>) -> Vec<Column> {
    let mut columns: Vec<Column> = Status::ALL
        .iter()
        .map(|&status| Column { status, tasks: Vec::new() })
        .collect();
    for task in tasks {
        if let Some(col) = columns.iter_mut().find(|c| c.status == task.status) {
            col.tasks.push(task);
        }
    }
    columns
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Print tasks as a table.
pub fn print_table(tasks: &[TaskRecord], directory: &impl UserDirectory, today: NaiveDate) {
    println!(
        "{:<5} {:<15} {:<11} {:<16} {}",
        "ID", "Status", "Due", "Assignee", "Title"
    );
    for t in tasks {
        let flag = if t.is_overdue(today) { " [OVERDUE]" } else { "" };
        println!(
            "{:<5} {:<15} {:<11} {:<16} {}{}",
            t.id,
            t.status.as_str(),
            t.due_label(),
            truncate(&display_name(directory, Some(t.person_in_charge)), 16),
            t.title,
            flag
        );
    }
}

/// Print the board column by column. Empty columns are still shown.
pub fn print_board(columns: &[Column], directory: &impl UserDirectory, today: NaiveDate) {
    let total: usize = columns.iter().map(|c| c.tasks.len()).sum();
    println!("{}", "=".repeat(50));
    println!("{:^50}", "KANBAN BOARD");
    println!("{}", "=".repeat(50));
    println!("Total tasks: {total}");
    for col in columns {
        println!("{}", "-".repeat(50));
        println!("{} ({})", col.status, col.tasks.len());
        if col.tasks.is_empty() {
            println!("  -");
        }
        for t in &col.tasks {
            let due = match t.due_summary(today) {
                Some(s) => format!("{} ({s})", t.due_label()),
                None => t.due_label(),
            };
            println!(
                "  #{:<4} {}  [{}]  due {}",
                t.id,
                t.title,
                display_name(directory, Some(t.person_in_charge)),
                due
            );
        }
    }
    println!("{}", "=".repeat(50));
}

/// Print every field of one task.
pub fn print_task(task: &TaskRecord, directory: &impl UserDirectory, today: NaiveDate) {
    let due = match task.due_summary(today) {
        Some(s) => format!("{} ({s})", task.due_label()),
        None => task.due_label(),
    };
    println!("ID:              {}", task.id);
    println!("Title:           {}", task.title);
    println!("Status:          {}", task.status);
    println!("Assigned to:     {}", display_name(directory, Some(task.person_in_charge)));
    println!("Due date:        {due}");
    println!("Created:         {}", task.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Created by:      {}", display_name(directory, Some(task.creator)));
    println!("Last edited by:  {}", display_name(directory, task.editor));
    println!(
        "Additional info: {}",
        if task.additional_info.is_empty() { "-" } else { task.additional_info.as_str() }
    );
}
