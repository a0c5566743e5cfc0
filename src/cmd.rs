//! Command implementations for the CLI interface.
//!
//! This is the glue layer: it turns raw arguments into store calls, converts
//! the 1-4 status codes, checks date shapes up front, and prints results.
//! The store re-validates everything it receives.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::board::{print_board, print_table, print_task};
use crate::config::BoardConfig;
use crate::db::Database;
use crate::fields::{is_date_shape, parse_status_input, SortKey, Status, UNDECIDED};
use crate::notify::NotificationScanner;
use crate::store::{NewTask, TaskStore, TaskUpdate};
use crate::task::TaskId;
use crate::users::{UserBook, UserDirectory, UserId};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Status: 1 To-Do | 2 In Progress | 3 Waiting Review | 4 Finished.
        #[arg(long, value_parser = status_arg, default_value = "1")]
        status: Status,
        /// Person in charge (phone number).
        #[arg(long)]
        assignee: UserId,
        /// Creator (phone number).
        #[arg(long)]
        creator: UserId,
        /// Due date: YYYY-MM-DD. Omit for Undecided.
        #[arg(long, value_parser = due_arg)]
        due: Option<String>,
        /// Additional information.
        #[arg(long)]
        info: Option<String>,
    },

    /// Show the board grouped by status column.
    List {
        /// Sort key within each column.
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Print a single table instead of columns.
        #[arg(long)]
        flat: bool,
    },

    /// Show every field of one task.
    View { id: TaskId },

    /// Edit fields on a task. Omitted or blank fields are left unchanged.
    Edit {
        id: TaskId,
        /// User making the change (phone number).
        #[arg(long)]
        editor: UserId,
        #[arg(long)]
        title: Option<String>,
        /// Status code (1-4) or name.
        #[arg(long, value_parser = status_arg)]
        status: Option<Status>,
        /// New person in charge (phone number).
        #[arg(long)]
        assignee: Option<UserId>,
        #[arg(long, value_parser = due_arg, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Mark the due date Undecided.
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        info: Option<String>,
    },

    /// Move a task to another column.
    Move {
        id: TaskId,
        #[arg(long)]
        editor: UserId,
        /// Status code (1-4) or name.
        #[arg(long, value_parser = status_arg)]
        status: Status,
    },

    /// Delete one or more tasks.
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<TaskId>,
        /// Actually delete. Without this only the tasks that would go are listed.
        #[arg(long)]
        yes: bool,
    },

    /// Show overdue tasks and tasks due within the horizon.
    Notify {
        /// Look-ahead window in days.
        #[arg(long)]
        horizon: Option<u32>,
        /// Evaluate as of this local time (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS").
        #[arg(long, value_parser = instant_arg)]
        at: Option<NaiveDateTime>,
    },

    /// Start a session as a registered user and show their due-date notices.
    Login { user: UserId },

    /// Manage registered users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new user.
    Register {
        /// Phone number, used as the user id.
        id: UserId,
        name: String,
        position: String,
    },
    /// List registered users.
    List,
    /// Allow a user to log in again.
    Activate { id: UserId },
    /// Stop a user from logging in.
    Deactivate { id: UserId },
}

fn status_arg(s: &str) -> Result<Status, String> {
    parse_status_input(s).map_err(|e| e.to_string())
}

fn due_arg(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case(UNDECIDED) || is_date_shape(s) {
        Ok(s.to_string())
    } else {
        Err("expected YYYY-MM-DD (4-digit year, 2-digit month and day)".into())
    }
}

fn instant_arg(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::default())))
        .map_err(|_| "expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM:SS\"".to_string())
}

fn open_users(config: &BoardConfig) -> Result<UserBook> {
    let path = config.users_path();
    UserBook::open(&path).with_context(|| format!("failed to open user directory {}", path.display()))
}

fn open_store(config: &BoardConfig) -> Result<TaskStore<UserBook>> {
    let users = open_users(config)?;
    let path = config.tasks_path();
    let db = Database::open(&path).with_context(|| format!("failed to open task board {}", path.display()))?;
    Ok(TaskStore::new(db, users))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Run one parsed command against the configured data directory.
pub fn run_command(command: Commands, config: &BoardConfig) -> Result<()> {
    match command {
        Commands::Add { title, status, assignee, creator, due, info } => {
            cmd_add(config, title, status, assignee, creator, due, info)
        }
        Commands::List { sort, flat } => cmd_list(config, sort, flat),
        Commands::View { id } => cmd_view(config, id),
        Commands::Edit { id, editor, title, status, assignee, due, clear_due, info } => {
            let update = TaskUpdate {
                title,
                status: status.map(|s| s.to_string()),
                person_in_charge: assignee,
                due_date: due,
                clear_due_date: clear_due,
                additional_info: info,
            };
            cmd_edit(config, id, editor, update)
        }
        Commands::Move { id, editor, status } => cmd_move(config, id, editor, status),
        Commands::Delete { ids, yes } => cmd_delete(config, &ids, yes),
        Commands::Notify { horizon, at } => cmd_notify(config, horizon, at),
        Commands::Login { user } => cmd_login(config, user),
        Commands::User { action } => cmd_user(config, action),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Add a new task to the board.
pub fn cmd_add(
    config: &BoardConfig,
    title: String,
    status: Status,
    assignee: UserId,
    creator: UserId,
    due: Option<String>,
    info: Option<String>,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("Title cannot be empty.");
    }
    let mut store = open_store(config)?;
    let task = store.add(NewTask {
        title,
        status: status.to_string(),
        person_in_charge: assignee,
        due_date: due.unwrap_or_default(),
        creator,
        additional_info: info.unwrap_or_default(),
    })?;
    println!("Added task {}: {}", task.id, task.title);
    Ok(())
}

/// Print the board.
pub fn cmd_list(config: &BoardConfig, sort: SortKey, flat: bool) -> Result<()> {
    let store = open_store(config)?;
    let today = today();
    if flat {
        let tasks = store.sorted(sort);
        if tasks.is_empty() {
            println!("No tasks found.");
            return Ok(());
        }
        print_table(&tasks, store.directory(), today);
    } else {
        print_board(&store.columns(sort), store.directory(), today);
    }
    Ok(())
}

/// Show one task in detail.
pub fn cmd_view(config: &BoardConfig, id: TaskId) -> Result<()> {
    let store = open_store(config)?;
    let Some(task) = store.get(id) else {
        bail!("Task {id} not found.");
    };
    print_task(&task, store.directory(), today());
    Ok(())
}

/// Apply a partial edit.
pub fn cmd_edit(config: &BoardConfig, id: TaskId, editor: UserId, update: TaskUpdate) -> Result<()> {
    let empty = update.is_empty();
    let mut store = open_store(config)?;
    let before = store.get(id);
    let after = store.edit(id, editor, update)?;
    if empty {
        println!("No changes specified.");
    } else if before.as_ref() == Some(&after) {
        println!("Task {id} unchanged.");
    } else {
        println!("Updated task {id}.");
    }
    Ok(())
}

/// Move a task to another column.
pub fn cmd_move(config: &BoardConfig, id: TaskId, editor: UserId, status: Status) -> Result<()> {
    let mut store = open_store(config)?;
    let task = store.move_task(id, editor, status.as_str())?;
    println!("Task {} is now {}.", task.id, task.status);
    Ok(())
}

/// Delete tasks, or preview the deletion without `--yes`.
pub fn cmd_delete(config: &BoardConfig, ids: &[TaskId], yes: bool) -> Result<()> {
    let mut store = open_store(config)?;
    if !yes {
        println!("Would delete:");
        for &id in ids {
            match store.get(id) {
                Some(t) => println!("  {} - {}", t.id, t.title),
                None => println!("  {id} - (not found)"),
            }
        }
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }

    if let [id] = ids {
        let task = store.delete(*id)?;
        println!("Deleted: {}", task.title);
        return Ok(());
    }
    let report = store.delete_many(ids)?;
    for t in &report.deleted {
        println!("Deleted: {}", t.title);
    }
    for id in &report.not_found {
        println!("Task {id} not found.");
    }
    if report.deleted.is_empty() {
        bail!("No tasks deleted.");
    }
    Ok(())
}

fn print_notifications(config: &BoardConfig, horizon: u32, now: NaiveDateTime, users: &impl UserDirectory) -> Result<()> {
    let path = config.tasks_path();
    let entries = NotificationScanner::new(horizon)
        .scan_file(&path, users, now)
        .with_context(|| format!("failed to read task board {}", path.display()))?;
    if entries.is_empty() {
        println!("No overdue tasks and nothing due in the next {horizon} days.");
        return Ok(());
    }
    let rule = "-".repeat(50);
    println!("{rule}");
    for entry in &entries {
        println!("{entry}");
        println!("{rule}");
    }
    Ok(())
}

/// Print due-date notices.
pub fn cmd_notify(config: &BoardConfig, horizon: Option<u32>, at: Option<NaiveDateTime>) -> Result<()> {
    let config = config.clone().with_overrides(None, horizon)?;
    let users = open_users(&config)?;
    let now = at.unwrap_or_else(|| Local::now().naive_local());
    print_notifications(&config, config.horizon_days, now, &users)
}

/// Identify a user for this session and show the board's due-date notices.
pub fn cmd_login(config: &BoardConfig, user: UserId) -> Result<()> {
    let users = open_users(config)?;
    let Some(record) = users.get_user(user) else {
        bail!("User {user} is not registered.");
    };
    if !record.is_active {
        bail!("User {user} has been deactivated. Contact an administrator.");
    }
    tracing::info!(user, "session started");
    println!("Welcome, {} ({}).", record.name, record.position);
    print_notifications(config, config.horizon_days, Local::now().naive_local(), &users)
}

/// Manage registered users.
pub fn cmd_user(config: &BoardConfig, action: UserAction) -> Result<()> {
    let mut users = open_users(config)?;
    match action {
        UserAction::Register { id, name, position } => {
            let user = users.register(id, &name, &position)?;
            println!("Registered {} ({}).", user.name, user.id);
        }
        UserAction::List => {
            println!("{:<14} {:<20} {:<16} {}", "Phone", "Name", "Position", "Active");
            for u in users.list() {
                println!(
                    "{:<14} {:<20} {:<16} {}",
                    u.id,
                    crate::board::truncate(&u.name, 20),
                    crate::board::truncate(&u.position, 16),
                    if u.is_active { "yes" } else { "no" }
                );
            }
        }
        UserAction::Activate { id } => {
            users.set_active(id, true)?;
            println!("User {id} activated.");
        }
        UserAction::Deactivate { id } => {
            users.set_active(id, false)?;
            println!("User {id} deactivated.");
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
