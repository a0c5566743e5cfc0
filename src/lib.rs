//! # kanban - multi-user task board CLI
//!
//! A small kanban board for a team: registered users create tasks, move them
//! across four status columns, edit them, and get a list of overdue and
//! upcoming work every time they log in.
//!
//! ## Key Features
//!
//! - **Four fixed columns**: To-Do → In Progress → Waiting Review → Finished
//! - **Audit fields**: every task records its creator, creation time and last editor
//! - **Partial edits**: only the fields you pass change; blank values are ignored
//! - **Due-date notices**: overdue tasks and tasks due within a rolling horizon
//!   (14 days by default) are listed at login or with `kanban notify`
//! - **Local file storage**: `tasks.json` and `users.json` in `~/.kanban/`
//!
//! ## Quick Start
//!
//! ```bash
//! kanban user register 5550001 "Ada Lovelace" Engineer
//! kanban add "Write release notes" --status 1 --assignee 5550001 --creator 5550001 --due 2024-06-30
//! kanban list
//! kanban move 1 --editor 5550001 --status 2
//! kanban login 5550001
//! ```
//!
//! ## Configuration
//!
//! `--data-dir` and `KANBAN_DATA_DIR` choose the data directory,
//! `KANBAN_HORIZON_DAYS` the notification window. Both can also be set in
//! `~/.config/kanban/config.toml`. Set `KANBAN_LOG` (e.g. `debug`) to control
//! logging on stderr.

pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod notify;
pub mod store;
pub mod task;
pub mod users;
