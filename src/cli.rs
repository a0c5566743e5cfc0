use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Multi-user kanban board.
/// Data lives in ~/.kanban unless --data-dir, KANBAN_DATA_DIR or the config file says otherwise.
#[derive(Parser)]
#[command(name = "kanban", version, about = "Multi-user kanban task board")]
pub struct Cli {
    /// Directory holding tasks.json and users.json.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file to read instead of ~/.config/kanban/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}
