use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Terminal kanban task board")]
pub struct Cli {
    /// Use the board stored in this directory instead of searching for one
    #[arg(long, global = true, value_name = "DIR")]
    pub board_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a board in the current directory (or in --board-dir)
    Init {
        /// Display name for the board
        #[arg(long)]
        name: Option<String>,
    },
    /// List tasks per column
    List {
        /// Only show this column (todo, progress, done)
        #[arg(long)]
        column: Option<String>,
    },
    /// Add a task to the todo column
    Add {
        /// Title of the task
        title: String,
        /// Optional description
        #[arg(long, short = 'd', default_value = "")]
        desc: String,
    },
    /// Move a task to another column
    Move {
        /// Task id to move
        task_id: String,
        /// Destination column (todo, progress, done)
        column: String,
    },
    /// Mark a task as done
    Done {
        /// Task id to complete
        task_id: String,
    },
    /// Delete a task
    Delete {
        /// Task id to delete
        task_id: String,
    },
    /// Re-check task ages now and move stale todo tasks
    Sweep,
    /// Launch the interactive TUI
    Tui,
}
