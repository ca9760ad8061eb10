mod age;
mod cli;
mod commands;
mod config;
mod controller;
mod model;
mod storage;
mod ui;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use storage::{locate_board, project_location, BoardLocation};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TASKBOARD_LOG";

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);

    let location = match (args.board_dir, &command) {
        (Some(dir), _) => BoardLocation::explicit(dir),
        (None, cli::Command::Init { .. }) => project_location(&std::env::current_dir()?),
        (None, _) => locate_board(&std::env::current_dir()?)?,
    };
    location.ensure_dir()?;
    init_logging(&location)?;
    let settings = config::Settings::load(&location)?;

    match command {
        cli::Command::Init { name } => commands::init(&location, name),
        cli::Command::List { column } => commands::list(&location, &settings, column),
        cli::Command::Add { title, desc } => commands::add(&location, &settings, title, desc),
        cli::Command::Move { task_id, column } => {
            commands::move_task(&location, &settings, task_id, column)
        }
        cli::Command::Done { task_id } => commands::done(&location, &settings, task_id),
        cli::Command::Delete { task_id } => commands::delete(&location, &settings, task_id),
        cli::Command::Sweep => commands::sweep(&location, &settings),
        cli::Command::Tui => commands::tui(location, settings),
    }
}

/// Logs go to a file in the board directory; the terminal belongs to the TUI.
fn init_logging(location: &BoardLocation) -> Result<()> {
    let path = location.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {:?}", path))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
}
