use crate::age::Accent;
use crate::config::Settings;
use crate::controller::{BoardController, Controller, SystemClock};
use crate::model::{BoardError, ColumnId, Task};
use crate::storage::{init_board, BoardLocation, FileStore};
use crate::ui;
use anyhow::{Context, Result};

pub fn init(location: &BoardLocation, name: Option<String>) -> Result<()> {
    init_board(location)?;
    let settings = Settings::init(location, name)?;
    println!(
        "Initialized board '{}' at {}",
        settings.board_name(location),
        location.dir.display()
    );
    Ok(())
}

pub fn list(location: &BoardLocation, settings: &Settings, column: Option<String>) -> Result<()> {
    let filter = column.map(|c| c.parse::<ColumnId>()).transpose()?;
    let controller = open_board(location, settings)?;
    let board = controller.board();
    println!(
        "Board: {} ({})",
        settings.board_name(location),
        location.scope.label()
    );
    for col in ColumnId::ALL {
        if filter.is_some_and(|f| f != col) {
            continue;
        }
        println!("{} ({})", col.display_name(), board.count(col));
        if board.count(col) == 0 {
            println!("  (empty)");
        }
        for task in board.tasks_in(col) {
            print_task(task);
        }
        println!();
    }
    Ok(())
}

pub fn add(location: &BoardLocation, settings: &Settings, title: String, desc: String) -> Result<()> {
    let mut controller = open_board(location, settings)?;
    let id = controller.create_task(&title, &desc)?;
    println!("Added task {} to {}", id, ColumnId::Todo);
    Ok(())
}

pub fn move_task(
    location: &BoardLocation,
    settings: &Settings,
    task_id: String,
    column: String,
) -> Result<()> {
    let dest = column.parse::<ColumnId>()?;
    let mut controller = open_board(location, settings)?;
    controller
        .move_task(&task_id, dest)
        .with_context(|| format!("moving task {} to {}", task_id, dest))?;
    report_location(&controller, &task_id);
    Ok(())
}

pub fn done(location: &BoardLocation, settings: &Settings, task_id: String) -> Result<()> {
    let mut controller = open_board(location, settings)?;
    match controller.mark_done(&task_id) {
        Ok(()) => report_location(&controller, &task_id),
        Err(err) if matches!(err.downcast_ref::<BoardError>(), Some(BoardError::AlreadyDone(_))) => {
            println!("Task {} is already done", task_id);
        }
        Err(err) => return Err(err.context(format!("completing task {}", task_id))),
    }
    Ok(())
}

pub fn delete(location: &BoardLocation, settings: &Settings, task_id: String) -> Result<()> {
    let mut controller = open_board(location, settings)?;
    if controller.delete_task(&task_id)? {
        println!("Deleted task {}", task_id);
    } else {
        println!("Task {} not found, nothing deleted", task_id);
    }
    Ok(())
}

pub fn sweep(location: &BoardLocation, settings: &Settings) -> Result<()> {
    // opening the board is itself a sweep; tasks it moved carry the warning label
    let controller = open_board(location, settings)?;
    let moved: Vec<&Task> = controller
        .board()
        .tasks_in(ColumnId::Progress)
        .filter(|t| t.label.accent() == Accent::Warning)
        .collect();
    println!(
        "Sweep complete: {} task(s) auto-moved to {}",
        moved.len(),
        ColumnId::Progress
    );
    for task in moved {
        print_task(task);
    }
    Ok(())
}

pub fn tui(location: BoardLocation, settings: Settings) -> Result<()> {
    let controller = open_board(&location, &settings)?;
    ui::run(controller, location, settings)
}

fn open_board(location: &BoardLocation, settings: &Settings) -> Result<BoardController> {
    Controller::open(FileStore::new(location), SystemClock, settings.stale_after())
        .with_context(|| format!("opening board in {}", location.dir.display()))
}

fn report_location(controller: &BoardController, task_id: &str) {
    match controller.board().column_of(task_id) {
        Some(column) => println!("Task {} is now in {}", task_id, column),
        None => println!("Task {} not found", task_id),
    }
}

fn print_task(task: &Task) {
    println!("  - {}: {}", task.id, task.title);
    println!("    {}", task.description_or_placeholder());
    println!("    {}", task.label.text());
}
