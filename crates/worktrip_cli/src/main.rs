//! Terminal front end for WorkTrip.
//!
//! # Responsibility
//! - Map subcommands to store intents and print the active list.
//! - Own presentation-only concerns: delete confirmation, warnings on stderr.
//!
//! # Invariants
//! - Storage warnings never change the exit status.
//! - Empty-text submissions change nothing and print nothing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use worktrip_core::db::open_db;
use worktrip_core::{
    default_log_level, init_logging, AppMode, Change, DeleteOutcome, MemoryKvRepository,
    PersistenceGateway, SqliteKvRepository, StorageError, Task, TaskId, TodoError, TodoStore,
};

const DB_FILE_NAME: &str = "worktrip.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "worktrip", version, about = "Two-list (Work / Travel) to-do manager")]
struct Cli {
    /// SQLite file holding the lists
    #[arg(long, env = "WORKTRIP_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, env = "WORKTRIP_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show tasks of the active mode (or of --mode)
    List {
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Add a task to the active mode
    Add { text: String },

    /// Replace the text of a task
    Edit { id: i64, text: String },

    /// Toggle completion of a task
    Done { id: i64 },

    /// Delete a task after confirmation
    Rm {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show or switch the active mode
    Mode {
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Work,
    Travel,
}

impl From<ModeArg> for AppMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Work => AppMode::Work,
            ModeArg::Travel => AppMode::Travel,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = log_dir
            .to_str()
            .context("--log-dir must be valid UTF-8")?;
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME));

    match open_db(&db_path) {
        Ok(conn) => run(&SqliteKvRepository::new(&conn), cli.command),
        Err(err) => {
            warn!("event=cli_open module=cli status=error error={err}");
            eprintln!(
                "warning: {} (changes will not be saved)",
                StorageError::from(err)
            );
            run(&MemoryKvRepository::new(), cli.command)
        }
    }
}

fn run(gateway: &dyn PersistenceGateway, command: Option<Command>) -> Result<()> {
    let loaded = TodoStore::load(gateway);
    for warning in &loaded.warnings {
        eprintln!("warning: {warning}");
    }
    let mut store = loaded.store;

    match command.unwrap_or(Command::List { mode: None }) {
        Command::List { mode } => {
            let mode = mode.map(AppMode::from).unwrap_or(store.mode());
            print_list(&store, mode);
        }

        Command::Add { text } => {
            let mode = store.mode();
            match store.add(&text, mode) {
                Ok(change) => report(&change),
                Err(TodoError::Validation(_)) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
            print_list(&store, mode);
        }

        Command::Edit { id, text } => {
            match store.update(TaskId::new(id), &text) {
                Ok(change) => report(&change),
                Err(TodoError::Validation(_)) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
            print_list(&store, store.mode());
        }

        Command::Done { id } => {
            let change = store.toggle_completed(TaskId::new(id))?;
            report(&change);
            print_list(&store, store.mode());
        }

        Command::Rm { id, yes } => {
            let id = TaskId::new(id);
            let outcome = if yes {
                store
                    .delete(id)
                    .map_or(DeleteOutcome::Missing, DeleteOutcome::Deleted)
            } else {
                store.delete_with(id, &mut |task: &Task| prompt_delete(task))
            };
            match outcome {
                DeleteOutcome::Deleted(change) => report(&change),
                DeleteOutcome::Cancelled => println!("Cancelled."),
                DeleteOutcome::Missing => println!("Task {id} is already gone."),
            }
            print_list(&store, store.mode());
        }

        Command::Mode { mode: None } => {
            println!("{}", store.mode().label());
        }

        Command::Mode { mode: Some(mode) } => {
            let change = store.set_mode(mode.into());
            report(&change);
            print_list(&store, store.mode());
        }
    }

    Ok(())
}

fn print_list<G: PersistenceGateway>(store: &TodoStore<G>, mode: AppMode) {
    let (active, other) = match mode {
        AppMode::Work => (AppMode::Work, AppMode::Travel),
        AppMode::Travel => (AppMode::Travel, AppMode::Work),
    };
    let counts = store.counts(active);
    println!(
        "[{}] {}   ({}/{} done, {} in {})",
        active.label(),
        active.input_placeholder(),
        counts.completed,
        counts.total,
        store.counts(other).total,
        other.label()
    );
    for task in store.list_by_mode(active) {
        let mark = if task.completed { "x" } else { " " };
        println!("  [{mark}] {:>14}  {}", task.id.get(), task.text);
    }
}

fn report<T>(change: &Change<T>) {
    if let Some(err) = change.storage_warning() {
        eprintln!("warning: change kept in memory only: {err}");
    }
}

fn prompt_delete(task: &Task) -> bool {
    print!("Delete \"{}\"? Are you sure? [y/N] ", task.text);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => parse_confirmation(&answer),
        Err(_) => false,
    }
}

fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
