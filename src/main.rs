//! # Todoz - terminal client for the Todoz to-do server
//!
//! A keyboard-driven terminal client for managing to-do lists stored on a
//! Todoz API server, with inline task editing and mouse drag reordering.
//!
//! ## Key Features
//!
//! - **Server-Backed Lists**: Every mutation goes to the server and the
//!   screen updates from the refetched collection, so what you see is what
//!   the server has
//! - **Inline Task Editing**: Edit a task's text in place without leaving
//!   the list, with completion toggles and due dates alongside
//! - **Live Title Search**: A debounced title lookup that narrows the home
//!   screen as you type
//! - **Drag Reordering**: Reorder the visible task rows with the mouse to
//!   eyeball a plan (the order is yours alone and resets on refetch)
//! - **Two-Tier Sign-In**: "Remember me" keeps credentials across restarts;
//!   without it they last for the session only
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the UI against the default server
//! todoz
//!
//! # Point it at a different server
//! todoz --server http://lists.example.com:3000
//!
//! # Arabic server messages
//! todoz --locale ar
//!
//! # Forget stored credentials without starting the UI
//! todoz logout
//! ```
//!
//! ## Installation
//!
//! ```bash
//! git clone <repository-url>
//! cd todoz
//! cargo install --path .
//! ```
//!
//! ## Key Bindings
//!
//! Press `h` on the home screen or inside a list for the full table. The
//! short version: arrows move, `Enter` opens or edits, `Space` toggles,
//! `/` searches, `Tab` reaches the new-task row, and `Ctrl+M` adds the
//! typed task from anywhere in the list.
//!
//! Credentials and `todoz.log` are stored in `~/.todoz/` by default;
//! pass `--data-dir` to relocate them.

use std::path::{Path, PathBuf};

use clap::Parser;

pub mod api;
pub mod bridge;
pub mod cli;
pub mod cmd;
pub mod fields;
pub mod session;
pub mod task;
pub mod todo;
pub mod validate;
pub mod tui {
    pub mod colors;
    pub mod app;
    pub mod enums;
    pub mod forms;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;

fn main() {
    let cli = Cli::parse();

    // Determine the data directory
    let data_dir = if let Some(dir) = cli.data_dir.clone() {
        dir
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".todoz")
    };
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    init_logging(&data_dir);

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Ui => cmd_ui(&cli.server, &data_dir, cli.locale),
        Commands::Logout => cmd_logout(&data_dir),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Send tracing output to `todoz.log` in the data directory. The terminal
/// belongs to the UI, so nothing may write to stdout or stderr while it
/// runs.
fn init_logging(data_dir: &Path) {
    let log_path = data_dir.join("todoz.log");
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_path.display(), e);
            return;
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}
