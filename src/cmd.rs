//! Command implementations for the CLI surface.
//!
//! The interesting work happens in the TUI; the commands here launch it,
//! clear stored credentials from outside it, and generate shell
//! completions.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::path::Path;

use crate::fields::Locale;
use crate::session;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI (the default when no command is given).
    Ui,

    /// Forget the credentials stored on this machine.
    Logout,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(server: &str, data_dir: &Path, locale: Locale) {
    if let Err(e) = run_tui(server, data_dir, locale) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Remove the stored credential file without starting the UI.
pub fn cmd_logout(data_dir: &Path) {
    let path = session::credentials_path(data_dir);
    match session::clear_credentials(&path) {
        Ok(()) => println!("Signed out."),
        Err(e) => {
            eprintln!("Failed to clear credentials: {e}");
            std::process::exit(1);
        }
    }
}

/// Generate shell completions for the CLI.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;

    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
