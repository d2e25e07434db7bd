use std::path::PathBuf;

use clap::Parser;

use crate::api::DEFAULT_SERVER;
use crate::cmd::Commands;
use crate::fields::Locale;

/// Terminal client for the Todoz to-do server.
/// Credentials and logs live under ~/.todoz unless --data-dir says otherwise.
#[derive(Parser)]
#[command(name = "todoz", version, about = "Todoz terminal client")]
pub struct Cli {
    /// Base URL of the Todoz API server.
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Directory for stored credentials and the log file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Language for messages coming back from the server.
    #[arg(long, global = true, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
