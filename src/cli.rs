//! Command-line interface for strictly_boards.

use clap::{Parser, Subcommand};
use strictly_rules::GameKind;

/// Strictly Boards - turn-based chess and backgammon server
#[derive(Parser, Debug)]
#[command(name = "strictly_boards")]
#[command(about = "Rule-checked chess and backgammon sessions over HTTP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,
    },

    /// Replay a stored session record and print the result
    Replay {
        /// Game the record belongs to
        #[arg(short, long)]
        kind: GameKind,

        /// Path to the JSON session record
        record: std::path::PathBuf,
    },

    /// Print a player's win/loss record from the database
    Stats {
        /// SQLite database path
        #[arg(long, default_value = "strictly_boards.db")]
        db_path: String,

        /// Player id
        player_id: String,
    },
}
