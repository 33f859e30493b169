//! rollcall - attendance capture and handwriting verification from the
//! command line.
//!
//! Embeddings are read as precomputed JSON. Every command prints exactly one
//! JSON outcome on stdout and exits 0 on `"status": "success"`, 1 otherwise.
//! Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Attendance and handwriting verification CLI.
#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Face attendance and handwriting verification over precomputed embeddings")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.rollcall/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (default is ~/.rollcall/rollcall.redb)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Caller token
    #[arg(long, global = true, env = "ROLLCALL_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Verbose logging on stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register an identity from a single-face embedding file
    Register {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// JSON embedding file
        image: PathBuf,
    },
    /// Identify faces and mark them present for today's session
    Attend {
        #[arg(long)]
        context: String,
        /// JSON embedding files, one per frame
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
    /// Mark everyone not yet recorded today as absent
    Complete {
        #[arg(long)]
        context: String,
    },
    /// Compare an identity's latest document with their handwriting sample
    Compare {
        #[arg(long)]
        id: String,
    },
    /// Show the entries of one session
    Report {
        #[arg(long)]
        context: String,
        /// Session date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// List registered identities
    Identities,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match commands::run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            println!(
                "{}",
                serde_json::json!({
                    "status": "error",
                    "kind": "setup",
                    "message": format!("{e:#}"),
                })
            );
            ExitCode::FAILURE
        }
    }
}
