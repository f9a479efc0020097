//! chesslens command line front end.
//!
//! Wraps the session crate for one-shot use from a shell:
//!
//! - `analyze` runs the engine on a position and prints the ranked lines.
//! - `validate` reports what is wrong with a position literal.
//! - `detect` loads a saved detection response and runs the review gate.
//! - `play` applies a move list and prints the history.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`). Setting
//! `CHESSLENS_LOG_DIR` also writes a daily rolling file there.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "chesslens", about = "Chess position analysis with a UCI engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a position with the engine.
    Analyze {
        /// Position literal. Defaults to the starting position.
        #[arg(long)]
        fen: Option<String>,
        /// Search depth (overrides CHESSLENS_DEPTH).
        #[arg(short, long)]
        depth: Option<u32>,
        /// Number of ranked lines (overrides CHESSLENS_MULTIPV).
        #[arg(short, long)]
        multipv: Option<u32>,
        /// Engine binary (overrides CHESSLENS_ENGINE_PATH).
        #[arg(short, long)]
        engine: Option<PathBuf>,
        /// Print the result set as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check a position literal.
    Validate { fen: String },
    /// Review a detection response saved as JSON.
    Detect {
        file: PathBuf,
        /// The file holds 64 per-square classifications instead of a response.
        #[arg(long)]
        classifications: bool,
        /// Classifications were read with Black at the bottom.
        #[arg(long, requires = "classifications")]
        flipped: bool,
        /// Try to accept the detected position.
        #[arg(long)]
        accept: bool,
        /// Accept despite low confidence or advisory errors.
        #[arg(long = "override")]
        override_review: bool,
    },
    /// Play moves from a position and print the history.
    Play {
        #[arg(long)]
        fen: Option<String>,
        /// Moves in algebraic ("Nf3") or coordinate ("g1f3") notation.
        moves: Vec<String>,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file, guard) = match config::get_log_dir() {
        Some(dir) if std::fs::create_dir_all(&dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir, config::LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Analyze {
            fen,
            depth,
            multipv,
            engine,
            json,
        } => {
            commands::analyze(commands::AnalyzeOptions {
                fen,
                depth,
                multipv,
                engine,
                json,
            })
            .await?
        }
        Commands::Validate { fen } => commands::validate(&fen)?,
        Commands::Detect {
            file,
            classifications,
            flipped,
            accept,
            override_review,
        } => commands::detect(
            &file,
            &commands::DetectOptions {
                classifications,
                flipped,
                accept,
                override_review,
            },
        )?,
        Commands::Play { fen, moves, json } => commands::play(fen.as_deref(), &moves, json)?,
    };

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
