//! # ragline CLI
//!
//! Ask questions about a folder of text documents, answered by a local
//! Ollama model from the passages most similar to the question.
//!
//! ## Usage
//!
//! ```bash
//! ragline --config ./config/ragline.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragline index [PATHS]` | Load, split, embed and persist documents |
//! | `ragline chat` | Interactive question loop (`quit`, `stats`) |
//! | `ragline ask "<question>"` | Answer one question and exit |
//! | `ragline health` | Check that Ollama is reachable and the model is pulled |
//!
//! ## Examples
//!
//! ```bash
//! # Index the built-in demo documents, then chat about them
//! ragline index --demo
//! ragline chat
//!
//! # Index a notes folder configured under [documents]
//! ragline index
//!
//! # One-shot question, machine-readable output
//! ragline ask "What is machine learning?" --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragline::commands::{self, DocumentSource};
use ragline::config::{self, Config};
use ragline::progress::ProgressMode;

/// ragline: retrieval-augmented question answering over local documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ragline.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ragline",
    about = "Retrieval-augmented question answering over local documents with Ollama",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragline.toml")]
    config: PathBuf,

    /// Ollama model to answer with. Overrides `[llm].model`; when the config
    /// file does not exist, all other settings take their defaults.
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question loop.
    ///
    /// Type a question to get an answer with its confidence and sources,
    /// `stats` for session statistics, or `quit` to leave.
    Chat {
        /// Index the built-in demo documents before starting.
        #[arg(long)]
        demo: bool,

        /// Index progress: off, human, or json (stderr).
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Answer a single question.
    Ask {
        question: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load, split, embed and persist documents.
    ///
    /// Without PATHS, documents come from the `[documents]` config section.
    /// Chunks already in the index are skipped.
    Index {
        paths: Vec<PathBuf>,

        /// Index the built-in demo documents instead.
        #[arg(long, conflicts_with = "paths")]
        demo: bool,

        /// Index progress: off, human, or json (stderr).
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Check that the Ollama server is reachable and the model is pulled.
    Health,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragline=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = match &cli.model {
        Some(model) if !cli.config.exists() => Config::minimal(model),
        _ => config::load_config(&cli.config)?,
    };
    if let Some(model) = &cli.model {
        cfg.llm.model = model.clone();
    }
    config::validate_config(&cfg)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Chat { demo, progress } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            commands::run_chat(&cfg, demo, progress).await?;
        }
        Commands::Ask { question, json } => {
            commands::run_ask(&cfg, &question, json).await?;
        }
        Commands::Index {
            paths,
            demo,
            progress,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let source = if demo {
                DocumentSource::Demo
            } else if paths.is_empty() {
                DocumentSource::Configured
            } else {
                DocumentSource::Paths(paths)
            };
            commands::run_index(&cfg, source, progress).await?;
        }
        Commands::Health => {
            commands::run_health(&cfg).await?;
        }
    }

    Ok(())
}
