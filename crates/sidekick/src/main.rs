//! # Sidekick CLI (`sk`)
//!
//! Terminal frontend for the completion and retrieval pipeline. The
//! same admission functions an editor host would call are exposed as
//! commands:
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sk complete` | Inline completion for code piped on stdin |
//! | `sk explain <code>` | Natural-language explanation of a snippet |
//! | `sk search <query>` | Natural-language search over the workspace |
//! | `sk profile [host]` | Show the resolved platform profile |
//!
//! ## Examples
//!
//! ```bash
//! echo "fn main() {" | sk complete
//! sk explain "zpool create tank mirror /dev/da0 /dev/da1"
//! sk search "where is the config file parsed" --config ./config/sk.toml
//! sk profile openbsd
//! sk search "query" --json    # one JSON object per result line
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sidekick::assist::{Assistant, ConsoleSink, JsonSink};
use sidekick::backend::create_backend;
use sidekick::config::{self, Config};
use sidekick_core::engine::EngineSession;
use sidekick_core::models::{DocumentSnapshot, Position, RenderSink};
use sidekick_core::platform;

/// Sidekick — a local-first completion and retrieval assistant for
/// on-device language models.
#[derive(Parser)]
#[command(
    name = "sk",
    about = "Sidekick — a local-first completion and retrieval assistant for on-device language models",
    version,
    long_about = "Sidekick turns surrounding source text into inline completions, explanations, \
    and natural-language workspace search, using a local OpenAI-compatible inference endpoint \
    as a black box. All truncation bounds and sampling parameters are read from a TOML config."
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./config/sk.toml")]
    config: PathBuf,

    /// Emit results as JSON lines instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Complete code piped on stdin.
    ///
    /// The piped text is the document snapshot; the cursor sits at the
    /// very end. Prints the single-line suggestion, or a "no suggestion"
    /// notice when the engine is unavailable.
    Complete,

    /// Explain a code snippet.
    Explain {
        /// The code to explain.
        code: String,
    },

    /// Search the workspace with a natural-language query.
    ///
    /// Enumerates files under `[workspace].root` (include/exclude globs
    /// apply), sends the first `corpus_cap` excerpts to the engine, and
    /// prints its narration.
    Search {
        /// The search query.
        query: String,
    },

    /// Show the platform profile a host identifier resolves to.
    Profile {
        /// Host identifier (defaults to the OS this binary was built for).
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Profile resolution is pure and needs no config.
    if let Commands::Profile { host } = &cli.command {
        let host = host
            .clone()
            .unwrap_or_else(|| std::env::consts::OS.to_string());
        let profile = platform::resolve(&host);
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "host": host, "profile": profile })
            );
        } else {
            println!("host:    {}", host);
            println!("model:   {}", profile.model_size.model_id());
            println!("threads: {}", profile.threads);
            println!("backend: {:?}", profile.backend_hint);
        }
        return Ok(());
    }

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::minimal()
    };

    let sink: Box<dyn RenderSink> = if cli.json {
        Box::new(JsonSink)
    } else {
        Box::new(ConsoleSink)
    };
    let assistant = Assistant::new(cfg.clone(), build_session(&cfg), sink);

    match cli.command {
        Commands::Complete => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read code context from stdin")?;
            let snapshot = DocumentSnapshot::from_text(&text);
            let last_line = snapshot.line_count() - 1;
            let cursor = Position::new(
                last_line,
                snapshot.line(last_line).map(str::len).unwrap_or(0),
            );
            assistant.on_edit_event("stdin", &snapshot, cursor).await?;
        }
        Commands::Explain { code } => {
            assistant.on_explain_request(&code).await?;
        }
        Commands::Search { query } => {
            assistant.on_search_request(&query).await?;
        }
        Commands::Profile { .. } => unreachable!(),
    }

    Ok(())
}

/// Resolve the platform profile and attach the configured backend.
fn build_session(cfg: &Config) -> EngineSession {
    let host = cfg
        .engine
        .host
        .clone()
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    let profile = platform::resolve(&host);

    let mut session = EngineSession::new(profile);
    session.mark_loading();
    match create_backend(&cfg.engine, profile.model_size.model_id()) {
        Ok(backend) => session.mark_ready(backend),
        Err(e) => session.mark_failed(e.to_string()),
    }
    session
}
