//! chatsum-server – entry point.
//!
//! Startup order:
//! 1. Load `.env`, parse configuration and CLI flags.
//! 2. Initialise structured tracing (JSON or pretty, optionally to rolling files).
//! 3. Dispatch `models` / `probe` subcommands, or:
//! 4. Open the SQLite database and run pending migrations.
//! 5. Build the Gemini summarizer.
//! 6. Build the Axum router and start the HTTP server with graceful shutdown.

mod cli;
mod config;
mod entities;
mod error;
mod extract;
mod middleware;
mod routes;
mod schemas;
mod state;
mod summarizer;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::entities::SqliteStore;
use crate::state::AppState;
use crate::summarizer::GeminiSummarizer;

const PROBE_PROMPT: &str = "Reply with the single word: ok";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("WARN: failed to load .env: {e}"),
    }
    let cli = Cli::parse();
    let mut cfg = Config::from_env();
    cli.apply(&mut cfg);

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let _guard = init_tracing(&cfg);

    // ── 3. One-shot commands ───────────────────────────────────────────────────
    match cli.command() {
        Command::Serve => serve(cfg).await,
        Command::Models => list_models(&cfg).await,
        Command::Probe { models } => probe(&cfg, models).await,
    }
}

/// Install the global subscriber. The returned guard flushes the file writer
/// on drop and must live until exit.
fn init_tracing(cfg: &Config) -> Option<WorkerGuard> {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: CHATSUM_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let (writer, guard) = match &cfg.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chatsum-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(cfg.log_dir.is_none())
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    guard
}

async fn serve(cfg: Config) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "chatsum-server starting");

    // ── 4. Database ────────────────────────────────────────────────────────────
    let store = SqliteStore::connect(&cfg.database_url, cfg.db_max_connections)
        .await
        .with_context(|| format!("failed to open database {}", cfg.database_url))?;
    info!(database_url = %cfg.database_url, "database ready");

    // ── 5. Summarizer ──────────────────────────────────────────────────────────
    let summarizer = GeminiSummarizer::new(cfg.gemini.clone())?;
    if summarizer.is_configured() {
        info!(model = summarizer.model(), "Gemini summarizer configured");
    } else {
        warn!("GEMINI_API_KEY is not set; summaries will return a configuration notice");
    }

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store: Arc::new(store),
        summarizer: Arc::new(summarizer),
    });

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", cfg.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("chatsum-server stopped");
    Ok(())
}

async fn list_models(cfg: &Config) -> anyhow::Result<()> {
    let gemini = GeminiSummarizer::new(cfg.gemini.clone())?;
    if !gemini.is_configured() {
        bail!("GEMINI_API_KEY is not set");
    }
    let models = gemini.list_models().await?;
    for model in models.iter().filter(|m| m.supports_generate_content()) {
        println!("{}\t{}", model.name, model.display_name.as_deref().unwrap_or(""));
    }
    Ok(())
}

async fn probe(cfg: &Config, models: &[String]) -> anyhow::Result<()> {
    let gemini = GeminiSummarizer::new(cfg.gemini.clone())?;
    if !gemini.is_configured() {
        bail!("GEMINI_API_KEY is not set");
    }
    let models = if models.is_empty() {
        vec![gemini.model().to_owned()]
    } else {
        models.to_vec()
    };

    let mut working = 0usize;
    for model in &models {
        match gemini.generate(model, PROBE_PROMPT).await {
            Ok(text) => {
                working += 1;
                println!("OK      {model}: {}", text.trim());
            }
            Err(e) => println!("FAILED  {model}: {e}"),
        }
    }
    if working == 0 {
        bail!("none of the {} probed models responded", models.len());
    }
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
