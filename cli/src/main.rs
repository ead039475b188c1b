//! Service entrypoint for counsel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use counsel_application::{
    ConversationStore, PersistTurnUseCase, RecentHistoryUseCase, SafeChatModel, StreamChatUseCase,
};
use counsel_infrastructure::{
    AzureChatClient, ConfigLoader, InMemoryConversationStore, JsonlConversationStore,
};
use counsel_presentation::{AppState, build_router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "counsel", about = "Insurance consultation chat backend", version)]
struct Cli {
    /// Path to a TOML config file (merged above the discovered ones).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host override.
    #[arg(long)]
    host: Option<String>,

    /// Bind port override.
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let config = ConfigLoader::load(cli.config.as_ref())
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    // Stderr by default; daily-rolling files when a log dir is configured.
    let _guard = match &config.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "counsel.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    };

    info!("Starting counsel");

    // === Dependency Injection ===
    // Provider adapter, wrapped in the resilient proxy.
    let client = Arc::new(AzureChatClient::new(&config.model)?);
    info!(model = %config.model.name, "model client ready");
    let model = SafeChatModel::new(client);

    let store: Arc<dyn ConversationStore> = match &config.persistence.path {
        Some(path) => {
            info!(path = %path, "conversation persistence enabled");
            Arc::new(JsonlConversationStore::new(path)?)
        }
        None => {
            info!("no persistence path configured; conversations stay in memory");
            Arc::new(InMemoryConversationStore::new())
        }
    };

    let state = Arc::new(AppState {
        stream_chat: StreamChatUseCase::new(model),
        persist_turn: PersistTurnUseCase::new(store.clone()),
        recent_history: RecentHistoryUseCase::new(store),
        history_turns: config.history.max_turns,
    });

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
