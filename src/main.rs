//! Strictly Boards - server binary
//!
//! Serves chess and backgammon sessions over HTTP.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use axum::{body::Body, http::Request};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use strictly_boards::{
    GameObserver, GameRepository, GameService, MemoryStore, ResultRecorder, ServerConfig,
    SnapshotStore, TracingObserver, restore_session,
};
use strictly_rules::GameKind;
use tower::ServiceBuilder;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port, host } => run_server(config, host, port).await,
        Command::Replay { kind, record } => replay(kind, record),
        Command::Stats { db_path, player_id } => stats(db_path, player_id),
    }
}

/// Run the HTTP game server
#[instrument(skip_all)]
async fn run_server(
    config_path: Option<std::path::PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    }
    .with_env();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    info!(?config, "Starting Strictly Boards server");

    let mut observers: Vec<Arc<dyn GameObserver>> = vec![Arc::new(TracingObserver)];
    let store: Arc<dyn SnapshotStore> = match config.database_url() {
        Some(url) => {
            let repo = GameRepository::open(url)?;
            observers.push(Arc::new(ResultRecorder::new(repo.clone())));
            Arc::new(repo)
        }
        None => {
            warn!("No database configured, sessions will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let service = GameService::new(config.service_config(), store, observers);

    let sweeper = service.clone();
    let interval = config.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let service = sweeper.clone();
            let swept = tokio::task::spawn_blocking(move || service.sweep_idle(chrono::Utc::now())).await;
            match swept {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "Idle sweep failed"),
                Err(e) => warn!(error = %e, "Idle sweep task failed"),
            }
        }
    });

    let app = strictly_boards::router(service).layer(ServiceBuilder::new().map_request(
        |req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        },
    ));

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port()))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());
    axum::serve(listener, app).await?;
    Ok(())
}

/// Replay a session record and print its final state
#[instrument(skip_all, fields(path = %path.display()))]
fn replay(kind: GameKind, path: std::path::PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let session = restore_session(kind, &text)?;
    let snapshot = session.snapshot();
    info!(status = %snapshot.status(), plies = snapshot.plies(), "Record replayed");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Print a player's record
#[instrument]
fn stats(db_path: String, player_id: String) -> Result<()> {
    let repo = GameRepository::open(&db_path)?;
    let record = repo.player_record(&player_id)?;
    println!(
        "{}: {} games, {} wins, {} losses, {} draws ({:.1}%), points {}-{}",
        player_id,
        record.games(),
        record.wins(),
        record.losses(),
        record.draws(),
        record.win_rate(),
        record.points_won(),
        record.points_lost(),
    );
    Ok(())
}
