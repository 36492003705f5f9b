//! Geosections - geological sections service
//!
//! This library provides the HTTP service for storing geological sections.
//! It handles:
//! - Section and geological class CRUD over a REST API
//! - SQLite persistence with versioned migrations
//! - Background spreadsheet import and export jobs
//! - HTTP Basic authentication with role based access

#![recursion_limit = "256"]

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod jobs;
pub mod models;
pub mod spreadsheet;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use auth::{AuthError, UserStore};
use config::Config;
use db::Database;
use models::FieldErrors;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub users: Arc<UserStore>,
}

impl AppState {
    /// Build the state, hashing the configured account passwords
    pub fn new(db: Database, config: Config) -> Result<Self, AuthError> {
        let users = UserStore::from_config(&config)?;
        Ok(Self {
            db: Arc::new(db),
            config: Arc::new(config),
            users: Arc::new(users),
        })
    }
}

/// Error type for HTTP handlers, rendered as a problem detail
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("No route found")]
    NoRoute,

    #[error("Request method not supported")]
    MethodNotAllowed,

    #[error("File not found")]
    FileNotFound,

    #[error("Export is still in progress")]
    ExportInProgress,

    #[error("One or more fields have validation errors")]
    Validation(FieldErrors),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Missing part: {0}")]
    MissingPart(&'static str),

    #[error("Current request is not a multipart request")]
    NotMultipart,

    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error("Required request body is missing")]
    BodyMissing,

    #[error("Full authentication is required to access this resource")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Job error: {0}")]
    Job(#[from] jobs::JobError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ============================================================================
// Service Setup
// ============================================================================

/// Initialize tracing from a filter directive such as `info` or `geosections=debug`
pub fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Open the database, run migrations, seed data and build the shared state
pub fn prepare_state(config: Config) -> anyhow::Result<AppState> {
    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("failed to create work dir {:?}", config.work_dir))?;

    tracing::info!("Database path: {:?}", config.database);
    let database = Database::open(&config.database).context("failed to open database")?;
    let applied = database.initialize().context("failed to migrate database")?;
    tracing::info!("Database initialized successfully ({} migrations applied)", applied);

    if config.seed_sample_data {
        bootstrap::seed_sample_data(&database).context("failed to seed sample data")?;
    }

    AppState::new(database, config).context("failed to prepare accounts")
}

/// Run the HTTP service until Ctrl-C
pub async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting geosections service");

    let bind_addr = config.bind_addr;
    let state = prepare_state(config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
