pub mod pages;
mod routes;
pub mod urls;
pub mod viewer;

pub use routes::router;
pub use viewer::{MaybeViewer, RequireViewer};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::policy::{ModerationPolicy, RoleModerationPolicy};

/// Shared forum state.
#[derive(Clone)]
pub struct ForumState {
    pub db: Database,
    pub config: Arc<Config>,
    pub policy: Arc<dyn ModerationPolicy>,
}

impl ForumState {
    /// Create forum state with the default role-based moderation policy.
    #[must_use]
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            policy: Arc::new(RoleModerationPolicy),
        }
    }

    /// Replace the moderation policy, e.g. with a host-specific one.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn ModerationPolicy>) -> Self {
        self.policy = policy;
        self
    }
}

/// Build the forum as a ready-to-mount `Router`.
///
/// Host applications nest this under a path of their choosing and install
/// middleware that injects the signed-in [`crate::user::ForumUser`] into
/// request extensions:
///
/// ```ignore
/// let forum = forum_engine::web::forum(state);
/// let app = Router::new().nest("/forum", forum);
/// ```
#[must_use]
pub fn forum(state: ForumState) -> Router {
    Router::new().merge(routes::router()).with_state(state)
}

/// Start the standalone demo web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(config: Config, db: Database) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let state = ForumState::new(db, config);
    let app = create_app(state);

    info!(addr = %addr, "Starting forum web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app).await.context("Web server error")?;

    Ok(())
}

/// Create the main application router.
fn create_app(state: ForumState) -> Router {
    // Determine static files directory
    let static_dir = find_static_dir();
    info!(static_dir = ?static_dir, "Serving static files");

    Router::new()
        .merge(routes::router())
        .nest_service("/static", ServeDir::new(&static_dir))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Find the static files directory.
///
/// Checks in order:
/// 1. ./static (development)
/// 2. /usr/share/forum-engine/static (installed)
/// 3. Falls back to ./static
fn find_static_dir() -> PathBuf {
    let candidates = [
        PathBuf::from("./static"),
        PathBuf::from("/usr/share/forum-engine/static"),
    ];

    for path in &candidates {
        if path.exists() && path.is_dir() {
            return path.clone();
        }
    }

    // Default fallback
    PathBuf::from("./static")
}
