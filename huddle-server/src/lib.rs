mod config;
mod http;
mod registry;
mod signaling;

pub use config::*;
pub use http::*;
pub use registry::*;
pub use signaling::*;

use anyhow::Context;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP and WebSocket routes of the registry.
pub fn router(manager: SessionManager) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/create-meeting", post(create_meeting))
        .route("/session/{sessionId}", get(ws_handler))
        .with_state(manager)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves the registry on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, manager: SessionManager) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("Huddle registry listening on {}", addr);

    axum::serve(listener, router(manager))
        .await
        .context("registry server stopped")
}
