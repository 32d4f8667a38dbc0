//! Chat server bootstrap and router wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use orin_agent::Responder;

use crate::handlers::{
    handle_auth_callback, handle_chat, handle_login, handle_logout, handle_root, handle_upload,
    ROUTE_AUTH_CALLBACK, ROUTE_CHAT, ROUTE_LOGIN, ROUTE_LOGOUT, ROUTE_ROOT, ROUTE_UPLOAD,
};
use crate::types::{GatewayConfig, ServerState};

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Serves the chat application until interrupted.
pub async fn run(config: GatewayConfig, responder: Responder) -> anyhow::Result<()> {
    let GatewayConfig {
        bind,
        oauth,
        session_secret,
        session_ttl_seconds,
    } = config;

    let bind_addr = bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address '{bind}'"))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind chat server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound chat server address")?;

    println!("orin chat server listening: addr={local_addr}");

    let state = Arc::new(ServerState::new(
        responder,
        oauth,
        session_secret,
        session_ttl_seconds,
    )?);
    let app = build_chat_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("chat server exited unexpectedly")?;

    Ok(())
}

/// Builds the application router over shared server state.
pub fn build_chat_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(ROUTE_ROOT, get(handle_root))
        .route(ROUTE_CHAT, post(handle_chat))
        .route(ROUTE_UPLOAD, post(handle_upload))
        .route(ROUTE_LOGIN, get(handle_login))
        .route(ROUTE_AUTH_CALLBACK, get(handle_auth_callback))
        .route(ROUTE_LOGOUT, get(handle_logout))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
