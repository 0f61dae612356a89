//! # HTTP Listener
//!
//! Binds the pure route handlers of [`pipeline::serving`] to an `axum`
//! router. Requests only read the cache and counters, so they never wait
//! on the capture or upload tasks.

use std::io;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use pipeline::serving::{self, RouteResponse, IMAGE_ROUTE, INDEX_ROUTE, STATS_ROUTE};
use pipeline::{Connectivity, PipelineStats, ResultCache};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Shared state handed to every request
#[derive(Clone)]
pub struct ServerState {
    cache: Arc<ResultCache>,
    stats: Arc<PipelineStats>,
    link: Arc<dyn Connectivity + Send + Sync>,
}

impl ServerState {
    pub fn new(
        cache: Arc<ResultCache>,
        stats: Arc<PipelineStats>,
        link: Arc<dyn Connectivity + Send + Sync>,
    ) -> Self {
        Self { cache, stats, link }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(INDEX_ROUTE, get(index))
        .route(IMAGE_ROUTE, get(image))
        .route(STATS_ROUTE, get(stats))
        .fallback(not_found)
        .with_state(state)
}

/// Serve until `shutdown` turns true
pub async fn serve(
    listener: TcpListener,
    state: ServerState,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<()> {
    log::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    log::info!("HTTP server stopped");
    Ok(())
}

async fn index(State(state): State<ServerState>) -> Response {
    to_response(serving::index(state.link.local_addr()))
}

async fn image(State(state): State<ServerState>) -> Response {
    to_response(serving::image(&state.cache))
}

async fn stats(State(state): State<ServerState>) -> Response {
    to_response(serving::stats(&state.stats.snapshot()))
}

async fn not_found() -> Response {
    to_response(serving::not_found())
}

fn to_response(route: RouteResponse) -> Response {
    let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [
            (header::CONTENT_TYPE, route.content_type),
            (header::CACHE_CONTROL, "no-store"),
        ],
        route.body,
    )
        .into_response()
}
