//! Liveness endpoint.
//!
//! `GET /health` answers `{"status":"ok","rooms":N}` for load balancers and
//! uptime probes. It reads the room count only and never touches a room.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::ServerContext;

/// Body of a `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub rooms: usize,
}

/// Creates the health router.
pub fn health_router(ctx: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(ctx)
}

async fn health_handler(State(ctx): State<Arc<ServerContext>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        rooms: ctx.room_count().await,
    })
}
