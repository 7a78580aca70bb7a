//! `GET /health` — liveness endpoint.
//!
//! A liveness check an operator can hit without touching the index or the
//! embedding backend at all, kept as ambient ops surface alongside the
//! indexing and chat routes.

use axum::Json;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;

static SERVER_START: LazyLock<Instant> = LazyLock::new(Instant::now);

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: SERVER_START.elapsed().as_secs(),
    })
}
