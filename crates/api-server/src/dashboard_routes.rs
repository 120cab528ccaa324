//! Dashboard API Routes
//!
//! Ticker index, health check and the per-ticker dashboard.

use analysis_orchestrator::Dashboard;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::tickers::{ASX_TICKERS, EXAMPLE_TICKERS};
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct TickerIndex {
    pub example_tickers: Vec<&'static str>,
    pub asx_tickers: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/dashboard/:ticker", get(get_dashboard))
}

async fn index() -> Json<TickerIndex> {
    Json(TickerIndex {
        example_tickers: EXAMPLE_TICKERS.to_vec(),
        asx_tickers: ASX_TICKERS.to_vec(),
    })
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state.orchestrator.dashboard(&ticker).await?;
    Ok(Json(dashboard))
}
