use analysis_orchestrator::AnalysisOrchestrator;
use axum::Router;
use news_client::NewsApiClient;
use polygon_client::PolygonClient;
use sentiment_analysis::SentimentAnalysisEngine;
use yahoo_client::YahooClient;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod dashboard_routes;
pub mod error;
pub mod providers;
pub mod tickers;

pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use providers::{MarketDataRouter, Venue};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

/// Wire the concrete providers described by `config`.
pub fn build_orchestrator(config: &ServerConfig) -> AnalysisOrchestrator {
    let polygon = Arc::new(PolygonClient::new(
        config.polygon_api_key.clone(),
        config.polygon_rate_limit,
    ));
    let market_data = Arc::new(MarketDataRouter::new(
        Venue::new(polygon),
        Venue::new(Arc::new(YahooClient::new())),
    ));
    let news = Arc::new(NewsApiClient::new(config.news_api_key.clone()));

    AnalysisOrchestrator::new(
        market_data.clone(),
        market_data,
        news,
        Arc::new(SentimentAnalysisEngine::new()),
    )
    .with_lookback_days(config.lookback_days)
    .with_headline_limit(config.headline_limit)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(dashboard_routes::dashboard_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    if config.news_api_key.is_none() {
        tracing::warn!("NEWS_API_KEY is not set; real news headlines will not be fetched");
    }

    let state = AppState {
        orchestrator: Arc::new(build_orchestrator(&config)),
    };
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Signal dashboard API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
