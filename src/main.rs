mod api;
mod config;
mod error;
mod frontend;
mod models;
mod services;

use crate::api::AppState;
use crate::config::Config;
use crate::services::{
    ArtifactPublisher, LibraryAggregator, LibraryExporter, PaginatedFetcher, TokenExchange,
};
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,libx=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Shared upstream client and content store
    let http = reqwest::Client::builder()
        .user_agent(concat!("libx/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let publisher = ArtifactPublisher::connect(&config.storage)?;
    tracing::info!("Content store ready (bucket {})", config.storage.bucket);

    // Initialize services
    let tokens = Arc::new(TokenExchange::new(
        config.spotify.clone(),
        config.apple.clone(),
        http.clone(),
    ));
    let aggregator = LibraryAggregator::new(PaginatedFetcher::new(http), &config);
    let exporter = Arc::new(LibraryExporter::new(aggregator, publisher, tokens.clone()));

    let app_state = Arc::new(AppState { tokens, exporter });

    // Build router
    let mut app = api::router(app_state);

    // Frontend SPA - catch-all (must be set before layers)
    if let Some(dir) = config.static_dir.as_deref() {
        tracing::info!("Serving frontend from {}", dir);
        app = app.fallback_service(frontend::serve_frontend(dir));
    }

    let app = app
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    cors.allow_origin(allowed).allow_credentials(true)
}
