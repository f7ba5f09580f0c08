use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use download_link_resolver::{AnalyzeRequest, Resolver, ResolverConfig};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ResolverConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    tracing::info!(
        browser = config.browser_enabled,
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        render_timeout_secs = config.render_timeout.as_secs(),
        "resolver configured"
    );
    let resolver = Arc::new(Resolver::new(config));

    let app = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze_endpoint))
        .with_state(resolver);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn analyze_endpoint(
    State(resolver): State<Arc<Resolver>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let result = resolver.resolve(&req.url).await;
    if let Some(error) = &result.error {
        tracing::info!(url = %req.url, "analysis failed: {}", error);
    }
    Json(result)
}
