use api_client::CoinGeckoClient;
use axum::{Router, routing::get};
use configuration::Config;
use engine::ReportPipeline;
use report::SvgReportRenderer;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ReportPipeline,
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/predict/:coin_id", get(handlers::predict))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Wires the live CoinGecko client and the SVG renderer into a pipeline and
/// serves it on the configured address.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let client = CoinGeckoClient::new(&config.provider)?;
    let pipeline = ReportPipeline::new(
        config,
        Arc::new(client),
        Some(Arc::new(SvgReportRenderer::default())),
    );
    run_server(config.server.socket_addr(), Arc::new(AppState { pipeline })).await
}

/// Binds `addr` and serves the router until the process exits.
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
