// Web server for the settlement trigger API

use std::net::SocketAddr;
use std::sync::Arc;

use http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::application::pipeline::PipelineLauncher;
use crate::config::AppConfig;
use crate::utils::logging;

use super::routes::{create_router, AppState};

/// Start the trigger API server
pub async fn start_server(config: &AppConfig, launcher: Arc<PipelineLauncher>) {
    let state = AppState { launcher };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any);

    let app = create_router(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    logging::log_info(&format!(
        "Starting trigger API on http://localhost:{}",
        config.server.port
    ));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
