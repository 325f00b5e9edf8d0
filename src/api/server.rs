use super::handlers::{capabilities_handler, generate_image_handler, health_handler};
use crate::pipeline::ImagePipeline;
use crate::Result;
use axum::routing::{get, post};
use axum::Router;
use secrecy::SecretString;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub pipeline: ImagePipeline,
    /// Provider credential; `None` when the deployment has none configured.
    pub credential: Option<SecretString>,
}

impl AppState {
    pub fn new(pipeline: ImagePipeline, credential: Option<SecretString>) -> Self {
        Self {
            pipeline,
            credential,
        }
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/generate-image",
            post(generate_image_handler).get(capabilities_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Image gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(state)).await?;
    Ok(())
}
