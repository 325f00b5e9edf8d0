use super::response::{CapabilitiesResponse, GenerateImageResponse};
use super::server::AppState;
use crate::models::{GenerationRequest, ImageModel};
use crate::{Error, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

/// POST /api/generate-image
pub async fn generate_image_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>> {
    let Json(request) =
        payload.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;

    tracing::debug!(
        "Image generation request received: prompt_len={}, model={:?}",
        request.prompt.as_deref().map_or(0, |p| p.chars().count()),
        request.model
    );

    let result = state
        .pipeline
        .run(&request, state.credential.as_ref())
        .await?;

    Ok(Json(GenerateImageResponse::from_result(result)?))
}

/// GET /api/generate-image
pub async fn capabilities_handler(
    State(state): State<Arc<AppState>>,
) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        configured: state.credential.is_some(),
        models: ImageModel::ALL.iter().map(|m| m.capabilities()).collect(),
        pricing: state.pipeline.pricing().schedule(),
    })
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
