//! Response bodies for the generation and capability endpoints.

use crate::models::{GenerationResult, ModelCapabilities};
use crate::pricing::PricingSchedule;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;

/// Successful generation. Only the first image is returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub success: bool,
    pub image: ImagePayload,
    pub cost: Decimal,
    pub original_prompt: String,
    pub revised_prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

impl GenerateImageResponse {
    pub fn from_result(result: GenerationResult) -> Result<Self> {
        let revised_prompt = result.revised_prompt().to_string();
        let image = result
            .images
            .into_iter()
            .next()
            .ok_or_else(|| Error::ProviderUnavailable("No image generated".to_string()))?;

        Ok(Self {
            success: true,
            image: ImagePayload {
                url: image.url,
                b64: image.b64_json,
                revised_prompt: image.revised_prompt,
            },
            cost: result.estimated_cost,
            original_prompt: result.original_prompt,
            revised_prompt,
        })
    }
}

/// Read-only view of configuration state and the static model tables.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesResponse {
    pub configured: bool,
    pub models: Vec<ModelCapabilities>,
    pub pricing: PricingSchedule,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
