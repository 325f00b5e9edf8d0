//! OpenAI Images API payloads.

use crate::models::GeneratedImage;
use serde::{Deserialize, Serialize};

/// Request body for `/v1/images/generations`.
#[derive(Debug, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub response_format: String,
}

/// Response shared by generations, edits and variations.
#[derive(Debug, Deserialize)]
pub struct ImageGenerationResponse {
    pub data: Vec<ImageData>,
}

/// One generated image item (URL or base64).
#[derive(Debug, Deserialize)]
pub struct ImageData {
    pub url: Option<String>,
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

impl From<ImageData> for GeneratedImage {
    fn from(data: ImageData) -> Self {
        Self {
            url: data.url,
            b64_json: data.b64_json,
            revised_prompt: data.revised_prompt,
        }
    }
}
