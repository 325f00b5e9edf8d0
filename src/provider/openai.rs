use super::client::OpenAiHttpClient;
use super::mime::{detect_image_mime, upload_file_name};
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use super::{ensure_legacy_operation, ImageProvider};
use crate::models::{
    GeneratedImage, ImageEditRequest, ImageModel, ImageSize, ImageVariationRequest,
    NormalizedRequest,
};
use crate::validation::validate_prompt;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::SecretString;
use std::time::Duration;

const GENERATIONS_PATH: &str = "/v1/images/generations";
const EDITS_PATH: &str = "/v1/images/edits";
const VARIATIONS_PATH: &str = "/v1/images/variations";

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
}

impl OpenAiImageClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: OpenAiHttpClient::new(base_url, timeout)?,
        })
    }

    pub fn new_with_client(base_url: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(base_url, client),
        }
    }
}

fn image_part(bytes: &[u8], stem: &str) -> Result<Part> {
    Ok(Part::bytes(bytes.to_vec())
        .file_name(upload_file_name(stem, bytes))
        .mime_str(detect_image_mime(bytes))?)
}

fn ensure_size(model: ImageModel, size: ImageSize) -> Result<()> {
    if model.supports_size(size) {
        return Ok(());
    }
    Err(Error::UnsupportedSize {
        model: model.to_string(),
        size: size.to_string(),
        allowed: model
            .allowed_sizes()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn collect_images(response: ImageGenerationResponse) -> Result<Vec<GeneratedImage>> {
    if response.data.is_empty() {
        return Err(Error::ProviderUnavailable("No image generated".to_string()));
    }
    Ok(response.data.into_iter().map(GeneratedImage::from).collect())
}

#[async_trait]
impl ImageProvider for OpenAiImageClient {
    async fn generate(
        &self,
        request: &NormalizedRequest,
        credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>> {
        let advanced = request.model.is_advanced();
        let body = ImageGenerationRequest {
            model: request.model.as_str().to_string(),
            prompt: request.prompt.clone(),
            n: request.image_count,
            size: request.size.as_str().to_string(),
            quality: advanced.then(|| request.quality.as_str().to_string()),
            style: request.style.map(|s| s.as_str().to_string()),
            response_format: request.response_format.as_str().to_string(),
        };

        tracing::debug!(
            "Sending image generation request to OpenAI (model {}, size {}, n {})",
            body.model,
            body.size,
            body.n
        );

        let response: ImageGenerationResponse = self
            .http
            .post_json(GENERATIONS_PATH, &body, credential)
            .await?;

        collect_images(response)
    }

    async fn edit(
        &self,
        request: &ImageEditRequest,
        credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>> {
        ensure_legacy_operation(request.model, "Image edit")?;
        validate_prompt(&request.prompt, request.model)?;
        ensure_size(request.model, request.size)?;

        let mut form = Form::new()
            .part("image", image_part(&request.image, "image")?)
            .text("prompt", request.prompt.clone())
            .text("model", request.model.as_str())
            .text("size", request.size.as_str())
            .text("n", request.clamped_image_count().to_string())
            .text("response_format", request.response_format.as_str());
        if let Some(mask) = &request.mask {
            form = form.part("mask", image_part(mask, "mask")?);
        }

        tracing::debug!(
            "Sending image edit request to OpenAI ({} bytes, mask: {})",
            request.image.len(),
            request.mask.is_some()
        );

        let response: ImageGenerationResponse = self
            .http
            .post_multipart(EDITS_PATH, form, credential)
            .await?;

        collect_images(response)
    }

    async fn create_variation(
        &self,
        request: &ImageVariationRequest,
        credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>> {
        ensure_legacy_operation(request.model, "Image variation")?;
        ensure_size(request.model, request.size)?;

        let form = Form::new()
            .part("image", image_part(&request.image, "image")?)
            .text("model", request.model.as_str())
            .text("size", request.size.as_str())
            .text("n", request.clamped_image_count().to_string())
            .text("response_format", request.response_format.as_str());

        tracing::debug!(
            "Sending image variation request to OpenAI ({} bytes)",
            request.image.len()
        );

        let response: ImageGenerationResponse = self
            .http
            .post_multipart(VARIATIONS_PATH, form, credential)
            .await?;

        collect_images(response)
    }
}
