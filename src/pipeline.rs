//! Request orchestration: normalize, enhance, price, then call the provider.

use crate::enhance::enhance;
use crate::models::{
    Config, GeneratedImage, GenerationRequest, GenerationResult, ImageEditRequest,
    ImageVariationRequest, NormalizedRequest,
};
use crate::pricing::PricingTable;
use crate::provider::{ensure_legacy_operation, ImageProvider, OpenAiImageClient};
use crate::validation::{validate_prompt, Normalizer};
use crate::{Error, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request that passed every local stage and is ready for the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedGeneration {
    pub normalized: NormalizedRequest,
    pub original_prompt: String,
    pub effective_prompt: String,
    pub estimated_cost: Decimal,
}

/// Runs generation requests end to end. Holds no per-request state, so one
/// instance is shared by every concurrent request.
pub struct ImagePipeline {
    provider: Box<dyn ImageProvider>,
    pricing: PricingTable,
    normalizer: Normalizer,
}

/// Injectable service bundle used to construct [`ImagePipeline`] in tests.
pub struct PipelineServices {
    pub provider: Box<dyn ImageProvider>,
    pub pricing: PricingTable,
    pub normalizer: Normalizer,
}

impl ImagePipeline {
    pub fn with_services(services: PipelineServices) -> Self {
        Self {
            provider: services.provider,
            pricing: services.pricing,
            normalizer: services.normalizer,
        }
    }

    /// Build the production pipeline backed by the OpenAI Images API.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider =
            OpenAiImageClient::new(config.openai_base_url.clone(), config.provider_timeout)?;

        Ok(Self::with_services(PipelineServices {
            provider: Box::new(provider),
            pricing: PricingTable::standard(),
            normalizer: Normalizer::new(config.strict_size_validation),
        }))
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Local stages only: validation, prompt enhancement and cost estimate.
    pub fn prepare(&self, request: &GenerationRequest) -> Result<PreparedGeneration> {
        let normalized = self.normalizer.normalize(request)?;

        let effective_prompt = if normalized.enhance {
            enhance(&normalized.prompt)
        } else {
            normalized.prompt.clone()
        };

        // Priced from the normalized options; enhancement never changes cost.
        let estimated_cost = self.pricing.total_cost(
            normalized.model,
            normalized.quality,
            normalized.size,
            normalized.image_count,
        );

        Ok(PreparedGeneration {
            original_prompt: normalized.prompt.clone(),
            normalized: normalized.with_prompt(effective_prompt.clone()),
            effective_prompt,
            estimated_cost,
        })
    }

    pub async fn run(
        &self,
        request: &GenerationRequest,
        credential: Option<&SecretString>,
    ) -> Result<GenerationResult> {
        let prepared = self.prepare(request)?;
        let credential = require_credential(credential)?;

        let request_id = Uuid::new_v4();
        let normalized = &prepared.normalized;
        debug!(
            "[{}] Estimated cost ${} for {} x {} {} ({})",
            request_id,
            prepared.estimated_cost,
            normalized.image_count,
            normalized.model,
            normalized.size,
            normalized.quality.as_str()
        );

        let images = match self.provider.generate(normalized, credential).await {
            Ok(images) => ensure_images(images)?,
            Err(e) => {
                warn!(
                    "[{}] Generation failed (estimated cost ${}): {}",
                    request_id, prepared.estimated_cost, e
                );
                return Err(e);
            }
        };

        info!(
            request_id = %request_id,
            model = normalized.model.as_str(),
            size = normalized.size.as_str(),
            quality = normalized.quality.as_str(),
            images = images.len(),
            cost = %prepared.estimated_cost,
            timestamp = %Utc::now().to_rfc3339(),
            "Image generated"
        );

        Ok(GenerationResult {
            images,
            estimated_cost: prepared.estimated_cost,
            original_prompt: prepared.original_prompt,
            effective_prompt: prepared.effective_prompt,
        })
    }

    pub async fn edit(
        &self,
        request: &ImageEditRequest,
        credential: Option<&SecretString>,
    ) -> Result<Vec<GeneratedImage>> {
        ensure_legacy_operation(request.model, "Image edit")?;
        validate_prompt(&request.prompt, request.model)?;
        let credential = require_credential(credential)?;

        let images = ensure_images(self.provider.edit(request, credential).await?)?;
        info!("Edited image with {} ({} results)", request.model, images.len());
        Ok(images)
    }

    pub async fn create_variation(
        &self,
        request: &ImageVariationRequest,
        credential: Option<&SecretString>,
    ) -> Result<Vec<GeneratedImage>> {
        ensure_legacy_operation(request.model, "Image variation")?;
        let credential = require_credential(credential)?;

        let images = ensure_images(self.provider.create_variation(request, credential).await?)?;
        info!(
            "Created {} variation(s) with {}",
            images.len(),
            request.model
        );
        Ok(images)
    }
}

fn require_credential(credential: Option<&SecretString>) -> Result<&SecretString> {
    credential.ok_or_else(|| {
        Error::Unauthenticated("OPENAI_API_KEY is not set in the environment".to_string())
    })
}

fn ensure_images(images: Vec<GeneratedImage>) -> Result<Vec<GeneratedImage>> {
    if images.is_empty() {
        return Err(Error::ProviderUnavailable("No image generated".to_string()));
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageModel, ImageSize, Quality};
    use crate::provider::MockImageProvider;
    use std::sync::Arc;
    use std::time::Duration;

    fn key() -> SecretString {
        SecretString::from("sk-test".to_string())
    }

    fn pipeline_with(provider: MockImageProvider) -> ImagePipeline {
        ImagePipeline::with_services(PipelineServices {
            provider: Box::new(provider),
            pricing: PricingTable::standard(),
            normalizer: Normalizer::default(),
        })
    }

    #[tokio::test]
    async fn test_a_cat_is_enhanced_and_priced() {
        let provider = MockImageProvider::new();
        let spy = provider.clone();
        let pipeline = pipeline_with(provider);

        let result = pipeline
            .run(&GenerationRequest::new("a cat"), Some(&key()))
            .await
            .unwrap();

        assert_eq!(result.original_prompt, "a cat");
        assert_eq!(
            result.effective_prompt,
            "a cat, high quality, professional, detailed"
        );
        assert_eq!(result.estimated_cost, Decimal::new(40, 3));

        let sent = spy.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].prompt, result.effective_prompt);
        assert_eq!(sent[0].size, ImageSize::Square1024);
    }

    #[tokio::test]
    async fn test_enhance_disabled_sends_prompt_verbatim() {
        let provider = MockImageProvider::new();
        let spy = provider.clone();
        let pipeline = pipeline_with(provider);

        let request = GenerationRequest {
            enhance: Some(false),
            ..GenerationRequest::new("a cat")
        };
        let result = pipeline.run(&request, Some(&key())).await.unwrap();

        assert_eq!(result.effective_prompt, "a cat");
        assert_eq!(spy.requests()[0].prompt, "a cat");
        assert_eq!(result.estimated_cost, Decimal::new(40, 3));
    }

    #[tokio::test]
    async fn test_revised_prompt_preferred_over_effective() {
        let pipeline = pipeline_with(
            MockImageProvider::new().with_revised_prompt("https://img.test/cat.png", "a tabby cat"),
        );

        let result = pipeline
            .run(&GenerationRequest::new("a cat"), Some(&key()))
            .await
            .unwrap();
        assert_eq!(result.revised_prompt(), "a tabby cat");
    }

    #[tokio::test]
    async fn test_empty_prompt_never_reaches_provider() {
        let provider = MockImageProvider::new();
        let spy = provider.clone();
        let pipeline = pipeline_with(provider);

        let err = pipeline
            .run(&GenerationRequest::new("   "), Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPrompt));
        assert_eq!(spy.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_runs_before_credential_check() {
        let pipeline = pipeline_with(MockImageProvider::new());
        let err = pipeline
            .run(&GenerationRequest::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPrompt));
    }

    #[tokio::test]
    async fn test_missing_credential_is_unauthenticated() {
        let provider = MockImageProvider::new();
        let spy = provider.clone();
        let pipeline = pipeline_with(provider);

        let err = pipeline
            .run(&GenerationRequest::new("a cat"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
        assert_eq!(spy.get_call_count(), 0);
    }

    #[test]
    fn test_legacy_hd_priced_at_standard_rate() {
        let pipeline = pipeline_with(MockImageProvider::new());
        let request = GenerationRequest {
            model: Some("dall-e-2".to_string()),
            size: Some("1024x1024".to_string()),
            quality: Some("hd".to_string()),
            ..GenerationRequest::new("a cat")
        };

        let prepared = pipeline.prepare(&request).unwrap();
        assert_eq!(prepared.normalized.model, ImageModel::DallE2);
        assert_eq!(prepared.normalized.quality, Quality::Standard);
        assert_eq!(prepared.estimated_cost, Decimal::new(20, 3));
    }

    #[test]
    fn test_legacy_batch_cost_scales_with_count() {
        let pipeline = pipeline_with(MockImageProvider::new());
        let request = GenerationRequest {
            model: Some("dall-e-2".to_string()),
            size: Some("256x256".to_string()),
            n: Some(4),
            ..GenerationRequest::new("a cat")
        };

        let prepared = pipeline.prepare(&request).unwrap();
        assert_eq!(prepared.estimated_cost, Decimal::new(64, 3));
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_after_single_call() {
        let provider = MockImageProvider::new().with_error_response(
            429,
            r#"{"error":{"message":"Slow down","code":"rate_limit_exceeded"}}"#,
        );
        let spy = provider.clone();
        let pipeline = pipeline_with(provider);

        let err = pipeline
            .run(&GenerationRequest::new("a cat"), Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimitExceeded(_)));
        assert_eq!(spy.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_provider_result_is_unavailable() {
        let pipeline = pipeline_with(MockImageProvider::new().with_images(vec![]));
        let err = pipeline
            .run(&GenerationRequest::new("a cat"), Some(&key()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_concurrent_identical_requests_are_not_coalesced() {
        let provider = MockImageProvider::new().with_delay(Duration::from_millis(20));
        let spy = provider.clone();
        let pipeline = Arc::new(pipeline_with(provider));
        let credential = key();

        let request = GenerationRequest::new("a lighthouse");
        let (first, second) = tokio::join!(
            pipeline.run(&request, Some(&credential)),
            pipeline.run(&request, Some(&credential))
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(spy.get_call_count(), 2);
        assert_eq!(first.estimated_cost, second.estimated_cost);
        assert_ne!(first.images[0].url, second.images[0].url);
    }

    #[tokio::test]
    async fn test_edit_and_variation_need_credential() {
        let pipeline = pipeline_with(MockImageProvider::new());

        let err = pipeline
            .edit(&ImageEditRequest::new(vec![0x89, 0x50], "add a hat"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));

        let images = pipeline
            .create_variation(&ImageVariationRequest::new(vec![0x89, 0x50]), Some(&key()))
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_tier_reported_before_missing_credential() {
        let provider = MockImageProvider::new();
        let spy = provider.clone();
        let pipeline = pipeline_with(provider);

        let err = pipeline
            .edit(
                &ImageEditRequest::new(vec![0x89, 0x50], "add a hat").with_model(ImageModel::DallE3),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));

        let err = pipeline
            .create_variation(
                &ImageVariationRequest::new(vec![0x89, 0x50]).with_model(ImageModel::DallE3),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
        assert_eq!(spy.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_prompt_checked_before_credential() {
        let pipeline = pipeline_with(MockImageProvider::new());

        let err = pipeline
            .edit(&ImageEditRequest::new(vec![0x89, 0x50], ""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPrompt));

        let err = pipeline
            .edit(
                &ImageEditRequest::new(vec![0x89, 0x50], "x".repeat(1001)),
                Some(&key()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PromptTooLong { max: 1000, .. }));
    }

    #[tokio::test]
    async fn test_edit_on_advanced_tier_rejected() {
        let pipeline = pipeline_with(MockImageProvider::new());
        let err = pipeline
            .edit(
                &ImageEditRequest::new(vec![0x89, 0x50], "add a hat").with_model(ImageModel::DallE3),
                Some(&key()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }
}
