//! Image provider integration
//!
//! Wraps OpenAI's Images API (generations, edits, variations) behind the
//! [`ImageProvider`] trait so the pipeline can run against a mock in tests.

pub mod classify;
pub mod client;
pub mod mime;
pub mod mock;
pub mod openai;
pub mod types;

pub use classify::classify_provider_error;
pub use mock::MockImageProvider;
pub use openai::OpenAiImageClient;

use crate::models::{
    GeneratedImage, ImageEditRequest, ImageModel, ImageVariationRequest, NormalizedRequest,
};
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::SecretString;

/// One provider call per method invocation; implementations never retry.
///
/// The credential is borrowed for the duration of the call only.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(
        &self,
        request: &NormalizedRequest,
        credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>>;

    async fn edit(
        &self,
        request: &ImageEditRequest,
        credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>>;

    async fn create_variation(
        &self,
        request: &ImageVariationRequest,
        credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>>;
}

/// Edits and variations exist only on the legacy tier.
pub fn ensure_legacy_operation(model: ImageModel, operation: &str) -> Result<()> {
    if model.supports_edit() {
        Ok(())
    } else {
        Err(Error::UnsupportedOperation {
            operation: operation.to_string(),
            model: model.to_string(),
        })
    }
}
