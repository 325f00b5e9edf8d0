use super::{classify_provider_error, ensure_legacy_operation, ImageProvider};
use crate::models::{
    GeneratedImage, ImageEditRequest, ImageVariationRequest, NormalizedRequest, ResponseFormat,
};
use crate::validation::validate_prompt;
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tiny valid PNG returned for `b64_json` requests when nothing is scripted.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Debug, Clone)]
enum MockOutcome {
    Images(Vec<GeneratedImage>),
    /// Raw provider failure, run through the real classifier.
    Failure { status: u16, body: String },
}

/// Scriptable [`ImageProvider`] for tests. Clones share state, so a clone can
/// be kept as a spy after the original is moved into the app.
#[derive(Clone, Default)]
pub struct MockImageProvider {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    requests: Arc<Mutex<Vec<NormalizedRequest>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(self, images: Vec<GeneratedImage>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(MockOutcome::Images(images));
        self
    }

    pub fn with_revised_prompt(self, url: &str, revised_prompt: &str) -> Self {
        self.with_images(vec![GeneratedImage {
            url: Some(url.to_string()),
            b64_json: None,
            revised_prompt: Some(revised_prompt.to_string()),
        }])
    }

    /// Script a provider failure as the raw status and body OpenAI would send.
    pub fn with_error_response(self, status: u16, body: &str) -> Self {
        self.outcomes.lock().unwrap().push(MockOutcome::Failure {
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Generation requests received, in call order.
    pub fn requests(&self) -> Vec<NormalizedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_outcome(
        &self,
        response_format: ResponseFormat,
        count: u32,
    ) -> Result<Vec<GeneratedImage>> {
        let call = {
            let mut calls = self.call_count.lock().unwrap();
            *calls += 1;
            *calls
        };

        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Ok((0..count.max(1))
                .map(|i| default_image(response_format, call, i))
                .collect());
        }

        match &outcomes[(call - 1) % outcomes.len()] {
            MockOutcome::Images(images) => Ok(images.clone()),
            MockOutcome::Failure { status, body } => Err(classify_provider_error(*status, body)),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn default_image(format: ResponseFormat, call: usize, index: u32) -> GeneratedImage {
    match format {
        ResponseFormat::Url => GeneratedImage {
            url: Some(format!("https://mock.images.test/{}-{}.png", call, index)),
            ..Default::default()
        },
        ResponseFormat::B64Json => GeneratedImage {
            b64_json: Some(base64::engine::general_purpose::STANDARD.encode(PLACEHOLDER_PNG)),
            ..Default::default()
        },
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(
        &self,
        request: &NormalizedRequest,
        _credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>> {
        self.requests.lock().unwrap().push(request.clone());
        self.pause().await;
        self.next_outcome(request.response_format, request.image_count)
    }

    async fn edit(
        &self,
        request: &ImageEditRequest,
        _credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>> {
        ensure_legacy_operation(request.model, "Image edit")?;
        validate_prompt(&request.prompt, request.model)?;
        self.pause().await;
        self.next_outcome(request.response_format, request.clamped_image_count())
    }

    async fn create_variation(
        &self,
        request: &ImageVariationRequest,
        _credential: &SecretString,
    ) -> Result<Vec<GeneratedImage>> {
        ensure_legacy_operation(request.model, "Image variation")?;
        self.pause().await;
        self.next_outcome(request.response_format, request.clamped_image_count())
    }
}
