//! Data models and structures
//!
//! Defines the request/response values that flow through the pipeline, the
//! two model tiers and their capability profiles, and runtime configuration.

use crate::provider::client::DEFAULT_BASE_URL;
use crate::{Error, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Image model tier. `dall-e-3` is the advanced tier, `dall-e-2` the legacy one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ImageModel {
    #[default]
    #[serde(rename = "dall-e-3")]
    DallE3,
    #[serde(rename = "dall-e-2")]
    DallE2,
}

impl ImageModel {
    pub const ALL: [ImageModel; 2] = [ImageModel::DallE3, ImageModel::DallE2];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageModel::DallE3 => "dall-e-3",
            ImageModel::DallE2 => "dall-e-2",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ImageModel::DallE3 => "DALL-E 3",
            ImageModel::DallE2 => "DALL-E 2",
        }
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, ImageModel::DallE3)
    }

    pub fn allowed_sizes(&self) -> &'static [ImageSize] {
        match self {
            ImageModel::DallE3 => &[
                ImageSize::Square1024,
                ImageSize::Portrait1024x1792,
                ImageSize::Landscape1792x1024,
            ],
            ImageModel::DallE2 => &[
                ImageSize::Square256,
                ImageSize::Square512,
                ImageSize::Square1024,
            ],
        }
    }

    pub fn default_size(&self) -> ImageSize {
        ImageSize::Square1024
    }

    pub fn supports_size(&self, size: ImageSize) -> bool {
        self.allowed_sizes().contains(&size)
    }

    pub fn max_prompt_length(&self) -> usize {
        match self {
            ImageModel::DallE3 => 4000,
            ImageModel::DallE2 => 1000,
        }
    }

    /// Largest `n` the provider accepts in one call.
    pub fn max_images(&self) -> u32 {
        match self {
            ImageModel::DallE3 => 1,
            ImageModel::DallE2 => 10,
        }
    }

    pub fn qualities(&self) -> &'static [Quality] {
        match self {
            ImageModel::DallE3 => &[Quality::Standard, Quality::Hd],
            ImageModel::DallE2 => &[Quality::Standard],
        }
    }

    pub fn styles(&self) -> &'static [Style] {
        match self {
            ImageModel::DallE3 => &[Style::Natural, Style::Vivid],
            ImageModel::DallE2 => &[],
        }
    }

    /// Edits and variations only exist on the legacy tier.
    pub fn supports_edit(&self) -> bool {
        !self.is_advanced()
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        ModelCapabilities {
            id: self.as_str(),
            name: self.display_name(),
            sizes: self.allowed_sizes().iter().map(|s| s.as_str()).collect(),
            qualities: self.qualities().iter().map(|q| q.as_str()).collect(),
            styles: self.styles().iter().map(|s| s.as_str()).collect(),
            max_prompt_length: self.max_prompt_length(),
            max_images: self.max_images(),
            supports_edit: self.supports_edit(),
            supports_variation: self.supports_edit(),
        }
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dall-e-3" => Ok(ImageModel::DallE3),
            "dall-e-2" => Ok(ImageModel::DallE2),
            other => Err(Error::InvalidRequest(format!(
                "unknown model '{}'; expected dall-e-3 or dall-e-2",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    Square256,
    #[serde(rename = "512x512")]
    Square512,
    #[serde(rename = "1024x1024")]
    Square1024,
    #[serde(rename = "1792x1024")]
    Landscape1792x1024,
    #[serde(rename = "1024x1792")]
    Portrait1024x1792,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square256 => "256x256",
            ImageSize::Square512 => "512x512",
            ImageSize::Square1024 => "1024x1024",
            ImageSize::Landscape1792x1024 => "1792x1024",
            ImageSize::Portrait1024x1792 => "1024x1792",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "256x256" => Ok(ImageSize::Square256),
            "512x512" => Ok(ImageSize::Square512),
            "1024x1024" => Ok(ImageSize::Square1024),
            "1792x1024" => Ok(ImageSize::Landscape1792x1024),
            "1024x1792" => Ok(ImageSize::Portrait1024x1792),
            other => Err(Error::InvalidRequest(format!("unknown size '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    Hd,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::Hd => "hd",
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(Quality::Standard),
            "hd" => Ok(Quality::Hd),
            other => Err(Error::InvalidRequest(format!(
                "unknown quality '{}'; expected standard or hd",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Natural,
    #[default]
    Vivid,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Natural => "natural",
            Style::Vivid => "vivid",
        }
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(Style::Natural),
            "vivid" => Ok(Style::Vivid),
            other => Err(Error::InvalidRequest(format!(
                "unknown style '{}'; expected natural or vivid",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Url,
    B64Json,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Url => "url",
            ResponseFormat::B64Json => "b64_json",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "url" => Ok(ResponseFormat::Url),
            "b64_json" => Ok(ResponseFormat::B64Json),
            other => Err(Error::InvalidRequest(format!(
                "unknown response format '{}'; expected url or b64_json",
                other
            ))),
        }
    }
}

/// Raw generation options as a caller submits them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, alias = "imageCount")]
    pub n: Option<u32>,
    #[serde(default)]
    pub response_format: Option<String>,
    #[serde(default)]
    pub enhance: Option<bool>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }
}

/// A request with defaults applied and tier constraints enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRequest {
    pub prompt: String,
    pub model: ImageModel,
    pub size: ImageSize,
    pub quality: Quality,
    /// `None` on the legacy tier, which has no style knob.
    pub style: Option<Style>,
    pub image_count: u32,
    pub response_format: ResponseFormat,
    pub enhance: bool,
}

impl NormalizedRequest {
    pub fn with_prompt(&self, prompt: String) -> Self {
        Self {
            prompt,
            ..self.clone()
        }
    }
}

impl From<&NormalizedRequest> for GenerationRequest {
    fn from(req: &NormalizedRequest) -> Self {
        Self {
            prompt: Some(req.prompt.clone()),
            model: Some(req.model.as_str().to_string()),
            size: Some(req.size.as_str().to_string()),
            quality: Some(req.quality.as_str().to_string()),
            style: req.style.map(|s| s.as_str().to_string()),
            n: Some(req.image_count),
            response_format: Some(req.response_format.as_str().to_string()),
            enhance: Some(req.enhance),
        }
    }
}

/// Inputs for an image edit (legacy tier only).
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub image: Vec<u8>,
    pub mask: Option<Vec<u8>>,
    pub prompt: String,
    pub model: ImageModel,
    pub size: ImageSize,
    pub image_count: u32,
    pub response_format: ResponseFormat,
}

impl ImageEditRequest {
    pub fn new(image: Vec<u8>, prompt: impl Into<String>) -> Self {
        Self {
            image,
            mask: None,
            prompt: prompt.into(),
            model: ImageModel::DallE2,
            size: ImageSize::Square1024,
            image_count: 1,
            response_format: ResponseFormat::Url,
        }
    }

    pub fn with_mask(mut self, mask: Vec<u8>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_model(mut self, model: ImageModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_image_count(mut self, image_count: u32) -> Self {
        self.image_count = image_count;
        self
    }

    /// Requested count bounded to what the model can return in one call.
    pub fn clamped_image_count(&self) -> u32 {
        self.image_count.clamp(1, self.model.max_images())
    }
}

/// Inputs for an image variation (legacy tier only).
#[derive(Debug, Clone)]
pub struct ImageVariationRequest {
    pub image: Vec<u8>,
    pub model: ImageModel,
    pub size: ImageSize,
    pub image_count: u32,
    pub response_format: ResponseFormat,
}

impl ImageVariationRequest {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            model: ImageModel::DallE2,
            size: ImageSize::Square1024,
            image_count: 1,
            response_format: ResponseFormat::Url,
        }
    }

    pub fn with_model(mut self, model: ImageModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_image_count(mut self, image_count: u32) -> Self {
        self.image_count = image_count;
        self
    }

    pub fn clamped_image_count(&self) -> u32 {
        self.image_count.clamp(1, self.model.max_images())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: Option<String>,
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub images: Vec<GeneratedImage>,
    pub estimated_cost: Decimal,
    pub original_prompt: String,
    pub effective_prompt: String,
}

impl GenerationResult {
    pub fn first_image(&self) -> Option<&GeneratedImage> {
        self.images.first()
    }

    /// Provider-revised prompt of the first image, falling back to the prompt
    /// actually sent.
    pub fn revised_prompt(&self) -> &str {
        self.first_image()
            .and_then(|image| image.revised_prompt.as_deref())
            .unwrap_or(&self.effective_prompt)
    }
}

/// Static capability descriptor reported to clients building input forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub id: &'static str,
    pub name: &'static str,
    pub sizes: Vec<&'static str>,
    pub qualities: Vec<&'static str>,
    pub styles: Vec<&'static str>,
    pub max_prompt_length: usize,
    pub max_images: u32,
    pub supports_edit: bool,
    pub supports_variation: bool,
}

// Configuration
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug)]
pub struct Config {
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: String,
    pub provider_timeout: Duration,
    pub strict_size_validation: bool,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        let provider_timeout = match lookup("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("PROVIDER_TIMEOUT_SECS must be an integer, got '{}'", raw))
                })?;
                if secs == 0 {
                    return Err(Error::Config(
                        "PROVIDER_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let strict_size_validation = match lookup("STRICT_SIZE_VALIDATION") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                Error::Config(format!("STRICT_SIZE_VALIDATION must be a boolean, got '{}'", raw))
            })?,
            None => false,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            provider_timeout,
            strict_size_validation,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
