//! Request validation and normalization
//!
//! Turns a raw [`GenerationRequest`] into a [`NormalizedRequest`] by applying
//! defaults and the chosen model tier's constraints.
//!
//! Sizes are lenient by default: a size the chosen model does not offer is
//! coerced to that model's default size instead of failing. Callers that switch
//! models mid-session keep whatever size they picked for the previous model, so
//! this is a UX normalization rather than a validation error. Construct the
//! normalizer with `strict_sizes = true` to reject such sizes with
//! [`Error::UnsupportedSize`] instead.

use crate::models::{
    GenerationRequest, ImageModel, ImageSize, NormalizedRequest, Quality, ResponseFormat, Style,
};
use crate::{Error, Result};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    strict_sizes: bool,
}

impl Normalizer {
    pub fn new(strict_sizes: bool) -> Self {
        Self { strict_sizes }
    }

    pub fn is_strict(&self) -> bool {
        self.strict_sizes
    }

    pub fn normalize(&self, request: &GenerationRequest) -> Result<NormalizedRequest> {
        // A missing prompt outranks every other field error.
        let prompt = request.prompt.as_deref().unwrap_or_default();
        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let model: ImageModel = parse_optional(request.model.as_deref())?.unwrap_or_default();
        validate_prompt(prompt, model)?;

        let size = self.resolve_size(request.size.as_deref(), model)?;

        let (quality, style) = if model.is_advanced() {
            (
                parse_optional::<Quality>(request.quality.as_deref())?.unwrap_or_default(),
                Some(parse_optional::<Style>(request.style.as_deref())?.unwrap_or_default()),
            )
        } else {
            (Quality::Standard, None)
        };

        let image_count = if model.is_advanced() {
            1
        } else {
            request.n.unwrap_or(1).clamp(1, model.max_images())
        };

        let response_format: ResponseFormat =
            parse_optional(request.response_format.as_deref())?.unwrap_or_default();

        Ok(NormalizedRequest {
            prompt: prompt.to_string(),
            model,
            size,
            quality,
            style,
            image_count,
            response_format,
            enhance: request.enhance.unwrap_or(true),
        })
    }

    fn resolve_size(&self, raw: Option<&str>, model: ImageModel) -> Result<ImageSize> {
        let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw,
            None => return Ok(model.default_size()),
        };

        match ImageSize::from_str(raw) {
            Ok(size) if model.supports_size(size) => Ok(size),
            _ if self.strict_sizes => Err(Error::UnsupportedSize {
                model: model.to_string(),
                size: raw.to_string(),
                allowed: model
                    .allowed_sizes()
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
            _ => {
                tracing::debug!(
                    "Size '{}' not offered by {}, using {}",
                    raw,
                    model,
                    model.default_size()
                );
                Ok(model.default_size())
            }
        }
    }
}

/// Checks a prompt against the tier's limits. Shared by generation and edits.
pub fn validate_prompt(prompt: &str, model: ImageModel) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::EmptyPrompt);
    }

    let length = prompt.chars().count();
    if length > model.max_prompt_length() {
        return Err(Error::PromptTooLong {
            model: model.to_string(),
            length,
            max: model.max_prompt_length(),
        });
    }

    Ok(())
}

fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt)
    }

    fn legacy(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            model: Some("dall-e-2".to_string()),
            ..request(prompt)
        }
    }

    #[test]
    fn test_defaults_applied() {
        let normalized = Normalizer::default().normalize(&request("a cat")).unwrap();
        assert_eq!(normalized.model, ImageModel::DallE3);
        assert_eq!(normalized.size, ImageSize::Square1024);
        assert_eq!(normalized.quality, Quality::Standard);
        assert_eq!(normalized.style, Some(Style::Vivid));
        assert_eq!(normalized.image_count, 1);
        assert_eq!(normalized.response_format, ResponseFormat::Url);
        assert!(normalized.enhance);
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let normalizer = Normalizer::default();
        assert!(matches!(
            normalizer.normalize(&request("")),
            Err(Error::EmptyPrompt)
        ));
        assert!(matches!(
            normalizer.normalize(&legacy("  \n\t ")),
            Err(Error::EmptyPrompt)
        ));
    }

    #[test]
    fn test_empty_prompt_reported_before_unknown_model() {
        let normalizer = Normalizer::default();
        let blank = GenerationRequest {
            model: Some("dall-e-9".to_string()),
            quality: Some("ultra".to_string()),
            ..request("")
        };
        assert!(matches!(
            normalizer.normalize(&blank),
            Err(Error::EmptyPrompt)
        ));

        let missing = GenerationRequest {
            model: Some("foo".to_string()),
            ..GenerationRequest::default()
        };
        assert!(matches!(
            normalizer.normalize(&missing),
            Err(Error::EmptyPrompt)
        ));
    }

    #[test]
    fn test_prompt_length_limits_per_tier() {
        let normalizer = Normalizer::default();
        let long = "a".repeat(1001);

        let err = normalizer.normalize(&legacy(&long)).unwrap_err();
        assert!(matches!(
            err,
            Error::PromptTooLong {
                length: 1001,
                max: 1000,
                ..
            }
        ));

        assert!(normalizer.normalize(&request(&long)).is_ok());
        assert!(normalizer.normalize(&legacy(&"a".repeat(1000))).is_ok());
        assert!(normalizer.normalize(&request(&"a".repeat(4000))).is_ok());
        assert!(matches!(
            normalizer.normalize(&request(&"a".repeat(4001))),
            Err(Error::PromptTooLong { max: 4000, .. })
        ));
    }

    #[test]
    fn test_prompt_length_counts_characters() {
        let prompt = "é".repeat(1000);
        assert!(Normalizer::default().normalize(&legacy(&prompt)).is_ok());
    }

    #[test]
    fn test_advanced_tier_forces_single_image() {
        let normalizer = Normalizer::default();
        for n in [0, 1, 2, 5, 100] {
            let req = GenerationRequest {
                n: Some(n),
                ..request("a cat")
            };
            assert_eq!(normalizer.normalize(&req).unwrap().image_count, 1);
        }
    }

    #[test]
    fn test_legacy_image_count_bounds() {
        let normalizer = Normalizer::default();
        let with_n = |n| GenerationRequest {
            n: Some(n),
            ..legacy("a cat")
        };
        assert_eq!(normalizer.normalize(&with_n(0)).unwrap().image_count, 1);
        assert_eq!(normalizer.normalize(&with_n(4)).unwrap().image_count, 4);
        assert_eq!(normalizer.normalize(&with_n(50)).unwrap().image_count, 10);
    }

    #[test]
    fn test_legacy_tier_ignores_quality_and_style() {
        let req = GenerationRequest {
            size: Some("1024x1024".to_string()),
            quality: Some("hd".to_string()),
            style: Some("natural".to_string()),
            ..legacy("a cat")
        };
        let normalized = Normalizer::default().normalize(&req).unwrap();
        assert_eq!(normalized.quality, Quality::Standard);
        assert_eq!(normalized.style, None);
    }

    #[test]
    fn test_incompatible_size_coerced_when_lenient() {
        let req = GenerationRequest {
            size: Some("1792x1024".to_string()),
            ..legacy("a cat")
        };
        let normalized = Normalizer::default().normalize(&req).unwrap();
        assert_eq!(normalized.size, ImageSize::Square1024);

        let req = GenerationRequest {
            size: Some("640x480".to_string()),
            ..request("a cat")
        };
        let normalized = Normalizer::default().normalize(&req).unwrap();
        assert_eq!(normalized.size, ImageSize::Square1024);
    }

    #[test]
    fn test_incompatible_size_rejected_when_strict() {
        let req = GenerationRequest {
            size: Some("256x256".to_string()),
            ..request("a cat")
        };
        let err = Normalizer::new(true).normalize(&req).unwrap_err();
        match err {
            Error::UnsupportedSize {
                model,
                size,
                allowed,
            } => {
                assert_eq!(model, "dall-e-3");
                assert_eq!(size, "256x256");
                assert!(allowed.contains("1792x1024"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_supported_size_kept() {
        let req = GenerationRequest {
            size: Some("1024x1792".to_string()),
            ..request("a tower")
        };
        let normalized = Normalizer::new(true).normalize(&req).unwrap();
        assert_eq!(normalized.size, ImageSize::Portrait1024x1792);
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        let normalizer = Normalizer::default();
        let bad_model = GenerationRequest {
            model: Some("dall-e-9".to_string()),
            ..request("a cat")
        };
        assert!(matches!(
            normalizer.normalize(&bad_model),
            Err(Error::InvalidRequest(_))
        ));

        let bad_quality = GenerationRequest {
            quality: Some("ultra".to_string()),
            ..request("a cat")
        };
        assert!(matches!(
            normalizer.normalize(&bad_quality),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_blank_optional_fields_use_defaults() {
        let req = GenerationRequest {
            model: Some(String::new()),
            size: Some(" ".to_string()),
            quality: Some(String::new()),
            ..request("a cat")
        };
        let normalized = Normalizer::default().normalize(&req).unwrap();
        assert_eq!(normalized.model, ImageModel::DallE3);
        assert_eq!(normalized.size, ImageSize::Square1024);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = vec![
            request("a cat"),
            GenerationRequest {
                size: Some("1792x1024".to_string()),
                quality: Some("hd".to_string()),
                style: Some("natural".to_string()),
                n: Some(4),
                enhance: Some(false),
                ..request("a harbor at dawn")
            },
            GenerationRequest {
                size: Some("1792x1024".to_string()),
                quality: Some("hd".to_string()),
                n: Some(3),
                response_format: Some("b64_json".to_string()),
                ..legacy("a robot")
            },
        ];

        for strict in [false, true] {
            let normalizer = Normalizer::new(strict);
            for input in &inputs {
                let Ok(first) = normalizer.normalize(input) else {
                    continue;
                };
                let second = normalizer
                    .normalize(&GenerationRequest::from(&first))
                    .unwrap();
                assert_eq!(first, second);
            }
        }
    }
}
