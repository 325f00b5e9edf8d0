//! Error handling and custom error types
//!
//! Every failure the pipeline can produce is one variant here. Validation and
//! provider classification both land in this enum so the HTTP layer has a
//! single place to pick a status code.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("Prompt is too long for {model}: {length} characters (maximum {max})")]
    PromptTooLong {
        model: String,
        length: usize,
        max: usize,
    },

    #[error("Size '{size}' is not supported by {model}. Allowed sizes: {allowed}")]
    UnsupportedSize {
        model: String,
        size: String,
        allowed: String,
    },

    #[error("{operation} is not supported by {model}. Switch to dall-e-2")]
    UnsupportedOperation { operation: String, model: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("OpenAI API key not configured or rejected: {0}")]
    Unauthenticated(String),

    #[error("The prompt violates OpenAI content policy. Please modify your prompt.")]
    ContentPolicyViolation(String),

    #[error("OpenAI billing limit reached. Please check your OpenAI account.")]
    BillingLimitReached(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded(String),

    #[error("Image provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures caused by the caller's input rather than the provider
    /// or the deployment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyPrompt
                | Error::PromptTooLong { .. }
                | Error::UnsupportedSize { .. }
                | Error::UnsupportedOperation { .. }
                | Error::InvalidRequest(_)
                | Error::ContentPolicyViolation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
