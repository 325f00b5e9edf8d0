//! Image generation gateway
//!
//! Validates and normalizes image generation requests against the DALL-E
//! model tiers, optionally enhances the prompt, prices the request and calls
//! the OpenAI Images API, mapping provider failures onto a fixed error
//! taxonomy for the HTTP layer.

pub mod api;
pub mod enhance;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod pricing;
pub mod provider;
pub mod validation;

pub use error::{Error, Result};
