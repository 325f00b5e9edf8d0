//! HTTP surface: the generation endpoint, its capability companion and a
//! health check.

pub mod error;
pub mod handlers;
pub mod response;
pub mod server;

pub use response::{CapabilitiesResponse, ErrorBody, GenerateImageResponse, ImagePayload};
pub use server::{create_app, serve, AppState};
