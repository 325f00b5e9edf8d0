use super::response::ErrorBody;
use crate::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyPrompt
            | Error::PromptTooLong { .. }
            | Error::UnsupportedSize { .. }
            | Error::UnsupportedOperation { .. }
            | Error::InvalidRequest(_)
            | Error::ContentPolicyViolation(_) => StatusCode::BAD_REQUEST,
            Error::BillingLimitReached(_) => StatusCode::PAYMENT_REQUIRED,
            Error::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Unauthenticated(_)
            | Error::ProviderUnavailable(_)
            | Error::Http(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::EnvVar(_)
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            tracing::debug!("Rejected image request ({}): {}", status, self);
        } else {
            tracing::warn!("Image request failed ({}): {}", status, self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
