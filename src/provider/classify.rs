//! Classification of OpenAI HTTP failures into the crate's error kinds.

use crate::Error;

fn extract_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;

    let message = json
        .get("error")
        .and_then(|v| v.get("message"))
        .and_then(|v| v.as_str())
        .or_else(|| json.get("error").and_then(|v| v.as_str()))
        .or_else(|| json.get("message").and_then(|v| v.as_str()))
        .map(|s| s.trim().to_string())?;

    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

/// Map a non-success provider response to an error kind.
///
/// Known error codes are matched as substrings of the raw body, first match
/// wins. Anything unrecognised is [`Error::ProviderUnavailable`].
pub fn classify_provider_error(status: u16, body: &str) -> Error {
    let message = extract_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("status {}", status)
        } else {
            trimmed.to_string()
        }
    });
    let lower = body.to_lowercase();

    if lower.contains("content_policy_violation") {
        return Error::ContentPolicyViolation(message);
    }
    if lower.contains("billing_hard_limit_reached") || lower.contains("insufficient_quota") {
        return Error::BillingLimitReached(message);
    }
    if lower.contains("rate_limit_exceeded") || status == 429 {
        return Error::RateLimitExceeded(message);
    }
    if lower.contains("invalid_api_key") || status == 401 {
        return Error::Unauthenticated(message);
    }

    Error::ProviderUnavailable(format!(
        "OpenAI API error (status {}): {}",
        status, message
    ))
}
