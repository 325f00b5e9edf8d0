use super::classify::classify_provider_error;
use crate::{Error, Result};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Thin OpenAI REST client. Holds a pooled connection and the base URL, never
/// a credential: callers pass one per request.
pub struct OpenAiHttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl OpenAiHttpClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new_with_client(base_url, client))
    }

    pub fn new_with_client(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
        credential: &SecretString,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .post(&url)
            .bearer_auth(credential.expose_secret())
            .json(request);
        self.execute(builder).await
    }

    pub async fn post_multipart<Resp: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        credential: &SecretString,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .post(&url)
            .bearer_auth(credential.expose_secret())
            .multipart(form);
        self.execute(builder).await
    }

    async fn execute<Resp: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Resp> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to OpenAI: {}", e);
            if e.is_timeout() {
                Error::ProviderUnavailable("OpenAI request timed out".to_string())
            } else {
                Error::ProviderUnavailable(format!("OpenAI request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("OpenAI API error (status {}): {}", status, error_text);
            return Err(classify_provider_error(status.as_u16(), &error_text));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read OpenAI response body: {}", e);
            Error::ProviderUnavailable(format!("Failed to read OpenAI response: {}", e))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}\nBody: {}", e, body);
            Error::ProviderUnavailable(format!("Failed to parse OpenAI response: {}", e))
        })
    }
}
