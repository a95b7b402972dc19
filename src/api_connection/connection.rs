use async_trait::async_trait;
use reqwest::Client;
use std::env;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Provider};

// Ollama ignores the bearer token but the OpenAI wire format requires one.
const LOCAL_PLACEHOLDER_KEY: &str = "ollama";

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("API returned no completion content")]
    EmptyResponse,
}

/// The single operation the rest of the crate needs from a language model:
/// one user prompt in, one completion text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ApiConnectionError>;
}

impl Provider {
    pub fn openai_compatible(base_url: &str, api_key_env_var_name: &str) -> Self {
        Self::OpenAiCompatible {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key_env_var: api_key_env_var_name.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            Provider::OpenAiCompatible { base_url, .. } => base_url,
        }
    }

    fn resolve_api_key(&self) -> Result<String, ApiConnectionError> {
        match self {
            Provider::OpenAiCompatible {
                base_url,
                api_key_env_var,
                ..
            } => match env::var(api_key_env_var) {
                Ok(key) => Ok(key),
                Err(_) if is_local_url(base_url) => Ok(LOCAL_PLACEHOLDER_KEY.to_string()),
                Err(_) => Err(ApiConnectionError::MissingApiKey(api_key_env_var.clone())),
            },
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let api_key = self.resolve_api_key()?;
        let url = format!("{}/chat/completions", self.base_url());

        debug!(%url, model = %request.model, "sending chat completion request");

        let client = Client::new();
        let response = client
            .post(&url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            // Read as text first so a malformed body surfaces as a serde error.
            let body = response.text().await?;
            let chat_response = serde_json::from_str::<ChatCompletionResponse>(&body)?;
            Ok(chat_response)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            warn!(%status, "chat completion request rejected");
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }
}

#[async_trait]
impl CompletionService for Provider {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ApiConnectionError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: Some(temperature),
            max_tokens: None,
        };

        let response = self.call_chat_completion(request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(ApiConnectionError::EmptyResponse)
    }
}

fn is_local_url(base_url: &str) -> bool {
    let lowered = base_url.to_ascii_lowercase();
    ["://localhost", "://127.0.0.1", "://[::1]", "://0.0.0.0"]
        .iter()
        .any(|host| lowered.contains(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_urls_are_detected() {
        assert!(is_local_url("http://localhost:11434/v1"));
        assert!(is_local_url("http://127.0.0.1:8080"));
        assert!(!is_local_url("https://api.openai.com/v1"));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let provider = Provider::openai_compatible("http://localhost:11434/v1/", "UNUSED_KEY");
        assert_eq!(provider.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn local_provider_falls_back_to_placeholder_key() {
        let provider =
            Provider::openai_compatible("http://localhost:11434/v1", "FRIDGE_CHEF_TEST_NO_SUCH_KEY");
        assert_eq!(provider.resolve_api_key().unwrap(), LOCAL_PLACEHOLDER_KEY);
    }
}
