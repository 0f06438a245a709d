use crate::error::{AppError, AppResult};
use crate::session::Message;
use crate::utils::find_char_boundary;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Models offered in the model selector.
pub const MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-5-mini"];
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.2;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 100..=1500;

/// Deployment secret consulted when no key was typed in.
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolve a credential: the typed value wins, then the environment secret.
/// Blank values count as absent.
pub fn resolve_credential(typed: Option<&str>, secret_var: &str) -> Option<String> {
    typed
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| {
            std::env::var(secret_var)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
}

// ── Generation parameters ───────────────────────────────────────────────

/// Validated sampling settings for one completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: MODELS[0].to_string(),
            temperature: 0.85,
            max_tokens: 600,
        }
    }
}

impl GenerationParams {
    pub fn new(model: &str, temperature: f32, max_tokens: u32) -> AppResult<Self> {
        let mut params = Self::default();
        params.set_model(model)?;
        params.set_temperature(temperature)?;
        params.set_max_tokens(max_tokens)?;
        Ok(params)
    }

    pub fn set_model(&mut self, model: &str) -> AppResult<()> {
        let model = model.trim();
        if !MODELS.contains(&model) {
            return Err(AppError::validation(format!(
                "Unknown model '{}'. Supported: {}",
                model,
                MODELS.join(", ")
            )));
        }
        self.model = model.to_string();
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> AppResult<()> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(AppError::validation(format!(
                "Temperature must be between {} and {}",
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end()
            )));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> AppResult<()> {
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(AppError::validation(format!(
                "Max tokens must be between {} and {}",
                MAX_TOKENS_RANGE.start(),
                MAX_TOKENS_RANGE.end()
            )));
        }
        self.max_tokens = max_tokens;
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

// ── Request / Response types (OpenAI chat completions format) ───────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ── Client ──────────────────────────────────────────────────────────────

/// Chat-completion adapter for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_url: String,
}

impl CompletionClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send the whole conversation and return the first candidate's text.
    ///
    /// The credential is checked before any network activity. There are no
    /// retries: a failure is reported once and the caller decides what to do.
    pub async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
        credential: Option<&str>,
    ) -> AppResult<String> {
        let key = credential
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(AppError::missing_key)?;
        let headers = auth_headers(key)?;

        let body = ChatRequest {
            model: params.model(),
            messages,
            temperature: params.temperature(),
            max_tokens: params.max_tokens(),
        };

        let resp = self
            .http
            .post(&self.api_url)
            .headers(headers)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("HTTP error to {}: {}", self.api_url, e)))?;

        let status = resp.status();
        let text_body = resp
            .text()
            .await
            .map_err(|e| AppError::upstream(format!("Failed to read API response: {e}")))?;

        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "status {}: {}",
                status,
                &text_body[..find_char_boundary(&text_body, 500)]
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text_body).map_err(|e| {
            AppError::upstream(format!(
                "malformed response ({}). Raw body:\n{}",
                e,
                &text_body[..find_char_boundary(&text_body, 500)]
            ))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::upstream("no choices in response"))?;
        choice
            .message
            .content
            .ok_or_else(|| AppError::upstream("first choice has no message content"))
    }
}

fn auth_headers(key: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", key.trim()))
            .map_err(|_| AppError::Authentication("Invalid API key format".to_string()))?,
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let messages = vec![Message::system("You are an acting coach."), Message::user("Hello")];
        let request = ChatRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 100,
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": "Use a slow dolly-in." }
                }
            ]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Use a slow dolly-in."));
    }

    #[test]
    fn test_generation_params_bounds() {
        assert!(GenerationParams::new("gpt-4o", 0.0, 100).is_ok());
        assert!(GenerationParams::new("gpt-5-mini", 1.2, 1500).is_ok());
        assert!(GenerationParams::new("gpt-4o", 1.3, 600).is_err());
        assert!(GenerationParams::new("gpt-4o", -0.1, 600).is_err());
        assert!(GenerationParams::new("gpt-4o", 0.5, 99).is_err());
        assert!(GenerationParams::new("gpt-4o", 0.5, 1501).is_err());
        assert!(GenerationParams::new("davinci", 0.5, 600).is_err());
    }

    #[test]
    fn test_failed_setter_keeps_previous_value() {
        let mut params = GenerationParams::default();
        assert!(params.set_temperature(5.0).is_err());
        assert_eq!(params.temperature(), 0.85);
        assert!(params.set_model(" gpt-4o ").is_ok());
        assert_eq!(params.model(), "gpt-4o");
    }

    #[test]
    fn test_resolve_credential_prefers_typed() {
        std::env::set_var("ROLECAST_TEST_KEY_A", "from-env");
        assert_eq!(
            resolve_credential(Some("  sk-typed "), "ROLECAST_TEST_KEY_A").as_deref(),
            Some("sk-typed")
        );
        assert_eq!(
            resolve_credential(Some("   "), "ROLECAST_TEST_KEY_A").as_deref(),
            Some("from-env")
        );
        assert_eq!(resolve_credential(None, "ROLECAST_TEST_KEY_A").as_deref(), Some("from-env"));
    }

    #[test]
    fn test_resolve_credential_absent() {
        std::env::remove_var("ROLECAST_TEST_KEY_B");
        assert!(resolve_credential(None, "ROLECAST_TEST_KEY_B").is_none());
        assert!(resolve_credential(Some(""), "ROLECAST_TEST_KEY_B").is_none());
    }

    #[tokio::test]
    async fn test_complete_without_credential_fails_fast() {
        // Unroutable URL: the call must fail before touching the network.
        let client = CompletionClient::new("http://127.0.0.1:1/v1/chat/completions");
        let err = client
            .complete(&[Message::user("hi")], &GenerationParams::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }
}
