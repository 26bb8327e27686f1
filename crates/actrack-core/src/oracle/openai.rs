//! Blocking client for OpenAI-compatible chat-completions endpoints.

use super::{ChatMessage, Oracle, OracleError};
use crate::config::OracleConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiOracle {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiOracle")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl OpenAiOracle {
    /// Build a client from config, reading the API key from the named env var.
    ///
    /// A missing key is an error unless the endpoint is a local server
    /// (`localhost`/`127.0.0.1`), which commonly runs without auth.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() && !is_local(&config.base_url) {
            return Err(OracleError::MissingApiKey(config.api_key_env.clone()));
        }
        Ok(Self::new(config, api_key))
    }

    #[must_use]
    pub fn new(config: &OracleConfig, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Oracle for OpenAiOracle {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, OracleError> {
        info!(model = %self.model, endpoint = %self.endpoint, "sending oracle request");

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("User-Agent", "actrack-cli");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        let response = match request.send_json(&body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(OracleError::Status {
                    status,
                    body: super::payload::excerpt(&body),
                });
            }
            Err(err) => return Err(OracleError::Transport(err.to_string())),
        };

        let parsed: CompletionResponse = response
            .into_json()
            .map_err(|err| OracleError::Transport(format!("failed to decode response: {err}")))?;

        let content = extract_content(parsed).ok_or(OracleError::EmptyResponse)?;
        debug!(chars = content.len(), "oracle response received");
        Ok(content)
    }
}

fn extract_content(response: CompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn is_local(base_url: &str) -> bool {
    let rest = base_url
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    rest.starts_with("localhost") || rest.starts_with("127.0.0.1") || rest.starts_with("[::1]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Role;

    #[test]
    fn request_body_has_openai_shape() {
        let messages = [ChatMessage::new(Role::User, "hello")];
        let body = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 2048,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 2048);
    }

    #[test]
    fn content_is_taken_from_first_choice() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  [] \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(parsed).as_deref(), Some("[]"));
    }

    #[test]
    fn missing_or_blank_content_is_none() {
        let empty: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(extract_content(empty).is_none());
        let blank: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert!(extract_content(blank).is_none());
        let null: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(extract_content(null).is_none());
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = OracleConfig {
            base_url: "http://localhost:11434/v1/".into(),
            ..OracleConfig::default()
        };
        let oracle = OpenAiOracle::new(&config, None);
        assert_eq!(oracle.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn local_endpoints_do_not_need_a_key() {
        assert!(is_local("http://localhost:8080/v1"));
        assert!(is_local("http://127.0.0.1:11434/v1"));
        assert!(!is_local("https://api.openai.com/v1"));

        let config = OracleConfig {
            base_url: "http://127.0.0.1:11434/v1".into(),
            api_key_env: "ACTRACK_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..OracleConfig::default()
        };
        assert!(OpenAiOracle::from_config(&config).is_ok());
    }

    #[test]
    fn remote_endpoint_without_key_is_rejected() {
        let config = OracleConfig {
            api_key_env: "ACTRACK_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..OracleConfig::default()
        };
        assert_eq!(
            OpenAiOracle::from_config(&config).unwrap_err(),
            OracleError::MissingApiKey("ACTRACK_TEST_KEY_THAT_IS_NEVER_SET".into())
        );
    }
}
