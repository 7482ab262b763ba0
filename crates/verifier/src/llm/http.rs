//! Production provider: OpenAI-compatible chat-completions endpoint over
//! reqwest, with bounded retry on transient failures only.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::llm::provider::{Completion, CompletionOptions, LlmError, LlmProvider};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(10);

pub struct HttpProvider {
    client: reqwest::Client,
    provider_name: String,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_attempts: u32,
    timeout_secs: u64,
}

impl HttpProvider {
    pub fn new(provider_name: &str, endpoint: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_name: provider_name.to_string(),
            endpoint: endpoint.to_string(),
            api_key,
            model: model.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    async fn attempt(&self, prompt: &str, options: &CompletionOptions) -> Result<String, LlmError> {
        let key = self.api_key.as_deref().unwrap_or("");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                provider = %self.provider_name,
                status = status.as_u16(),
                "completion request rejected"
            );
            return Err(LlmError::Api {
                provider: self.provider_name.clone(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: self.provider_name.clone(),
                message: e.to_string(),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: self.provider_name.clone(),
                message: "response contained no choices".to_string(),
            })?;

        debug!(
            provider = %self.provider_name,
            response_length = content.len(),
            "completion received"
        );
        Ok(content)
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: self.provider_name.clone(),
                seconds: self.timeout_secs,
            }
        } else {
            LlmError::Network {
                provider: self.provider_name.clone(),
                message: e.to_string(),
            }
        }
    }
}

/// Timeouts, connection-level failures and 5xx responses are worth another
/// attempt; everything else is permanent.
fn is_transient(error: &LlmError) -> bool {
    match error {
        LlmError::Timeout { .. } | LlmError::Network { .. } => true,
        LlmError::Api { status, .. } => status.map(|s| s >= 500).unwrap_or(false),
        _ => false,
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_INITIAL * 2u32.saturating_pow(attempt.saturating_sub(1));
    exp.min(BACKOFF_CAP)
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        if self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(LlmError::MissingCredential {
                provider: self.provider_name.clone(),
                message: "API key not configured".to_string(),
            });
        }

        debug!(
            provider = %self.provider_name,
            model = %self.model,
            max_tokens = options.max_tokens,
            prompt_length = prompt.len(),
            "completion request"
        );

        let mut attempt = 1;
        loop {
            match self.attempt(prompt, options).await {
                Ok(content) => {
                    return Ok(Completion {
                        text: content,
                        attempts: attempt,
                    })
                }
                Err(e) if is_transient(&e) && attempt < self.max_attempts => {
                    debug!(
                        provider = %self.provider_name,
                        attempt,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(5), Duration::from_secs(10));
        assert_eq!(backoff_delay(30), Duration::from_secs(10));
    }

    #[test]
    fn transient_classification() {
        let timeout = LlmError::Timeout {
            provider: "p".to_string(),
            seconds: 30,
        };
        assert!(is_transient(&timeout));

        let server_error = LlmError::Api {
            provider: "p".to_string(),
            status: Some(503),
            message: "overloaded".to_string(),
        };
        assert!(is_transient(&server_error));

        let client_error = LlmError::Api {
            provider: "p".to_string(),
            status: Some(401),
            message: "bad key".to_string(),
        };
        assert!(!is_transient(&client_error));

        let shape = LlmError::InvalidResponse {
            provider: "p".to_string(),
            message: "no choices".to_string(),
        };
        assert!(!is_transient(&shape));
    }

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let provider = HttpProvider::new("test", "http://localhost:1/v1/chat", "m", None);
        let err = provider
            .complete("prompt", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential { .. }));
    }
}
