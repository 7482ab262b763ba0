//! Deterministic providers for tests: canned answers and forced failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::provider::{Completion, CompletionOptions, LlmError, LlmProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub options: CompletionOptions,
}

/// Substring-keyed canned responses. The first registered pattern found in
/// the prompt wins; no match returns the default response.
pub struct StubProvider {
    responses: Vec<(String, String)>,
    default_response: String,
    latency: Duration,
    should_fail: bool,
    call_count: AtomicUsize,
    call_history: Mutex<Vec<RecordedCall>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: "UNCLEAR".to_string(),
            latency: Duration::ZERO,
            should_fail: false,
            call_count: AtomicUsize::new(0),
            call_history: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    pub fn with_response(mut self, pattern: &str, response: &str) -> Self {
        self.responses.push((pattern.to_string(), response.to_string()));
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.call_history.lock().unwrap().clear();
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.call_history.lock().unwrap().last().cloned()
    }

    pub fn was_called_with(&self, pattern: &str) -> bool {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .any(|call| call.prompt.contains(pattern))
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.call_history.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            options: options.clone(),
        });

        if self.latency > Duration::ZERO {
            tokio::time::sleep(self.latency).await;
        }

        if self.should_fail {
            return Err(LlmError::Api {
                provider: "stub".to_string(),
                status: None,
                message: "simulated failure".to_string(),
            });
        }

        for (pattern, response) in &self.responses {
            if prompt.contains(pattern) {
                return Ok(Completion {
                    text: response.clone(),
                    attempts: 1,
                });
            }
        }
        Ok(Completion {
            text: self.default_response.clone(),
            attempts: 1,
        })
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

/// Always fails with a typed error. Exists so degradation paths can be
/// tested independently of the stub's matching logic.
pub struct FailingProvider {
    message: String,
    call_count: AtomicUsize,
}

impl FailingProvider {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FailingProvider {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Api {
            provider: "failing".to_string(),
            status: None,
            message: self.message.clone(),
        })
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_matching_pattern_wins() {
        let stub = StubProvider::new()
            .with_response("null safety", "UNSAFE: name")
            .with_response("safety", "SAFE: all parameters handled");

        let completion = stub
            .complete("checking null safety of greet", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(completion.text, "UNSAFE: name");
        assert_eq!(completion.attempts, 1);
    }

    #[tokio::test]
    async fn no_match_returns_default() {
        let stub = StubProvider::new().with_response("alpha", "A");
        let completion = stub
            .complete("beta", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(completion.text, "UNCLEAR");
    }

    #[tokio::test]
    async fn call_history_is_recorded() {
        let stub = StubProvider::new();
        let options = CompletionOptions {
            max_tokens: 99,
            temperature: 0.5,
        };
        stub.complete("first prompt", &options).await.unwrap();
        stub.complete("second prompt", &options).await.unwrap();

        assert_eq!(stub.call_count(), 2);
        assert!(stub.was_called_with("first"));
        let last = stub.last_call().unwrap();
        assert_eq!(last.prompt, "second prompt");
        assert_eq!(last.options.max_tokens, 99);

        stub.reset();
        assert_eq!(stub.call_count(), 0);
        assert!(stub.last_call().is_none());
    }

    #[tokio::test]
    async fn failing_modes_return_typed_errors() {
        let stub = StubProvider::failing();
        let err = stub
            .complete("anything", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.provider(), "stub");

        let failing = FailingProvider::new("down for maintenance");
        let err = failing
            .complete("anything", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.provider(), "failing");
        assert_eq!(failing.call_count(), 1);
    }
}
