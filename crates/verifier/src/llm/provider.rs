use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("[{provider}] credential not configured: {message}")]
    MissingCredential { provider: String, message: String },

    #[error("[{provider}] API error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Api {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("[{provider}] unexpected response shape: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("[{provider}] request timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    #[error("[{provider}] network error: {message}")]
    Network { provider: String, message: String },
}

impl LlmError {
    pub fn provider(&self) -> &str {
        match self {
            Self::MissingCredential { provider, .. }
            | Self::Api { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Network { provider, .. } => provider,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            // answers are one short line; a small cap keeps cost flat
            max_tokens: 50,
            temperature: 0.0,
        }
    }
}

/// A successful completion plus how many attempts the provider spent on it,
/// so finding metadata can record the real retry count.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub attempts: u32,
}

/// A text-completion backend. The core treats this purely as
/// prompt-in/text-out and never assumes a provider wire format.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<Completion, LlmError>;

    /// Identifier recorded into finding metadata for auditability.
    fn model_id(&self) -> &str;
}
