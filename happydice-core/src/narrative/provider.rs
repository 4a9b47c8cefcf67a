//! Remote text generation backends.

use async_trait::async_trait;
use claude::{Claude, Message, Request};
use std::time::Duration;
use thiserror::Error;

use crate::config::NarrativeConfig;

/// Errors from a narrative provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Claude API error: {0}")]
    Api(#[from] claude::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider error: {0}")]
    Other(String),
}

/// Anything that can turn a prompt into a short piece of text.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Send the prompt and return the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Name for log lines.
    fn name(&self) -> &str;
}

/// Captions from Claude's Messages API.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    client: Claude,
    config: NarrativeConfig,
}

impl ClaudeProvider {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            config: NarrativeConfig::default(),
        }
    }

    /// Create from environment (ANTHROPIC_API_KEY, HAPPYDICE_MODEL).
    pub fn from_env() -> Result<Self, claude::Error> {
        let client = Claude::from_env()?;
        Ok(Self::new(client).with_config(NarrativeConfig::from_env()))
    }

    pub fn with_config(mut self, config: NarrativeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }
}

#[async_trait]
impl NarrativeProvider for ClaudeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = Request::new(vec![Message::user(prompt)])
            .with_model(&self.config.model)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        let response = self.client.complete(request).await?;
        Ok(response.text)
    }

    fn name(&self) -> &str {
        "claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config() {
        let client = Claude::new("test-key").unwrap();
        let provider = ClaudeProvider::new(client)
            .with_config(NarrativeConfig::default().with_model("claude-3-opus"));
        assert_eq!(provider.config().model, "claude-3-opus");
        assert_eq!(provider.name(), "claude");
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::from(claude::Error::Timeout);
        assert_eq!(err.to_string(), "Claude API error: Request timed out");
    }
}
