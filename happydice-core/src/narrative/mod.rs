//! Roll captions from a remote model, with local fallbacks.
//!
//! [`NarrativeService::generate`] never fails. Whatever goes wrong (no
//! network, no API key, a slow or broken provider) the caller gets a
//! caption, tagged with where it came from:
//!
//! 1. Device offline: random offline phrase, tagged [`NarrativeSource::Offline`].
//! 2. No provider configured: the sleepy message.
//! 3. Otherwise the provider is asked, bounded by the request timeout.
//! 4. Empty reply: the "magic failed" placeholder.
//! 5. Provider error or timeout: random offline phrase, tagged
//!    [`NarrativeSource::ConnectionError`].

mod phrases;
mod prompt;
mod provider;

pub use phrases::{offline_phrase, MAGIC_FAILED, OFFLINE_PHRASES, SLEEPY_MESSAGE};
pub use prompt::{build_prompt, DEFAULT_TONE};
pub use provider::{ClaudeProvider, NarrativeProvider, ProviderError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::NarrativeConfig;
use crate::dice::DieValue;
use crate::platform::{AssumeOnline, Connectivity};

/// Where a caption came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NarrativeSource {
    /// Written by the remote model.
    Generated,
    /// The model replied with nothing usable.
    Empty,
    /// No API key; the sleepy placeholder.
    Unconfigured,
    /// Device reported no connectivity.
    Offline,
    /// The remote call failed.
    ConnectionError,
}

impl NarrativeSource {
    /// Suffix shown after fallback captions.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            NarrativeSource::Offline => Some("Offline"),
            NarrativeSource::ConnectionError => Some("Connection Error"),
            _ => None,
        }
    }
}

/// A caption for one roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    text: String,
    source: NarrativeSource,
}

impl Narrative {
    pub fn new(text: impl Into<String>, source: NarrativeSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// The caption body, without any source tag.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> NarrativeSource {
        self.source
    }

    /// True when the text came from the offline pool.
    pub fn is_fallback(&self) -> bool {
        self.source.tag().is_some()
    }

    /// Display string, e.g. `Beep boop! Offline high-five! ✋ (Offline)`.
    pub fn caption(&self) -> String {
        match self.source.tag() {
            Some(tag) => format!("{} ({tag})", self.text),
            None => self.text.clone(),
        }
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.caption())
    }
}

/// Produces roll captions.
#[derive(Clone)]
pub struct NarrativeService {
    provider: Option<Arc<dyn NarrativeProvider>>,
    connectivity: Arc<dyn Connectivity>,
    request_timeout: Duration,
    tone: String,
}

impl fmt::Debug for NarrativeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrativeService")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("request_timeout", &self.request_timeout)
            .field("tone", &self.tone)
            .finish_non_exhaustive()
    }
}

impl NarrativeService {
    /// A service with the given provider (or none) and default settings.
    pub fn new(provider: Option<Arc<dyn NarrativeProvider>>) -> Self {
        let defaults = NarrativeConfig::default();
        Self {
            provider,
            connectivity: Arc::new(AssumeOnline),
            request_timeout: defaults.request_timeout,
            tone: defaults.tone,
        }
    }

    /// A service with no credentials; always answers with the sleepy message
    /// when online.
    pub fn unconfigured() -> Self {
        Self::new(None)
    }

    pub fn with_provider(provider: impl NarrativeProvider + 'static) -> Self {
        Self::new(Some(Arc::new(provider)))
    }

    /// Load `.env`, then build a Claude-backed service from
    /// `ANTHROPIC_API_KEY`. A missing key yields an unconfigured service.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let config = NarrativeConfig::from_env();

        match ClaudeProvider::from_env() {
            Ok(provider) => {
                let provider = provider.with_config(config.clone());
                Self::with_provider(provider).with_config(&config)
            }
            Err(e) => {
                warn!("Narrative provider unavailable: {e}");
                Self::unconfigured().with_config(&config)
            }
        }
    }

    /// Apply timeout and tone from a config.
    pub fn with_config(mut self, config: &NarrativeConfig) -> Self {
        self.request_timeout = config.request_timeout;
        self.tone = config.tone.clone();
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Caption a roll. Never fails; see the module docs for the fallback order.
    pub async fn generate(&self, values: &[DieValue], sum: u32) -> Narrative {
        if !self.connectivity.is_online() {
            return Self::fallback(NarrativeSource::Offline);
        }

        let Some(provider) = &self.provider else {
            warn!("API key not found, answering with the sleepy caption");
            return Narrative::new(SLEEPY_MESSAGE, NarrativeSource::Unconfigured);
        };

        let prompt = build_prompt(values, sum, &self.tone);
        let reply = tokio::time::timeout(self.request_timeout, provider.complete(&prompt))
            .await
            .unwrap_or(Err(ProviderError::Timeout(self.request_timeout)));

        match reply {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    debug!(provider = provider.name(), "Provider returned an empty caption");
                    Narrative::new(MAGIC_FAILED, NarrativeSource::Empty)
                } else {
                    Narrative::new(text, NarrativeSource::Generated)
                }
            }
            Err(e) => {
                error!(provider = provider.name(), "Narrative request failed: {e}");
                Self::fallback(NarrativeSource::ConnectionError)
            }
        }
    }

    fn fallback(source: NarrativeSource) -> Narrative {
        let phrase = offline_phrase(&mut rand::thread_rng());
        Narrative::new(phrase, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingProvider, FixedConnectivity, ScriptedProvider, SlowProvider};

    fn roll(v: &[u8]) -> (Vec<DieValue>, u32) {
        let values: Vec<DieValue> = v.iter().map(|x| DieValue::new(*x).unwrap()).collect();
        let sum = v.iter().map(|x| *x as u32).sum();
        (values, sum)
    }

    #[tokio::test]
    async fn test_offline_uses_pool() {
        let provider = ScriptedProvider::new(["should not be asked"]);
        let calls = provider.call_counter();
        let service = NarrativeService::with_provider(provider)
            .with_connectivity(Arc::new(FixedConnectivity::offline()));

        let (values, sum) = roll(&[2, 3]);
        for _ in 0..20 {
            let narrative = service.generate(&values, sum).await;
            assert_eq!(narrative.source(), NarrativeSource::Offline);
            assert!(OFFLINE_PHRASES.contains(&narrative.text()));
            assert!(narrative.caption().ends_with(" (Offline)"));
        }
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_offline_checked_before_credentials() {
        let service = NarrativeService::unconfigured()
            .with_connectivity(Arc::new(FixedConnectivity::offline()));
        let (values, sum) = roll(&[1]);
        let narrative = service.generate(&values, sum).await;
        assert_eq!(narrative.source(), NarrativeSource::Offline);
    }

    #[tokio::test]
    async fn test_unconfigured_is_sleepy() {
        let service = NarrativeService::unconfigured();
        let (values, sum) = roll(&[6, 6]);
        let narrative = service.generate(&values, sum).await;
        assert_eq!(narrative.text(), SLEEPY_MESSAGE);
        assert_eq!(narrative.source(), NarrativeSource::Unconfigured);
        assert_eq!(narrative.caption(), SLEEPY_MESSAGE);
        assert!(!service.is_configured());
    }

    #[tokio::test]
    async fn test_generated_text_is_trimmed() {
        let provider = ScriptedProvider::new(["  Confetti time! 🎉\n"]);
        let prompts = provider.prompt_log();
        let service = NarrativeService::with_provider(provider);

        let (values, sum) = roll(&[6, 5]);
        let narrative = service.generate(&values, sum).await;
        assert_eq!(narrative.text(), "Confetti time! 🎉");
        assert_eq!(narrative.source(), NarrativeSource::Generated);

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[6, 5]. Total: 11."));
    }

    #[tokio::test]
    async fn test_empty_reply_is_magic_failed() {
        let service = NarrativeService::with_provider(ScriptedProvider::new(["   "]));
        let (values, sum) = roll(&[3]);
        let narrative = service.generate(&values, sum).await;
        assert_eq!(narrative.text(), MAGIC_FAILED);
        assert_eq!(narrative.source(), NarrativeSource::Empty);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_pool() {
        let service = NarrativeService::with_provider(FailingProvider);
        let (values, sum) = roll(&[4, 4]);
        let narrative = service.generate(&values, sum).await;
        assert_eq!(narrative.source(), NarrativeSource::ConnectionError);
        assert!(OFFLINE_PHRASES.contains(&narrative.text()));
        assert!(narrative.to_string().ends_with(" (Connection Error)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let service = NarrativeService::with_provider(SlowProvider::new(Duration::from_secs(60)))
            .with_request_timeout(Duration::from_secs(2));
        let (values, sum) = roll(&[1, 2]);
        let narrative = service.generate(&values, sum).await;
        assert_eq!(narrative.source(), NarrativeSource::ConnectionError);
    }
}
