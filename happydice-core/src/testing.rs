//! Testing utilities for the dice table.
//!
//! Fakes for every seam the engine talks to:
//! - `ScriptedProvider`, `FailingProvider`, `PanickingProvider`, `SlowProvider` for captions without API calls
//! - `ScriptedDice` for deterministic outcomes
//! - `FixedConnectivity`, `RecordingHaptics`, `FixedPermission` for device capabilities

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::dice::{DiceSource, DieCount, DieValue, RandomDice, RollOutcome};
use crate::narrative::{NarrativeProvider, ProviderError};
use crate::platform::{Connectivity, HapticPattern, Haptics, MotionPermission, Permission};

/// Shared count of provider calls, readable after the provider is moved.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A provider that returns scripted replies in order.
///
/// Each reply can carry a delay, to simulate a slow network. Once the script
/// runs out every call gets the default reply.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<(String, Duration)>>,
    default_reply: String,
    calls: CallCounter,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    /// Replies returned immediately.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::delayed(replies.into_iter().map(|r| (r, Duration::ZERO)))
    }

    /// Replies each returned after its own delay.
    pub fn delayed<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = (S, Duration)>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(text, delay)| (text.into(), delay))
                    .collect(),
            ),
            default_reply: "The dice are out of script! 🎲".to_string(),
            calls: CallCounter::default(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    pub fn call_counter(&self) -> CallCounter {
        self.calls.clone()
    }

    /// Every prompt received, in order.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl NarrativeProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.bump();
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let (text, delay) = next.unwrap_or_else(|| (self.default_reply.clone(), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A provider whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingProvider;

#[async_trait]
impl NarrativeProvider for FailingProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Other("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// A provider that panics mid-request, like a bug in a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingProvider;

#[async_trait]
impl NarrativeProvider for PanickingProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        panic!("caption backend crashed");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// A provider that answers only after a long wait.
#[derive(Debug, Clone, Copy)]
pub struct SlowProvider {
    delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl NarrativeProvider for SlowProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok("Finally! 🐢".to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Dice that return scripted faces, then fall back to random.
pub struct ScriptedDice {
    draws: VecDeque<Vec<u8>>,
    fallback: RandomDice,
}

impl ScriptedDice {
    /// Each draw is a list of faces 1-6. Invalid faces read as 1. A draw is
    /// cut or padded with random faces to the count being rolled.
    pub fn new<I>(draws: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            draws: draws.into_iter().collect(),
            fallback: RandomDice::seeded(0),
        }
    }
}

impl DiceSource for ScriptedDice {
    fn draw(&mut self, count: DieCount) -> RollOutcome {
        let Some(faces) = self.draws.pop_front() else {
            return self.fallback.draw(count);
        };

        let mut values: Vec<DieValue> = faces
            .into_iter()
            .take(count.as_usize())
            .map(|f| DieValue::new(f).unwrap_or(DieValue::ONE))
            .collect();
        let scripted = values.len();
        if scripted < count.as_usize() {
            let padding = self.fallback.draw(count).into_values();
            values.extend(padding.into_iter().skip(scripted));
        }
        RollOutcome::from_values(values)
    }
}

/// Connectivity with a switchable answer.
#[derive(Debug, Default)]
pub struct FixedConnectivity {
    offline: AtomicBool,
}

impl FixedConnectivity {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: AtomicBool::new(true),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }
}

impl Connectivity for FixedConnectivity {
    fn is_online(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}

/// Haptics that remember every pattern played.
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    pulses: Mutex<Vec<HapticPattern>>,
}

impl RecordingHaptics {
    pub fn pulses(&self) -> Vec<HapticPattern> {
        self.pulses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Haptics for RecordingHaptics {
    fn pulse(&self, pattern: &HapticPattern) {
        self.pulses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(pattern.clone());
    }
}

/// Motion permission with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedPermission(pub Permission);

#[async_trait]
impl MotionPermission for FixedPermission {
    async fn request(&self) -> Permission {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_provider_order_and_default() {
        let provider = ScriptedProvider::new(["one", "two"]).with_default_reply("done");
        let calls = provider.call_counter();
        assert_eq!(provider.complete("a").await.unwrap(), "one");
        assert_eq!(provider.complete("b").await.unwrap(), "two");
        assert_eq!(provider.complete("c").await.unwrap(), "done");
        assert_eq!(calls.get(), 3);
        assert_eq!(*provider.prompt_log().lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_scripted_dice_then_random() {
        let mut dice = ScriptedDice::new([vec![6, 5]]);
        let count = DieCount::new(2).unwrap();
        assert_eq!(dice.draw(count).sum(), 11);
        assert_eq!(dice.draw(count).len(), 2);
    }

    #[test]
    fn test_scripted_dice_match_requested_count() {
        let mut dice = ScriptedDice::new([vec![6, 6, 6], vec![4]]);
        let two = DieCount::new(2).unwrap();
        let three = DieCount::new(3).unwrap();

        let long = dice.draw(two);
        assert_eq!(long.len(), 2);
        assert_eq!(long.sum(), 12);

        let short = dice.draw(three);
        assert_eq!(short.len(), 3);
        assert_eq!(short.values()[0].get(), 4);
    }

    #[test]
    fn test_connectivity_switch() {
        let connectivity = FixedConnectivity::online();
        assert!(connectivity.is_online());
        connectivity.set_online(false);
        assert!(!connectivity.is_online());
    }
}
