//! Roll and narrative configuration.

use std::time::Duration;

use crate::animation::DEFAULT_ROLL_DURATION;
use crate::dice::DieCount;
use crate::narrative::DEFAULT_TONE;

/// Overrides the caption model when set.
pub const MODEL_ENV_VAR: &str = "HAPPYDICE_MODEL";

/// Fast, cheap model for one-line captions.
pub const DEFAULT_NARRATIVE_MODEL: &str = "claude-3-5-haiku-20241022";

/// Table settings read by the orchestrator at roll time.
#[derive(Debug, Clone)]
pub struct RollConfig {
    /// Dice rolled per trigger.
    pub die_count: DieCount,

    /// Time between the trigger and the reveal.
    pub roll_duration: Duration,

    /// Ask for a caption after each roll.
    pub ai_enabled: bool,

    /// Reserved: stored and reported, no audio is produced.
    pub sound_enabled: bool,

    /// Whether shake-to-roll should be turned on at startup.
    pub shake_enabled: bool,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            die_count: DieCount::default(),
            roll_duration: DEFAULT_ROLL_DURATION,
            ai_enabled: true,
            sound_enabled: false,
            shake_enabled: false,
        }
    }
}

impl RollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of dice.
    pub fn with_die_count(mut self, count: DieCount) -> Self {
        self.die_count = count;
        self
    }

    /// Set the reveal delay.
    pub fn with_roll_duration(mut self, duration: Duration) -> Self {
        self.roll_duration = duration;
        self
    }

    pub fn with_ai(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }

    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    pub fn with_shake(mut self, enabled: bool) -> Self {
        self.shake_enabled = enabled;
        self
    }
}

/// Settings for caption generation.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// Model used by the Claude provider.
    pub model: String,

    /// Token cap; captions are a single short line.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: f32,

    /// Give up on the remote call after this long.
    pub request_timeout: Duration,

    /// Voice of the caption.
    pub tone: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_NARRATIVE_MODEL.to_string(),
            max_tokens: 100,
            temperature: 0.9,
            request_timeout: Duration::from_secs(10),
            tone: DEFAULT_TONE.to_string(),
        }
    }
}

impl NarrativeConfig {
    /// Defaults, with `HAPPYDICE_MODEL` applied when present.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(MODEL_ENV_VAR) {
            Ok(model) if !model.trim().is_empty() => config.with_model(model.trim()),
            _ => config,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }
}
