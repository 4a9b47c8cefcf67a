//! Six-sided dice and the random outcome generator.
//!
//! Every roll is a fresh, independent draw of 1–4 standard d6.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Smallest number of dice on the table.
pub const MIN_DICE: u8 = 1;

/// Largest number of dice on the table.
pub const MAX_DICE: u8 = 4;

/// Number of faces on every die.
pub const FACES: u8 = 6;

/// Error type for out-of-range dice input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid die face: {0} (expected 1-6)")]
    InvalidFace(u8),
    #[error("Invalid die count: {0} (expected 1-4)")]
    InvalidDieCount(u8),
}

/// The face a single die shows at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DieValue(u8);

impl DieValue {
    pub const ONE: DieValue = DieValue(1);

    /// Create a die value, rejecting anything outside 1-6.
    pub fn new(value: u8) -> Result<Self, DiceError> {
        if (1..=FACES).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DiceError::InvalidFace(value))
        }
    }

    /// Draw a uniformly random face.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen_range(1..=FACES))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DieValue {
    type Error = DiceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DieValue> for u8 {
    fn from(value: DieValue) -> u8 {
        value.0
    }
}

impl fmt::Display for DieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How many dice are rolled together (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DieCount(u8);

impl DieCount {
    pub fn new(count: u8) -> Result<Self, DiceError> {
        if (MIN_DICE..=MAX_DICE).contains(&count) {
            Ok(Self(count))
        } else {
            Err(DiceError::InvalidDieCount(count))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for DieCount {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for DieCount {
    type Error = DiceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DieCount> for u8 {
    fn from(count: DieCount) -> u8 {
        count.0
    }
}

/// The values drawn for one roll, in die order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    values: Vec<DieValue>,
    sum: u32,
}

impl RollOutcome {
    /// Build an outcome from already-drawn values.
    pub fn from_values(values: Vec<DieValue>) -> Self {
        let sum = values.iter().map(|v| u32::from(v.get())).sum();
        Self { values, sum }
    }

    pub fn values(&self) -> &[DieValue] {
        &self.values
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A roll is "high" when it beats an average of 4 per die.
    pub fn is_high(&self) -> bool {
        self.sum > 4 * self.values.len() as u32
    }

    pub fn into_values(self) -> Vec<DieValue> {
        self.values
    }
}

impl fmt::Display for RollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", format_values(&self.values), self.sum)
    }
}

/// Format values as `[3, 5]`.
pub fn format_values(values: &[DieValue]) -> String {
    format!(
        "[{}]",
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Roll `count` dice with the thread RNG.
pub fn roll(count: DieCount) -> RollOutcome {
    roll_with_rng(count, &mut rand::thread_rng())
}

/// Roll with a specific RNG (useful for testing).
pub fn roll_with_rng<R: Rng>(count: DieCount, rng: &mut R) -> RollOutcome {
    let values = (0..count.get()).map(|_| DieValue::random(rng)).collect();
    RollOutcome::from_values(values)
}

/// Where the orchestrator gets its outcomes from.
pub trait DiceSource: Send {
    fn draw(&mut self, count: DieCount) -> RollOutcome;
}

/// Uniform random draws from a seedable RNG.
#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDice {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceSource for RandomDice {
    fn draw(&mut self, count: DieCount) -> RollOutcome {
        roll_with_rng(count, &mut self.rng)
    }
}
