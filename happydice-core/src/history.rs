//! Completed rolls and the recent-rolls strip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

use crate::dice::{format_values, DieValue, RollOutcome};
use crate::narrative::Narrative;

/// How many rolls the history keeps.
pub const HISTORY_CAPACITY: usize = 6;

/// Identifier of one roll. UUIDv7, so ids carry their creation time and
/// sort by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollId(Uuid);

impl RollId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RollId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RollId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for RollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    id: RollId,
    values: Vec<DieValue>,
    sum: u32,
    created_at: DateTime<Utc>,
    narrative: Option<Narrative>,
}

impl RollResult {
    pub(crate) fn new(id: RollId, outcome: RollOutcome) -> Self {
        let sum = outcome.sum();
        Self {
            id,
            values: outcome.into_values(),
            sum,
            created_at: Utc::now(),
            narrative: None,
        }
    }

    pub fn id(&self) -> RollId {
        self.id
    }

    pub fn values(&self) -> &[DieValue] {
        &self.values
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn narrative(&self) -> Option<&Narrative> {
        self.narrative.as_ref()
    }

    /// Total beats an average of 4 per die.
    pub fn is_high(&self) -> bool {
        self.sum > 4 * self.values.len() as u32
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", format_values(&self.values), self.sum)
    }
}

/// Most-recent-first list of the last few rolls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    rolls: VecDeque<RollResult>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a roll at the front, evicting the oldest past capacity.
    pub fn push(&mut self, result: RollResult) {
        self.rolls.push_front(result);
        self.rolls.truncate(HISTORY_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    pub fn latest(&self) -> Option<&RollResult> {
        self.rolls.front()
    }

    pub fn get(&self, id: RollId) -> Option<&RollResult> {
        self.rolls.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RollResult> {
        self.rolls.iter()
    }

    /// Sums, newest first, for the recent-luck strip.
    pub fn sums(&self) -> Vec<u32> {
        self.rolls.iter().map(|r| r.sum).collect()
    }

    /// Attach a caption to the roll it was written for.
    ///
    /// Returns false if the roll has already been evicted.
    pub fn attach_narrative(&mut self, id: RollId, narrative: Narrative) -> bool {
        match self.rolls.iter_mut().find(|r| r.id == id) {
            Some(result) => {
                result.narrative = Some(narrative);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::NarrativeSource;

    fn result(values: &[u8]) -> RollResult {
        let values = values.iter().map(|v| DieValue::new(*v).unwrap()).collect();
        RollResult::new(RollId::new(), RollOutcome::from_values(values))
    }

    #[test]
    fn test_result_fields() {
        let r = result(&[3, 5]);
        assert_eq!(r.sum(), 8);
        assert_eq!(r.values().len(), 2);
        assert!(r.narrative().is_none());
        assert!(!r.is_high());
        assert_eq!(r.to_string(), "[3, 5] = 8");
    }

    #[test]
    fn test_history_is_bounded_newest_first() {
        let mut history = History::new();
        let mut ids = Vec::new();
        for i in 0..10u8 {
            let r = result(&[i % 6 + 1]);
            ids.push(r.id());
            history.push(r);
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let kept: Vec<RollId> = history.iter().map(|r| r.id()).collect();
        let expected: Vec<RollId> = ids.iter().rev().take(HISTORY_CAPACITY).copied().collect();
        assert_eq!(kept, expected);
        assert_eq!(history.latest().map(|r| r.id()), ids.last().copied());
    }

    #[test]
    fn test_attach_narrative_by_id() {
        let mut history = History::new();
        let first = result(&[1]);
        let first_id = first.id();
        history.push(first);
        history.push(result(&[2]));

        let narrative = Narrative::new("Oopsie! 🤗", NarrativeSource::Generated);
        assert!(history.attach_narrative(first_id, narrative.clone()));
        assert_eq!(history.get(first_id).unwrap().narrative(), Some(&narrative));
        assert!(history.latest().unwrap().narrative().is_none());
    }

    #[test]
    fn test_attach_to_evicted_roll_is_noop() {
        let mut history = History::new();
        let old = result(&[1]);
        let old_id = old.id();
        history.push(old);
        for _ in 0..HISTORY_CAPACITY {
            history.push(result(&[6]));
        }
        let narrative = Narrative::new("late", NarrativeSource::Generated);
        assert!(!history.attach_narrative(old_id, narrative));
        assert!(history.iter().all(|r| r.narrative().is_none()));
    }

    #[test]
    fn test_roll_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| RollId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
