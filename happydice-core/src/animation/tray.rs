//! The set of dice currently on the table.

use rand::Rng;
use std::time::Duration;

use super::{DieAnimator, Transition};
use crate::dice::DieValue;

/// One animator per visible die, indexed left to right.
#[derive(Debug, Clone)]
pub struct DiceTray {
    dice: Vec<DieAnimator>,
}

impl DiceTray {
    pub fn new(count: usize) -> Self {
        Self {
            dice: (0..count).map(DieAnimator::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn dice(&self) -> &[DieAnimator] {
        &self.dice
    }

    /// Add dice at rest or drop dice from the end. Surviving dice keep
    /// their accumulated rotation.
    pub fn resize(&mut self, count: usize) {
        if count < self.dice.len() {
            self.dice.truncate(count);
        } else {
            let start = self.dice.len();
            self.dice.extend((start..count).map(DieAnimator::new));
        }
    }

    /// Start every die tumbling. Dice already spinning are left alone.
    pub fn spin_all<R: Rng>(&mut self, duration: Duration, rng: &mut R) -> Vec<Transition> {
        self.dice
            .iter_mut()
            .filter_map(|die| {
                let value = die.value();
                die.set_rolling(true, value, duration, rng)
            })
            .collect()
    }

    /// Land die `i` on `values[i]`. The tray is resized to match first.
    pub fn land_all<R: Rng>(
        &mut self,
        values: &[DieValue],
        duration: Duration,
        rng: &mut R,
    ) -> Vec<Transition> {
        self.resize(values.len());
        self.dice
            .iter_mut()
            .zip(values)
            .filter_map(|(die, value)| die.set_rolling(false, *value, duration, rng))
            .collect()
    }

    /// Latest transition per die, for renderers that poll.
    pub fn transitions(&self) -> Vec<Option<Transition>> {
        self.dice
            .iter()
            .map(|die| die.last_transition().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{face_target, Phase};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ROLL: Duration = Duration::from_millis(800);

    #[test]
    fn test_spin_then_land() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut tray = DiceTray::new(3);

        let spins = tray.spin_all(ROLL, &mut rng);
        assert_eq!(spins.len(), 3);
        assert_eq!(spins[2].delay, Duration::from_millis(200));
        assert!(tray.dice().iter().all(|d| d.phase() == Phase::Spinning));

        let values: Vec<DieValue> = [2, 5, 6].iter().map(|v| DieValue::new(*v).unwrap()).collect();
        let lands = tray.land_all(&values, ROLL, &mut rng);
        assert_eq!(lands.len(), 3);
        for (die, value) in tray.dice().iter().zip(&values) {
            assert_eq!(die.value(), *value);
            let (tx, _) = face_target(*value);
            let d = (die.rotation().x - tx).rem_euclid(360.0);
            assert!(d < 1e-6 || 360.0 - d < 1e-6);
        }
    }

    #[test]
    fn test_resize_keeps_existing_rotation() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut tray = DiceTray::new(2);
        tray.spin_all(ROLL, &mut rng);
        let first = tray.dice()[0].rotation();

        tray.resize(4);
        assert_eq!(tray.len(), 4);
        assert_eq!(tray.dice()[0].rotation(), first);
        assert_eq!(tray.dice()[3].index(), 3);
        assert!(tray.transitions()[3].is_none());

        tray.resize(1);
        assert_eq!(tray.len(), 1);
    }
}
