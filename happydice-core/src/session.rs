//! RollSession - the primary public API for rolling dice.
//!
//! A session owns the table: the dice and their animators, the caption,
//! the recent-rolls history and the shake detector. One roll at a time:
//!
//! 1. [`RollSession::trigger`] draws the outcome immediately and starts the
//!    dice spinning.
//! 2. After the roll duration the outcome is revealed, the dice land and the
//!    result goes to the front of the history.
//! 3. If captions are on, a narrative is requested for that roll id in the
//!    background. The next roll can start right away.
//!
//! Every method is synchronous except [`RollSession::enable_shake`]; rolls
//! run as tokio tasks, so a trigger outside a tokio runtime is refused.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::animation::{DiceTray, Rotation, Transition};
use crate::config::RollConfig;
use crate::dice::{DiceSource, DieCount, DieValue, RandomDice, RollOutcome};
use crate::history::{History, RollId, RollResult};
use crate::narrative::{Narrative, NarrativeService};
use crate::platform::{
    HapticPattern, Haptics, MotionPermission, MotionSample, NoHaptics, NoPermissionRequired,
};
use crate::shake::ShakeDetector;

/// Shown before the first roll and while a new roll is in the air.
pub const PROMPT_TEXT: &str = "Tap or Shake to Roll!";

/// Shown while a caption is being written.
pub const GENERATING_TEXT: &str = "Magic is happening...";

/// Errors from RollSession operations.
#[derive(Debug, Error)]
pub enum RollError {
    #[error("Roll task failed: {0}")]
    TaskFailed(String),
}

/// Errors from turning on shake-to-roll.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShakeError {
    #[error("Permission denied. Cannot use Shake to Roll.")]
    PermissionDenied,
}

/// What the caption area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caption {
    Prompt,
    Generating,
    Narrative(Narrative),
}

impl Caption {
    pub fn text(&self) -> String {
        match self {
            Caption::Prompt => PROMPT_TEXT.to_string(),
            Caption::Generating => GENERATING_TEXT.to_string(),
            Caption::Narrative(narrative) => narrative.caption(),
        }
    }
}

/// Everything a renderer needs to draw the table.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    /// Faces currently shown. During a roll these are the previous faces.
    pub values: Vec<DieValue>,
    pub total: u32,
    pub rolling: bool,
    pub caption: Caption,
    /// Current cumulative rotation per die.
    pub rotations: Vec<Rotation>,
    /// Latest transition per die, `None` for dice that never moved.
    pub transitions: Vec<Option<Transition>>,
    /// Newest first, at most six.
    pub history: Vec<RollResult>,
    pub die_count: DieCount,
    pub ai_enabled: bool,
    pub sound_enabled: bool,
    pub shake_enabled: bool,
}

/// A roll that has started but not yet landed.
#[derive(Debug)]
pub struct RollTicket {
    id: RollId,
    values: Vec<DieValue>,
    task: JoinHandle<Landing>,
}

impl RollTicket {
    pub fn id(&self) -> RollId {
        self.id
    }

    /// The outcome, fixed when the roll started.
    pub fn values(&self) -> &[DieValue] {
        &self.values
    }

    /// Wait for the reveal.
    pub async fn landed(self) -> Result<Landing, RollError> {
        self.task
            .await
            .map_err(|e| RollError::TaskFailed(e.to_string()))
    }
}

/// A revealed roll, plus its caption request if captions are on.
#[derive(Debug)]
pub struct Landing {
    pub result: RollResult,
    pub narrative: Option<NarrativeTicket>,
}

/// A caption being written for a specific roll.
#[derive(Debug)]
pub struct NarrativeTicket {
    roll: RollId,
    task: JoinHandle<Result<Narrative, RollError>>,
}

impl NarrativeTicket {
    /// The roll this caption belongs to.
    pub fn roll(&self) -> RollId {
        self.roll
    }

    /// Wait for the caption. Fails only if the caption task itself died.
    pub async fn resolved(self) -> Result<Narrative, RollError> {
        self.task
            .await
            .map_err(|e| RollError::TaskFailed(e.to_string()))?
    }
}

struct Table {
    config: RollConfig,
    rolling: bool,
    displayed: Vec<DieValue>,
    tray: DiceTray,
    caption: Caption,
    /// Last revealed roll; captions for any other roll are not displayed.
    latest: Option<RollId>,
    history: History,
    shake: Option<ShakeDetector>,
    dice: Box<dyn DiceSource>,
    rng: StdRng,
}

impl Table {
    fn total(&self) -> u32 {
        self.displayed.iter().map(|v| u32::from(v.get())).sum()
    }
}

struct Shared {
    table: Mutex<Table>,
    narrator: NarrativeService,
    haptics: Arc<dyn Haptics>,
    permission: Arc<dyn MotionPermission>,
}

/// Handle to a dice table. Clones share the same table.
#[derive(Clone)]
pub struct RollSession {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for RollSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table();
        f.debug_struct("RollSession")
            .field("rolling", &table.rolling)
            .field("displayed", &table.displayed)
            .field("narrator", &self.shared.narrator)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`RollSession`].
pub struct RollSessionBuilder {
    config: RollConfig,
    narrator: NarrativeService,
    haptics: Arc<dyn Haptics>,
    permission: Arc<dyn MotionPermission>,
    dice: Box<dyn DiceSource>,
    animation_seed: Option<u64>,
}

impl RollSessionBuilder {
    pub fn config(mut self, config: RollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn narrator(mut self, narrator: NarrativeService) -> Self {
        self.narrator = narrator;
        self
    }

    pub fn haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    pub fn motion_permission(mut self, permission: Arc<dyn MotionPermission>) -> Self {
        self.permission = permission;
        self
    }

    /// Replace the outcome generator (scripted draws in tests).
    pub fn dice(mut self, dice: impl DiceSource + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    /// Make spin amounts reproducible.
    pub fn animation_seed(mut self, seed: u64) -> Self {
        self.animation_seed = Some(seed);
        self
    }

    pub fn build(self) -> RollSession {
        let count = self.config.die_count.as_usize();
        let shake = self.config.shake_enabled.then(ShakeDetector::new);
        let rng = match self.animation_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let table = Table {
            config: self.config,
            rolling: false,
            displayed: vec![DieValue::ONE; count],
            tray: DiceTray::new(count),
            caption: Caption::Prompt,
            latest: None,
            history: History::new(),
            shake,
            dice: self.dice,
            rng,
        };

        RollSession {
            shared: Arc::new(Shared {
                table: Mutex::new(table),
                narrator: self.narrator,
                haptics: self.haptics,
                permission: self.permission,
            }),
        }
    }
}

impl RollSession {
    /// Start building a session. Defaults: two dice, random draws, no
    /// captions provider, no haptics, no motion permission needed.
    pub fn builder() -> RollSessionBuilder {
        RollSessionBuilder {
            config: RollConfig::default(),
            narrator: NarrativeService::unconfigured(),
            haptics: Arc::new(NoHaptics),
            permission: Arc::new(NoPermissionRequired),
            dice: Box::new(RandomDice::new()),
            animation_seed: None,
        }
    }

    /// A session with default settings and captions from the environment.
    pub fn from_env(config: RollConfig) -> Self {
        Self::builder()
            .config(config)
            .narrator(NarrativeService::from_env())
            .build()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.shared
            .table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a roll.
    ///
    /// Returns `None` if a roll is already in progress, or if there is no
    /// tokio runtime to run the reveal on. Neither case touches the table.
    pub fn trigger(&self) -> Option<RollTicket> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, cannot start a roll");
            return None;
        };

        let id = RollId::new();
        let (outcome, duration, ai_enabled) = {
            let mut table = self.table();
            if table.rolling {
                debug!("Roll already in progress, ignoring trigger");
                return None;
            }
            table.rolling = true;
            table.caption = Caption::Prompt;

            let count = table.config.die_count;
            let duration = table.config.roll_duration;
            let ai_enabled = table.config.ai_enabled;
            let outcome = table.dice.draw(count);

            let Table { tray, rng, .. } = &mut *table;
            tray.spin_all(duration, rng);

            (outcome, duration, ai_enabled)
        };

        debug!(roll = %id, outcome = %outcome, "Roll started");
        self.shared.haptics.pulse(&HapticPattern::roll_start());

        let values = outcome.values().to_vec();
        let session = self.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            session.reveal(id, outcome, ai_enabled)
        });

        Some(RollTicket { id, values, task })
    }

    /// `ai_enabled` is the caption setting captured when the roll started.
    fn reveal(&self, id: RollId, outcome: RollOutcome, ai_enabled: bool) -> Landing {
        let result = RollResult::new(id, outcome);
        {
            let mut table = self.table();
            table.displayed = result.values().to_vec();

            let duration = table.config.roll_duration;
            let Table { tray, rng, .. } = &mut *table;
            tray.land_all(result.values(), duration, rng);

            table.rolling = false;
            table.latest = Some(id);
            table.history.push(result.clone());
            if ai_enabled {
                table.caption = Caption::Generating;
            }
        }

        debug!(roll = %id, result = %result, "Roll landed");
        self.shared.haptics.pulse(&HapticPattern::landing());

        let narrative = ai_enabled.then(|| self.request_narrative(&result));
        Landing { result, narrative }
    }

    fn request_narrative(&self, result: &RollResult) -> NarrativeTicket {
        let roll = result.id();
        let values = result.values().to_vec();
        let sum = result.sum();
        let session = self.clone();

        let task = tokio::spawn(async move {
            let narrator = session.shared.narrator.clone();
            let request = tokio::spawn(async move { narrator.generate(&values, sum).await });

            match request.await {
                Ok(narrative) => {
                    session.apply_narrative(roll, narrative.clone());
                    Ok(narrative)
                }
                Err(e) => {
                    error!(roll = %roll, "Caption task failed: {e}");
                    session.abandon_narrative(roll);
                    Err(RollError::TaskFailed(e.to_string()))
                }
            }
        });

        NarrativeTicket { roll, task }
    }

    /// Clear "generating" if the caption for the displayed roll will never come.
    fn abandon_narrative(&self, roll: RollId) {
        let mut table = self.table();
        if table.latest == Some(roll) && table.caption == Caption::Generating {
            table.caption = Caption::Prompt;
        }
    }

    fn apply_narrative(&self, roll: RollId, narrative: Narrative) {
        let mut table = self.table();
        if !table.history.attach_narrative(roll, narrative.clone()) {
            debug!(roll = %roll, "Caption arrived after its roll left the history");
        }
        if table.latest == Some(roll) && !table.rolling {
            table.caption = Caption::Narrative(narrative);
        } else {
            debug!(roll = %roll, "Caption arrived for an older roll, not displaying");
        }
    }

    /// Change how many dice are on the table.
    ///
    /// Counts outside 1-4 and changes during a roll are ignored. Returns
    /// whether the count was applied.
    pub fn set_die_count(&self, count: u8) -> bool {
        let Ok(count) = DieCount::new(count) else {
            return false;
        };
        let mut table = self.table();
        if table.rolling {
            return false;
        }
        table.config.die_count = count;
        table.displayed.resize(count.as_usize(), DieValue::ONE);
        table.tray.resize(count.as_usize());
        true
    }

    pub fn set_ai_enabled(&self, enabled: bool) {
        self.table().config.ai_enabled = enabled;
    }

    /// Stored for the UI; no sound is played.
    pub fn set_sound_enabled(&self, enabled: bool) {
        self.table().config.sound_enabled = enabled;
    }

    pub fn is_rolling(&self) -> bool {
        self.table().rolling
    }

    /// Ask for motion permission and start listening for shakes.
    ///
    /// Already enabled is a no-op; the detector is attached once.
    pub async fn enable_shake(&self) -> Result<(), ShakeError> {
        if self.table().shake.is_some() {
            return Ok(());
        }

        let permission = self.shared.permission.request().await;
        if !permission.allows_motion() {
            warn!("Motion permission denied, shake to roll stays off");
            return Err(ShakeError::PermissionDenied);
        }

        let mut table = self.table();
        if table.shake.is_none() {
            table.shake = Some(ShakeDetector::new());
            info!("Shake to roll enabled");
        }
        Ok(())
    }

    pub fn disable_shake(&self) {
        if self.table().shake.take().is_some() {
            info!("Shake to roll disabled");
        }
    }

    pub fn shake_enabled(&self) -> bool {
        self.table().shake.is_some()
    }

    /// Feed a device-motion event. Starts a roll on a qualifying shake.
    pub fn on_motion(&self, sample: MotionSample) -> Option<RollTicket> {
        {
            let mut table = self.table();
            let rolling = table.rolling;
            let detector = table.shake.as_mut()?;
            if !detector.observe(&sample, Instant::now(), rolling) {
                return None;
            }
        }
        debug!("Shake detected");
        self.trigger()
    }

    pub fn history(&self) -> History {
        self.table().history.clone()
    }

    pub fn caption(&self) -> Caption {
        self.table().caption.clone()
    }

    /// Current table state for rendering.
    pub fn snapshot(&self) -> TableSnapshot {
        let table = self.table();
        TableSnapshot {
            values: table.displayed.clone(),
            total: table.total(),
            rolling: table.rolling,
            caption: table.caption.clone(),
            rotations: table.tray.dice().iter().map(|d| d.rotation()).collect(),
            transitions: table.tray.transitions(),
            history: table.history.iter().cloned().collect(),
            die_count: table.config.die_count,
            ai_enabled: table.config.ai_enabled,
            sound_enabled: table.config.sound_enabled,
            shake_enabled: table.shake.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedPermission, RecordingHaptics, ScriptedDice};
    use crate::platform::{Acceleration, Permission};
    use std::time::Duration;

    fn session_with(draws: &[&[u8]]) -> RollSession {
        RollSession::builder()
            .config(RollConfig::default().with_ai(false))
            .dice(ScriptedDice::new(draws.iter().map(|d| d.to_vec())))
            .animation_seed(1)
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_fixed_at_trigger() {
        let session = session_with(&[&[3, 5]]);
        let ticket = session.trigger().unwrap();
        let drawn: Vec<u8> = ticket.values().iter().map(|v| v.get()).collect();
        assert_eq!(drawn, vec![3, 5]);

        // Still showing the old faces while rolling.
        let snap = session.snapshot();
        assert!(snap.rolling);
        assert_eq!(snap.total, 2);

        let landing = ticket.landed().await.unwrap();
        assert_eq!(landing.result.sum(), 8);
        assert!(landing.narrative.is_none());
        assert_eq!(session.snapshot().total, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentrant_trigger_is_ignored() {
        let session = session_with(&[&[1, 1], &[6, 6]]);
        let ticket = session.trigger().unwrap();
        assert!(session.trigger().is_none());
        assert!(session.trigger().is_none());
        ticket.landed().await.unwrap();

        assert_eq!(session.history().len(), 1);
        // The second scripted draw was never consumed.
        let next = session.trigger().unwrap().landed().await.unwrap();
        assert_eq!(next.result.sum(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_die_count_rules() {
        let session = session_with(&[]);
        assert!(!session.set_die_count(0));
        assert!(!session.set_die_count(5));
        assert_eq!(session.snapshot().values.len(), 2);

        assert!(session.set_die_count(4));
        let snap = session.snapshot();
        assert_eq!(snap.values.len(), 4);
        assert_eq!(snap.rotations.len(), 4);
        assert_eq!(snap.die_count.get(), 4);

        let ticket = session.trigger().unwrap();
        assert!(!session.set_die_count(1));
        assert_eq!(ticket.landed().await.unwrap().result.values().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_haptics_on_start_and_land() {
        let haptics = Arc::new(RecordingHaptics::default());
        let session = RollSession::builder()
            .config(RollConfig::default().with_ai(false))
            .haptics(haptics.clone())
            .build();

        let ticket = session.trigger().unwrap();
        assert_eq!(haptics.pulses(), vec![HapticPattern::roll_start()]);
        ticket.landed().await.unwrap();
        assert_eq!(
            haptics.pulses(),
            vec![HapticPattern::roll_start(), HapticPattern::landing()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shake_permission_denied() {
        let session = RollSession::builder()
            .motion_permission(Arc::new(FixedPermission(Permission::Denied)))
            .build();
        assert_eq!(session.enable_shake().await, Err(ShakeError::PermissionDenied));
        assert!(!session.shake_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_motion_ignored_until_enabled() {
        let session = session_with(&[]);
        let sample = MotionSample::new(Acceleration::new(30.0, 0.0, 0.0));
        assert!(session.on_motion(sample).is_none());

        session.enable_shake().await.unwrap();
        let ticket = session.on_motion(sample).unwrap();
        ticket.landed().await.unwrap();

        session.disable_shake();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(session.on_motion(sample).is_none());
    }

    #[test]
    fn test_trigger_without_runtime_leaves_table_idle() {
        let session = session_with(&[&[6, 6]]);
        assert!(session.trigger().is_none());

        let snap = session.snapshot();
        assert!(!snap.rolling);
        assert_eq!(snap.caption, Caption::Prompt);
        assert!(snap.history.is_empty());
        assert!(snap.transitions.iter().all(|t| t.is_none()));
        // Still usable afterwards.
        assert!(session.set_die_count(3));
    }

    #[test]
    fn test_caption_text() {
        assert_eq!(Caption::Prompt.text(), PROMPT_TEXT);
        assert_eq!(Caption::Generating.text(), GENERATING_TEXT);
    }
}
