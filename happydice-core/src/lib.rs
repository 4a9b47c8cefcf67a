//! Dice table engine with AI roll captions.
//!
//! This crate provides:
//! - Fair six-sided dice, one to four per roll
//! - Forward-only 3D spin and landing animation math
//! - One-line captions from Claude, with offline fallbacks
//! - A bounded recent-rolls history and shake-to-roll detection
//!
//! # Quick Start
//!
//! ```ignore
//! use happydice_core::{RollConfig, RollSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = RollSession::from_env(RollConfig::default());
//!
//!     if let Some(ticket) = session.trigger() {
//!         let landing = ticket.landed().await?;
//!         println!("Rolled {}", landing.result);
//!
//!         if let Some(caption) = landing.narrative {
//!             println!("{}", caption.resolved().await?);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod animation;
pub mod config;
pub mod dice;
pub mod history;
pub mod narrative;
pub mod platform;
pub mod session;
pub mod shake;
pub mod testing;

// Primary public API
pub use config::{NarrativeConfig, RollConfig};
pub use dice::{DieCount, DieValue, RollOutcome};
pub use history::{History, RollId, RollResult};
pub use narrative::{Narrative, NarrativeService, NarrativeSource};
pub use session::{
    Caption, Landing, NarrativeTicket, RollError, RollSession, RollTicket, ShakeError,
    TableSnapshot,
};
pub use testing::{FixedConnectivity, RecordingHaptics, ScriptedDice, ScriptedProvider};
