//! Canned captions used when the remote model can't be reached.

use rand::seq::SliceRandom;
use rand::Rng;

/// Fallback pool for offline and failed requests.
pub const OFFLINE_PHRASES: [&str; 6] = [
    "No internet? I'll cheer for you anyway! Yay! 🎉",
    "Offline mode: You are doing great! ✨",
    "The magic clouds are resting, but the dice still roll! 🎲",
    "WiFi is taking a nap, but good luck is awake! 💤",
    "Beep boop! Offline high-five! ✋",
    "Rolling in analog mode... still cute! 🌸",
];

/// Shown when no API key is configured.
pub const SLEEPY_MESSAGE: &str = "Sleepy AI... (Connect API Key to wake up!)";

/// Shown when the model answers with nothing.
pub const MAGIC_FAILED: &str = "Poof! Magic failed!";

/// Pick a phrase from the offline pool.
pub fn offline_phrase<R: Rng>(rng: &mut R) -> &'static str {
    OFFLINE_PHRASES
        .choose(rng)
        .copied()
        .unwrap_or(OFFLINE_PHRASES[0])
}
