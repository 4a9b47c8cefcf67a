//! Prompt text for roll captions.

use crate::dice::{format_values, DieValue};

/// Default voice of the dice spirit.
pub const DEFAULT_TONE: &str = "Animal Crossing / Nintendo / Kawaii";

/// Build the caption prompt for one roll.
///
/// The literal values and total are embedded so the model reacts to this
/// exact roll. "High" means the total beats 4 per die.
pub fn build_prompt(values: &[DieValue], sum: u32, tone: &str) -> String {
    let threshold = values.len() as u32 * 4;
    let verdict = if sum > threshold { "HIGH" } else { "LOW" };

    format!(
        r#"You are a cute, tiny magical spirit living inside the dice.
The player rolled: {rolled}. Total: {sum}.
This roll is {verdict}.

Give a very short, adorable, happy, or funny reaction.
- If the roll is high (Total > {threshold}): Celebrate! Confetti!
- If the roll is low: Offer a hug or a "oopsie!"
- Use emojis!
- Keep it under 20 words.
- Tone: {tone}."#,
        rolled = format_values(values),
    )
}
