//! Roll some dice from the terminal.
//!
//! Captions come from Claude when ANTHROPIC_API_KEY is set, otherwise the
//! sleepy placeholder is shown.
//!
//! Run with: `cargo run -p happydice-core --example roll -- 3`

use happydice_core::{DieCount, RollConfig, RollSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let count = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u8>().ok())
        .unwrap_or(2);

    let config = RollConfig::default().with_die_count(DieCount::new(count)?);
    let session = RollSession::from_env(config);

    println!("=== Happy Dice ===\n");
    println!("{}\n", session.caption().text());

    for round in 1..=3 {
        let Some(ticket) = session.trigger() else {
            continue;
        };
        println!("Round {round}: rolling...");

        let landing = ticket.landed().await?;
        println!("  Landed: {}", landing.result);
        for (i, rotation) in session.snapshot().rotations.iter().enumerate() {
            println!("  Die {}: {}", i + 1, rotation.css_transform());
        }

        if let Some(caption) = landing.narrative {
            println!("  {}", session.caption().text());
            println!("  {}\n", caption.resolved().await?);
        }
    }

    println!("Recent luck: {:?}", session.history().sums());
    Ok(())
}
