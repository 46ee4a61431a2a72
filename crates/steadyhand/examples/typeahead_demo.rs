//! Typeahead Example
//!
//! Drives a debounced autocomplete on a scripted page: typing one key at a
//! time, probing the suggestion list, and selecting the exact match.
//!
//! # Running
//!
//! ```bash
//! cargo run --example typeahead_demo -p steadyhand
//! ```

use std::sync::Arc;
use std::time::Duration;
use steadyhand::logging::{self, LogFormat};
use steadyhand::prelude::*;

const CITIES: [&str; 5] = ["Paris", "Parma", "Partizansk", "Pamplona", "Palermo"];

#[tokio::main]
async fn main() -> SteadyResult<()> {
    logging::init(1, LogFormat::Pretty);
    println!("=== Steadyhand Typeahead Example ===\n");

    let driver = Arc::new(MockDriver::new());
    let input = driver.add("#destination", MockElement::input());
    driver.add_suggestions("ul.cities li", &input, |typed| {
        CITIES
            .iter()
            .filter(|c| c.to_lowercase().starts_with(&typed.to_lowercase()))
            .map(|c| (*c).to_string())
            .collect()
    });
    let sink = Arc::new(MemorySink::new());

    let mut engine = InteractionEngine::new(Arc::clone(&driver))
        .await?
        .with_policy(RetryPolicy::new(Duration::from_secs(5), Duration::from_millis(250))?)
        .with_sink(sink.clone());

    let outcome = engine
        .type_and_select(
            "#destination",
            "Parma",
            "ul.cities li",
            DEFAULT_SETTLE_DELAY,
            MatchMode::MatchAll,
        )
        .await?;
    println!("1. MatchAll outcome: {outcome:?}");
    println!("   field value: {}", driver.value_of(&input));

    let outcome = engine
        .type_and_select("#destination", "Pam", "ul.cities li", Duration::ZERO, MatchMode::FirstVisible)
        .await?;
    println!("2. FirstVisible outcome: {outcome:?}");
    println!("   field value: {}", driver.value_of(&input));

    println!("\n3. Interaction log:");
    println!("{}", sink.to_json()?);

    println!("\n=== Typeahead Example Complete ===");
    Ok(())
}
