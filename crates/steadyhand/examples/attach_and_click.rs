//! Attach Example
//!
//! Attaches to a Chromium started with a debugging port and performs a few
//! resilient interactions on the current tab.
//!
//! # Running
//!
//! ```bash
//! chromium --remote-debugging-port=9222 https://example.com &
//! cargo run --example attach_and_click -p steadyhand --features browser -- 127.0.0.1:9222
//! ```

use std::sync::Arc;
use steadyhand::logging::{self, LogFormat};
use steadyhand::prelude::*;

#[tokio::main]
async fn main() -> SteadyResult<()> {
    logging::init(1, LogFormat::Pretty);

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DEBUGGER_ADDRESS.to_string());
    let session = Arc::new(CdpSession::attach(&address).await?);
    let mut engine = InteractionEngine::new(session)
        .await?
        .with_sink(Arc::new(TracingSink));

    let heading = engine.text_of("h1").await?;
    println!("Heading: {heading}");

    engine.highlight("//a").await;
    match engine.click("//a").await? {
        ClickOutcome::Clicked { index } => println!("Clicked link #{index}"),
        ClickOutcome::TimedOut { elapsed } => println!("No clickable link after {elapsed:?}"),
    }

    let path = engine.save_screenshot("target/steadyhand-reports/attach.png").await?;
    println!("Screenshot: {}", path.display());
    Ok(())
}
