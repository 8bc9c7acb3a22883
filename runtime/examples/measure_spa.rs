//! Measure one route transition on a live page over CDP.
//!
//! ```sh
//! cargo run -p navpulse-runtime --features cdp --example measure_spa -- https://example.com
//! ```

use anyhow::Result;
use navpulse_core::StabilityConfig;
use navpulse_runtime::{CdpChannel, MeasurementController, PageChannel};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    let (browser, channel) = CdpChannel::launch(&url).await?;

    let config = StabilityConfig {
        // Bound the wait so a static page cannot stall the demo.
        max_wait_ms: Some(10_000),
        ..StabilityConfig::default()
    };
    let mut controller = MeasurementController::with_config(channel, config);

    controller.start_measure().await?;

    // Stand-in for a real route transition; a harness would click a link or
    // call the app router here.
    controller
        .channel()
        .evaluate(
            "history.pushState({}, '', '/demo'); \
             document.body.appendChild(document.createElement('div')); true",
        )
        .await?;

    let report = controller.detailed_report().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    drop(browser);
    Ok(())
}
