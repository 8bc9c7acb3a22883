//! Render-settlement detection.
//!
//! SPAs emit no "rendering finished" event, so settlement is decided by
//! convergence: poll the probe's `renderComplete` timestamp at a fixed
//! interval until it has been unchanged for a configured window. The poll
//! sleep is the engine's only suspending primitive - the loop yields the host
//! task between checks rather than busy-waiting.

use std::future::Future;
use std::time::Duration;

use navpulse_core::StabilityConfig;
use tracing::debug;

use crate::channel::{ChannelError, PageChannel};
use crate::probe;

/// Outcome of one settlement wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// False only when a poll ceiling expired first; the caller treats that
    /// as a degenerate stable state.
    pub converged: bool,
    /// Total polls issued.
    pub polls: u32,
    /// Last `renderComplete` reading; 0 when no mutation was ever observed.
    pub last_value: f64,
}

/// Polls the probe until rendering has settled.
pub struct StabilityDetector {
    config: StabilityConfig,
}

impl StabilityDetector {
    pub fn new(config: StabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// Wait until the page's render signal converges.
    pub async fn wait_for_settle<C>(&self, channel: &C) -> Result<Settlement, ChannelError>
    where
        C: PageChannel + ?Sized,
    {
        self.settle_with(|| probe::render_complete(channel)).await
    }

    /// The convergence loop, generic over its sampler so tests can drive it
    /// without a page.
    ///
    /// A reading equal to the previous one AND non-zero extends the current
    /// match run; anything else restarts it. Zero means "no mutation ever
    /// observed" and never counts toward stability - without a ceiling the
    /// loop keeps polling and the caller's deadline is the only way out.
    pub async fn settle_with<F, Fut>(&self, mut sample: F) -> Result<Settlement, ChannelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<f64, ChannelError>>,
    {
        let required = self.config.required_matches();
        let budget = self.config.poll_budget();
        let interval = Duration::from_millis(self.config.poll_interval_ms.max(1));

        let mut previous: Option<f64> = None;
        let mut matches: u32 = 0;
        let mut polls: u32 = 0;

        loop {
            let current = sample().await?;
            polls += 1;

            if current != 0.0 && previous == Some(current) {
                matches += 1;
                if matches >= required {
                    debug!(polls, value = current, "render settled");
                    return Ok(Settlement {
                        converged: true,
                        polls,
                        last_value: current,
                    });
                }
            } else {
                matches = 0;
                previous = Some(current);
            }

            if let Some(budget) = budget {
                if polls >= budget {
                    debug!(polls, value = current, "poll ceiling reached before convergence");
                    return Ok(Settlement {
                        converged: false,
                        polls,
                        last_value: current,
                    });
                }
            }

            tokio::time::sleep(interval).await;
        }
    }
}
