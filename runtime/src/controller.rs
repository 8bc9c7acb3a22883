//! MeasurementController - owner of the collection lifecycle.
//!
//! One controller drives one page: inject the probe (once per page lifetime),
//! open a collection session per transition, wait for render settlement,
//! gate collection off, pull the snapshot, and reduce it. The controller
//! takes `&mut self` on every lifecycle operation, so overlapping sessions on
//! a single controller are unrepresentable; measuring the same page from two
//! controllers concurrently is the caller's bug to avoid.

use navpulse_core::{reduce, DetailedReport, NavigationMetrics, StabilityConfig};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::channel::PageChannel;
use crate::error::MeasureError;
use crate::probe;
use crate::stability::StabilityDetector;

pub struct MeasurementController<C: PageChannel> {
    channel: C,
    config: StabilityConfig,
    injected: bool,
    session: Option<Uuid>,
}

impl<C: PageChannel> MeasurementController<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, StabilityConfig::default())
    }

    pub fn with_config(channel: C, config: StabilityConfig) -> Self {
        Self {
            channel,
            config,
            injected: false,
            session: None,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The in-flight session id, if a measurement is open.
    pub fn session(&self) -> Option<Uuid> {
        self.session
    }

    /// Tear the controller apart, returning the channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Ensure the probe is installed. Idempotent: a host-side flag skips the
    /// evaluation entirely, and the probe's own marker check makes even a
    /// redundant evaluation a no-op.
    pub async fn inject(&mut self) -> Result<(), MeasureError> {
        if self.injected {
            return Ok(());
        }
        let fresh = probe::install(&self.channel).await?;
        self.injected = true;
        debug!(fresh, "probe injected");
        Ok(())
    }

    /// Open a collection session for the transition about to happen. An
    /// in-flight session is discarded: the probe reset wipes its timeline.
    pub async fn start_measure(&mut self) -> Result<Uuid, MeasureError> {
        if let Some(stale) = self.session.take() {
            warn!(session = %stale, "discarding in-flight measurement session");
        }
        self.inject().await?;
        let nav_start = match probe::reset(&self.channel).await {
            Ok(nav_start) => nav_start,
            Err(MeasureError::ProbeMissing) => {
                // The document was replaced since injection; a fresh document
                // is a fresh page lifetime.
                debug!("probe marker gone, re-injecting");
                self.injected = false;
                self.inject().await?;
                probe::reset(&self.channel).await?
            }
            Err(err) => return Err(err),
        };
        let session = Uuid::new_v4();
        self.session = Some(session);
        info!(session = %session, nav_start, "measurement started");
        Ok(session)
    }

    /// Wait for settlement with the controller's own config, then close the
    /// session and reduce its timeline.
    pub async fn end_measure(&mut self) -> Result<NavigationMetrics, MeasureError> {
        let config = self.config.clone();
        self.end_measure_with(&config).await
    }

    /// Like [`end_measure`](Self::end_measure) with a per-call stability
    /// config.
    pub async fn end_measure_with(
        &mut self,
        config: &StabilityConfig,
    ) -> Result<NavigationMetrics, MeasureError> {
        let session = self.session.ok_or(MeasureError::NotStarted)?;
        let span = info_span!("end_measure", session = %session);

        async {
            let detector = StabilityDetector::new(config.clone());
            let settled = detector.wait_for_settle(&self.channel).await;

            // Collection must stop before control returns, whatever the
            // detector said; an abandoned collecting probe would bleed into
            // the next session.
            let paused = probe::pause(&self.channel).await;

            let settlement = settled?;
            paused?;

            if !settlement.converged {
                warn!(
                    polls = settlement.polls,
                    "render never converged before the ceiling; treating as stable"
                );
            }

            let timeline = probe::snapshot(&self.channel).await?;
            self.session = None;
            let metrics = reduce(&timeline);
            info!(
                total_time = metrics.total_time,
                requests = metrics.request_count,
                mutations = metrics.mutation_count,
                "measurement complete"
            );
            Ok(metrics)
        }
        .instrument(span)
        .await
    }

    /// [`end_measure`](Self::end_measure) plus the structured report
    /// grouping. Pure presentation on top of the same metrics.
    pub async fn detailed_report(&mut self) -> Result<DetailedReport, MeasureError> {
        let config = self.config.clone();
        self.detailed_report_with(&config).await
    }

    pub async fn detailed_report_with(
        &mut self,
        config: &StabilityConfig,
    ) -> Result<DetailedReport, MeasureError> {
        let session = self.session.ok_or(MeasureError::NotStarted)?;
        let metrics = self.end_measure_with(config).await?;
        Ok(DetailedReport::from_metrics(session, metrics))
    }
}

impl<C: PageChannel> std::fmt::Debug for MeasurementController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementController")
            .field("injected", &self.injected)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
