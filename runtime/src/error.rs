//! Error taxonomy for the measurement lifecycle.

use thiserror::Error;

use crate::channel::ChannelError;

/// Errors surfaced by [`MeasurementController`](crate::MeasurementController).
///
/// Partial timeline data is deliberately NOT in this taxonomy: stages that
/// never happened reduce to 0, because a purely client-rendered transition
/// with no network traffic is a valid measurement, not a failure.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// `end_measure` was called without a prior `start_measure`. Reported as
    /// an error rather than a zeroed result - silent zeros would mask a
    /// caller bug.
    #[error("no active measurement session; call start_measure() first")]
    NotStarted,

    /// The evaluation channel to the page failed. Not retried.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The timeline snapshot did not match the probe wire shape.
    #[error("malformed timeline snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The probe marker is gone - the document was replaced since injection.
    #[error("probe is not installed in the current document")]
    ProbeMissing,
}
