//! Navpulse facade crate.
//!
//! Re-exports the core data model and the runtime engine behind a single
//! dependency. Measurement harnesses usually want exactly this surface: a
//! controller over some page channel, a stability config, and the reduced
//! metrics back.

pub use navpulse_core as core;
pub use navpulse_runtime as runtime;

pub use navpulse_core::{
    reduce, DetailedReport, NavigationMetrics, RequestRecord, StabilityConfig, Timeline,
};
pub use navpulse_runtime::{
    ChannelError, MeasureError, MeasurementController, PageChannel, Settlement, StabilityDetector,
};

#[cfg(feature = "cdp")]
pub use navpulse_runtime::CdpChannel;

pub mod prelude {
    pub use navpulse_core::{NavigationMetrics, StabilityConfig, Timeline};
    pub use navpulse_runtime::{MeasureError, MeasurementController, PageChannel};
}
