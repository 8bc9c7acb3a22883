//! Navpulse runtime - the host-side measurement engine.
//!
//! Drives a page-side probe over an asynchronous "evaluate in page context"
//! channel: inject, start a collection session, poll for render settlement,
//! stop, pull the timeline snapshot, and reduce it to staged metrics.
//!
//! The engine owns no browser. Anything that can evaluate a script in a page
//! and hand JSON back implements [`PageChannel`]; the optional `cdp` feature
//! ships a chromiumoxide adapter.

pub mod channel;
pub mod controller;
pub mod error;
pub mod probe;
pub mod stability;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use channel::{ChannelError, PageChannel};
pub use controller::MeasurementController;
pub use error::MeasureError;
pub use stability::{Settlement, StabilityDetector};

#[cfg(feature = "cdp")]
pub use cdp::CdpChannel;
