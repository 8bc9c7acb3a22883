//! Timeline - Raw event record of one route transition.
//!
//! The page-side probe owns exactly one Timeline while collecting and hands a
//! serialized snapshot to the host at stop time. Field names follow the
//! probe's own JSON shape (camelCase on the wire).
//!
//! All timestamps are monotonic milliseconds from the page clock
//! (`performance.now()`), with an epoch fixed at probe installation. `None`
//! means "unset": the stage never happened during this session. A set
//! timestamp is always >= `nav_start`.

use serde::{Deserialize, Serialize};

/// One observed network interaction, completed or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub url: String,
    pub method: String,
    /// Instant the call was issued.
    pub start_time: f64,
    /// Instant the call settled; `None` while still in flight.
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    /// The transport reported a failure. Application-level success
    /// classification is a sibling concern and is not recorded here.
    #[serde(default)]
    pub failed: bool,
}

/// Raw timeline of a single collection session.
///
/// Reset to all-unset at every session start; no state leaks across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timeline {
    /// Stamped once, when the session starts.
    pub nav_start: Option<f64>,
    /// First history-navigation event after `nav_start` (first-wins).
    pub route_resolved: Option<f64>,
    /// Issue instant of the first network call observed while collecting.
    pub first_request_start: Option<f64>,
    /// Settlement instant of the most recent network call.
    pub last_response_end: Option<f64>,
    /// First observed DOM mutation after `nav_start`.
    pub dom_updated: Option<f64>,
    /// Most recent observed DOM mutation (latest wins); doubles as the
    /// stability signal polled by the host.
    pub render_complete: Option<f64>,
    /// Total DOM mutation records observed; never decreases within a session.
    pub mutation_count: u64,
    /// Append-only while collecting.
    pub requests: Vec<RequestRecord>,
    /// While false, every instrumentation hook is a no-op.
    pub is_collecting: bool,
}

impl Timeline {
    /// A fresh session record with only `nav_start` stamped.
    pub fn started_at(nav_start: f64) -> Self {
        Self {
            nav_start: Some(nav_start),
            is_collecting: true,
            ..Self::default()
        }
    }
}
