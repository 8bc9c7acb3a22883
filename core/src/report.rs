//! Detailed report - presentation grouping over computed metrics.
//!
//! Pure construction: no new measurement logic lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::{NavigationMetrics, RequestSummary, TimelineTimestamps};

/// Headline totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_time: u64,
    pub request_count: u64,
    pub mutation_count: u64,
}

/// The four derived stage durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBreakdown {
    pub route_resolve: u64,
    pub component_load: u64,
    pub data_request: u64,
    pub dom_render: u64,
}

/// Structured summary of one measured transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    pub session: Uuid,
    pub generated_at: DateTime<Utc>,
    pub overview: Overview,
    pub stages: StageBreakdown,
    pub requests: Vec<RequestSummary>,
    pub timestamps: TimelineTimestamps,
}

impl DetailedReport {
    /// Group one metrics value into report form, stamped now.
    pub fn from_metrics(session: Uuid, metrics: NavigationMetrics) -> Self {
        Self {
            session,
            generated_at: Utc::now(),
            overview: Overview {
                total_time: metrics.total_time,
                request_count: metrics.request_count,
                mutation_count: metrics.mutation_count,
            },
            stages: StageBreakdown {
                route_resolve: metrics.route_resolve_time,
                component_load: metrics.component_load_time,
                data_request: metrics.data_request_time,
                dom_render: metrics.dom_render_time,
            },
            requests: metrics.requests,
            timestamps: metrics.timestamps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce;
    use crate::timeline::Timeline;

    #[test]
    fn test_report_carries_metrics_through_unchanged() {
        let timeline = Timeline {
            nav_start: Some(0.0),
            route_resolved: Some(40.0),
            dom_updated: Some(100.0),
            render_complete: Some(250.0),
            mutation_count: 3,
            ..Timeline::default()
        };
        let metrics = reduce(&timeline);
        let report = DetailedReport::from_metrics(Uuid::new_v4(), metrics.clone());

        assert_eq!(report.overview.total_time, metrics.total_time);
        assert_eq!(report.overview.mutation_count, 3);
        assert_eq!(report.stages.route_resolve, 40);
        assert_eq!(report.stages.dom_render, 150);
        assert_eq!(report.timestamps, metrics.timestamps);
    }
}
