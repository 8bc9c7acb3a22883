//! Staged-metrics reduction.
//!
//! `reduce` projects one Timeline snapshot into named stage durations. It is
//! total: every combination of unset fields has a defined output, durations
//! are rounded to whole milliseconds and clamped at zero, and no unset
//! sentinel leaks past this boundary. Downstream consumers see a concrete
//! number, with 0 meaning "not measured or instantaneous".

use serde::{Deserialize, Serialize};

use crate::timeline::Timeline;

/// Per-request summary emitted alongside the stage durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub url: String,
    /// Rounded milliseconds; 0 for a call that never settled.
    pub duration: u64,
}

/// Rounded copies of the raw timestamps, for diagnostic display. 0 = unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineTimestamps {
    pub nav_start: u64,
    pub route_resolved: u64,
    pub first_request: u64,
    pub last_response: u64,
    pub dom_updated: u64,
    pub render_complete: u64,
}

/// Derived stage durations for one route transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationMetrics {
    /// Route resolution: `route_resolved - nav_start`.
    pub route_resolve_time: u64,
    /// Component load: first paint signal minus route resolution.
    pub component_load_time: u64,
    /// Network window: `last_response_end - first_request_start`.
    pub data_request_time: u64,
    /// Render tail: `render_complete - dom_updated`.
    pub dom_render_time: u64,
    /// Whole transition: `render_complete - nav_start`.
    pub total_time: u64,
    pub request_count: u64,
    pub mutation_count: u64,
    pub requests: Vec<RequestSummary>,
    pub timestamps: TimelineTimestamps,
}

/// Rounded, clamped difference. 0 unless both endpoints are set.
fn span(end: Option<f64>, start: Option<f64>) -> u64 {
    match (end, start) {
        (Some(end), Some(start)) => round_ms(end - start),
        _ => 0,
    }
}

/// Round to the nearest whole millisecond, clamping negatives to zero first.
fn round_ms(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

fn stamp(value: Option<f64>) -> u64 {
    value.map(round_ms).unwrap_or(0)
}

/// Reduce a raw timeline snapshot into derived metrics.
pub fn reduce(timeline: &Timeline) -> NavigationMetrics {
    // Component load tolerates sparse data: the end falls back from the first
    // mutation to the last one, the start from route resolution to nav start.
    let component_end = timeline.dom_updated.or(timeline.render_complete);
    let component_start = timeline.route_resolved.or(timeline.nav_start);

    NavigationMetrics {
        route_resolve_time: span(timeline.route_resolved, timeline.nav_start),
        component_load_time: span(component_end, component_start),
        data_request_time: span(timeline.last_response_end, timeline.first_request_start),
        dom_render_time: span(timeline.render_complete, timeline.dom_updated),
        total_time: span(timeline.render_complete, timeline.nav_start),
        request_count: timeline.requests.len() as u64,
        mutation_count: timeline.mutation_count,
        requests: timeline
            .requests
            .iter()
            .map(|record| RequestSummary {
                url: record.url.clone(),
                duration: record.duration.map(round_ms).unwrap_or(0),
            })
            .collect(),
        timestamps: TimelineTimestamps {
            nav_start: stamp(timeline.nav_start),
            route_resolved: stamp(timeline.route_resolved),
            first_request: stamp(timeline.first_request_start),
            last_response: stamp(timeline.last_response_end),
            dom_updated: stamp(timeline.dom_updated),
            render_complete: stamp(timeline.render_complete),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::RequestRecord;

    fn full_timeline() -> Timeline {
        Timeline {
            nav_start: Some(0.0),
            route_resolved: Some(50.0),
            first_request_start: Some(60.0),
            last_response_end: Some(300.0),
            dom_updated: Some(310.0),
            render_complete: Some(800.0),
            mutation_count: 12,
            requests: vec![RequestRecord {
                url: "/api/x".to_string(),
                method: "GET".to_string(),
                start_time: 60.0,
                end_time: Some(300.0),
                duration: Some(240.0),
                failed: false,
            }],
            is_collecting: false,
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let metrics = reduce(&full_timeline());

        assert_eq!(metrics.route_resolve_time, 50);
        assert_eq!(metrics.component_load_time, 260);
        assert_eq!(metrics.data_request_time, 240);
        assert_eq!(metrics.dom_render_time, 490);
        assert_eq!(metrics.total_time, 800);
        assert_eq!(metrics.request_count, 1);
        assert_eq!(metrics.mutation_count, 12);
        assert_eq!(
            metrics.requests,
            vec![RequestSummary {
                url: "/api/x".to_string(),
                duration: 240,
            }]
        );
    }

    #[test]
    fn test_missing_network_zeroes_only_data_request_time() {
        let mut timeline = full_timeline();
        timeline.first_request_start = None;
        timeline.last_response_end = None;
        timeline.requests.clear();

        let metrics = reduce(&timeline);
        assert_eq!(metrics.data_request_time, 0);
        assert_eq!(metrics.request_count, 0);
        // Everything else is unaffected.
        assert_eq!(metrics.route_resolve_time, 50);
        assert_eq!(metrics.component_load_time, 260);
        assert_eq!(metrics.dom_render_time, 490);
        assert_eq!(metrics.total_time, 800);
    }

    #[test]
    fn test_all_unset_patterns_stay_non_negative() {
        // Enumerate every set/unset combination of the raw timestamps with
        // synthetic increasing values. Each derived duration must come
        // out bounded by the largest synthetic span, which also proves no
        // negative difference ever wraps through the u64 cast.
        let values = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

        for mask in 0u32..64 {
            let pick = |bit: u32| ((mask & (1 << bit)) != 0).then_some(values[bit as usize]);
            let timeline = Timeline {
                nav_start: pick(0),
                route_resolved: pick(1),
                first_request_start: pick(2),
                last_response_end: pick(3),
                dom_updated: pick(4),
                render_complete: pick(5),
                ..Timeline::default()
            };

            let metrics = reduce(&timeline);
            for duration in [
                metrics.route_resolve_time,
                metrics.component_load_time,
                metrics.data_request_time,
                metrics.dom_render_time,
                metrics.total_time,
            ] {
                assert!(duration <= 50, "mask {mask:#b} produced {duration}");
            }

            // Pairwise-gated fields are zero whenever one side is missing.
            if pick(2).is_none() || pick(3).is_none() {
                assert_eq!(metrics.data_request_time, 0, "mask {mask:#b}");
            }
            if pick(4).is_none() || pick(5).is_none() {
                assert_eq!(metrics.dom_render_time, 0, "mask {mask:#b}");
            }
        }
    }

    #[test]
    fn test_out_of_order_timestamps_clamp_to_zero() {
        // Tolerate an invariant-violating snapshot rather than underflowing.
        let timeline = Timeline {
            nav_start: Some(500.0),
            render_complete: Some(100.0),
            ..Timeline::default()
        };
        assert_eq!(reduce(&timeline).total_time, 0);
    }

    #[test]
    fn test_rounding_is_nearest_whole_millisecond() {
        let timeline = Timeline {
            nav_start: Some(0.0),
            render_complete: Some(99.5),
            dom_updated: Some(0.4),
            ..Timeline::default()
        };
        let metrics = reduce(&timeline);
        assert_eq!(metrics.total_time, 100);
        assert_eq!(metrics.timestamps.dom_updated, 0);
        assert_eq!(metrics.timestamps.render_complete, 100);
    }

    #[test]
    fn test_unsettled_request_summarizes_as_zero() {
        let timeline = Timeline {
            nav_start: Some(0.0),
            requests: vec![RequestRecord {
                url: "/api/slow".to_string(),
                method: "GET".to_string(),
                start_time: 10.0,
                end_time: None,
                duration: None,
                failed: false,
            }],
            ..Timeline::default()
        };
        let metrics = reduce(&timeline);
        assert_eq!(metrics.requests[0].duration, 0);
    }

    #[test]
    fn test_serializes_with_camel_case_wire_keys() {
        let metrics = reduce(&full_timeline());
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.get("routeResolveTime").is_some());
        assert!(json.get("componentLoadTime").is_some());
        assert_eq!(json["timestamps"]["firstRequest"], 60);
        assert_eq!(json["timestamps"]["lastResponse"], 300);
    }
}
