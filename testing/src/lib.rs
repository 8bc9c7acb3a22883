//! Test doubles for the Navpulse engine.
//!
//! [`FakePage`] stands in for a real page runtime: it implements
//! [`PageChannel`] by dispatching on the exact scripts the probe helpers
//! issue, and re-implements the probe's recording semantics (first-wins route
//! resolution, first/last request bounds, the `isCollecting` gate) so
//! host-side tests can simulate navigations, network traffic and DOM
//! mutations deterministically against a fake monotonic clock.

use std::sync::Arc;

use async_trait::async_trait;
use navpulse_core::{RequestRecord, Timeline};
use navpulse_runtime::channel::{ChannelError, PageChannel};
use navpulse_runtime::probe;
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Default)]
struct PageState {
    installed: bool,
    install_evaluations: u32,
    clock: f64,
    timeline: Timeline,
    fail_next: Option<String>,
}

/// In-memory page runtime. Clones share one page, the way multiple
/// controllers can share one real browser tab.
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the fake `performance.now()` clock.
    pub fn tick(&self, ms: f64) {
        self.state.lock().clock += ms;
    }

    pub fn now(&self) -> f64 {
        self.state.lock().clock
    }

    /// Fail the next evaluation, simulating a page that navigated away or
    /// closed mid-measurement.
    pub fn fail_next(&self, message: &str) {
        self.state.lock().fail_next = Some(message.to_string());
    }

    /// How many times the install program was evaluated (idempotence is
    /// visible here: extra evaluations must not re-install hooks).
    pub fn install_evaluations(&self) -> u32 {
        self.state.lock().install_evaluations
    }

    /// Direct peek at the live timeline, bypassing the probe protocol.
    pub fn timeline(&self) -> Timeline {
        self.state.lock().timeline.clone()
    }

    /// Simulate a history-navigation event (pushState / replaceState /
    /// popstate). First one per session wins.
    pub fn fire_navigation(&self) {
        let mut state = self.state.lock();
        if !state.timeline.is_collecting {
            return;
        }
        let timestamp = state.clock;
        if state.timeline.route_resolved.is_none() {
            state.timeline.route_resolved = Some(timestamp);
        }
    }

    /// Simulate one settled network interaction issued now; the clock
    /// advances by `duration_ms` to the settlement instant.
    pub fn fire_request(&self, url: &str, method: &str, duration_ms: f64, failed: bool) {
        let mut state = self.state.lock();
        if !state.timeline.is_collecting {
            return;
        }
        let start_time = state.clock;
        let end_time = start_time + duration_ms;
        state.clock = end_time;
        if state.timeline.first_request_start.is_none() {
            state.timeline.first_request_start = Some(start_time);
        }
        state.timeline.last_response_end = Some(end_time);
        state.timeline.requests.push(RequestRecord {
            url: url.to_string(),
            method: method.to_string(),
            start_time,
            end_time: Some(end_time),
            duration: Some(duration_ms),
            failed,
        });
    }

    /// Simulate a hard navigation to a fresh document: the probe marker and
    /// all page state vanish.
    pub fn navigate_away(&self) {
        let mut state = self.state.lock();
        state.installed = false;
        state.timeline = Timeline::default();
    }

    /// Simulate a DOM mutation batch of `count` records.
    pub fn fire_mutations(&self, count: u64) {
        let mut state = self.state.lock();
        if !state.timeline.is_collecting || count == 0 {
            return;
        }
        let timestamp = state.clock;
        if state.timeline.dom_updated.is_none() {
            state.timeline.dom_updated = Some(timestamp);
        }
        state.timeline.render_complete = Some(timestamp);
        state.timeline.mutation_count += count;
    }
}

#[async_trait]
impl PageChannel for FakePage {
    async fn evaluate(&self, script: &str) -> Result<Value, ChannelError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next.take() {
            return Err(ChannelError::new(message));
        }

        if script == probe::PROBE_SOURCE {
            state.install_evaluations += 1;
            if state.installed {
                return Ok(json!(false));
            }
            state.installed = true;
            return Ok(json!(true));
        }
        if !state.installed {
            // Without the probe the protocol calls all null-check the marker.
            return Ok(Value::Null);
        }
        if script == probe::RESET_CALL {
            let nav_start = state.clock;
            state.timeline = Timeline::started_at(nav_start);
            return Ok(json!(nav_start));
        }
        if script == probe::PAUSE_CALL {
            state.timeline.is_collecting = false;
            return Ok(json!(true));
        }
        if script == probe::SNAPSHOT_CALL {
            // The real probe stringifies the timeline; mirror that so the
            // host exercises the same decode path.
            return serde_json::to_string(&state.timeline)
                .map(Value::String)
                .map_err(|err| ChannelError::new(err.to_string()));
        }
        if script == probe::RENDER_COMPLETE_POLL {
            return Ok(json!(state.timeline.render_complete.unwrap_or(0.0)));
        }
        // Unknown script: behave like a page returning undefined.
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_speaks_the_probe_protocol() {
        let page = FakePage::new();

        assert_eq!(page.evaluate(probe::PROBE_SOURCE).await.unwrap(), json!(true));
        assert_eq!(page.evaluate(probe::PROBE_SOURCE).await.unwrap(), json!(false));
        assert_eq!(page.install_evaluations(), 2);

        page.tick(5.0);
        assert_eq!(page.evaluate(probe::RESET_CALL).await.unwrap(), json!(5.0));

        page.tick(10.0);
        page.fire_mutations(2);
        assert_eq!(
            page.evaluate(probe::RENDER_COMPLETE_POLL).await.unwrap(),
            json!(15.0)
        );

        assert_eq!(page.evaluate(probe::PAUSE_CALL).await.unwrap(), json!(true));
        let raw = page.evaluate(probe::SNAPSHOT_CALL).await.unwrap();
        let snapshot: Timeline = serde_json::from_str(raw.as_str().unwrap()).unwrap();
        assert_eq!(snapshot.nav_start, Some(5.0));
        assert_eq!(snapshot.mutation_count, 2);
        assert!(!snapshot.is_collecting);
    }

    #[tokio::test]
    async fn test_protocol_calls_before_install_read_as_null() {
        let page = FakePage::new();
        assert_eq!(page.evaluate(probe::RESET_CALL).await.unwrap(), Value::Null);
        assert_eq!(page.evaluate(probe::SNAPSHOT_CALL).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_hooks_are_inert_while_not_collecting() {
        let page = FakePage::new();
        page.evaluate(probe::PROBE_SOURCE).await.unwrap();

        // No session open: nothing may record.
        page.fire_navigation();
        page.fire_request("/api/x", "GET", 10.0, false);
        page.fire_mutations(1);

        let timeline = page.timeline();
        assert_eq!(timeline.route_resolved, None);
        assert!(timeline.requests.is_empty());
        assert_eq!(timeline.mutation_count, 0);
    }

    #[tokio::test]
    async fn test_injected_failure_surfaces_once() {
        let page = FakePage::new();
        page.fail_next("target closed");
        assert!(page.evaluate(probe::PROBE_SOURCE).await.is_err());
        assert!(page.evaluate(probe::PROBE_SOURCE).await.is_ok());
    }
}
