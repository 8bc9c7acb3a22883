//! Stability detection tuning.

use serde::{Deserialize, Serialize};

/// Tuning for the render-settlement poll loop.
///
/// The window and interval are configuration, not magic constants: both are
/// overridable per `end_measure` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StabilityConfig {
    /// How long `render_complete` must stay unchanged to count as settled.
    pub stable_window_ms: u64,
    /// Delay between consecutive polls.
    pub poll_interval_ms: u64,
    /// Hard ceiling on the total wait. `None` leaves the loop unbounded and
    /// the deadline to the caller; `Some` turns ceiling expiry into a
    /// degenerate stable state instead of an endless poll on a page that
    /// never mutates.
    pub max_wait_ms: Option<u64>,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            stable_window_ms: 1000,
            poll_interval_ms: 200,
            max_wait_ms: None,
        }
    }
}

impl StabilityConfig {
    /// Consecutive unchanged polls required for convergence:
    /// `ceil(stable_window / poll_interval)`, at least 1.
    pub fn required_matches(&self) -> u32 {
        self.stable_window_ms
            .div_ceil(self.poll_interval_ms.max(1))
            .max(1) as u32
    }

    /// Poll budget implied by `max_wait_ms`, if any.
    pub fn poll_budget(&self) -> Option<u32> {
        self.max_wait_ms
            .map(|ms| ms.div_ceil(self.poll_interval_ms.max(1)).max(1) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StabilityConfig::default();
        assert_eq!(config.stable_window_ms, 1000);
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.max_wait_ms, None);
        assert_eq!(config.required_matches(), 5);
        assert_eq!(config.poll_budget(), None);
    }

    #[test]
    fn test_required_matches_rounds_up() {
        let config = StabilityConfig {
            stable_window_ms: 1000,
            poll_interval_ms: 300,
            max_wait_ms: None,
        };
        assert_eq!(config.required_matches(), 4);
    }

    #[test]
    fn test_degenerate_intervals_are_floored() {
        let config = StabilityConfig {
            stable_window_ms: 0,
            poll_interval_ms: 0,
            max_wait_ms: Some(0),
        };
        assert_eq!(config.required_matches(), 1);
        assert_eq!(config.poll_budget(), Some(1));
    }
}
