//! Page-side probe and its host-side helpers.
//!
//! The probe is a JavaScript program evaluated once per page lifetime. It
//! leaves a single session object under a well-known global marker and wires
//! three observation points into the page: the outbound network entry points
//! (`fetch` for the promise transport, `XMLHttpRequest` for the callback
//! transport), the programmatic history-navigation entry points plus the
//! back/forward event, and a `MutationObserver` over the document body.
//!
//! Every wrapper is a pass-through decorator: it forwards all arguments and
//! the real outcome (value or thrown failure) to the original implementation
//! and records timing as a side channel, so instrumented behavior is
//! observationally identical to uninstrumented behavior. While
//! `isCollecting` is false the hooks are installed but inert.
//!
//! The host never reaches into page state directly; it speaks the small
//! protocol below (`install` / `reset` / `pause` / `snapshot` / render poll)
//! over a [`PageChannel`].

use navpulse_core::Timeline;
use tracing::trace;

use crate::channel::{ChannelError, PageChannel};
use crate::error::MeasureError;

/// Global marker the probe leaves in the page; its presence makes `install`
/// idempotent across evaluations.
pub const PROBE_MARKER: &str = "__navpulse";

/// The instrumentation program. Returns `true` when it installed fresh hooks,
/// `false` when the marker was already present.
pub const PROBE_SOURCE: &str = r#"
(() => {
  'use strict';
  if (window.__navpulse) {
    return false;
  }

  const blankTimeline = () => ({
    navStart: null,
    routeResolved: null,
    firstRequestStart: null,
    lastResponseEnd: null,
    domUpdated: null,
    renderComplete: null,
    mutationCount: 0,
    requests: [],
    isCollecting: false
  });

  const state = {
    timeline: blankTimeline(),
    reset() {
      this.timeline = blankTimeline();
      this.timeline.navStart = performance.now();
      this.timeline.isCollecting = true;
      return this.timeline.navStart;
    },
    pause() {
      this.timeline.isCollecting = false;
      return true;
    },
    snapshot() {
      return JSON.stringify(this.timeline);
    }
  };

  const now = () => performance.now();

  const settle = (url, method, startTime, failed) => {
    const t = state.timeline;
    if (!t.isCollecting) {
      return;
    }
    const endTime = now();
    t.lastResponseEnd = endTime;
    t.requests.push({
      url: String(url),
      method: String(method),
      startTime: startTime,
      endTime: endTime,
      duration: endTime - startTime,
      failed: failed
    });
  };

  const originalFetch = window.fetch.bind(window);
  window.fetch = (...args) => {
    const t = state.timeline;
    if (!t.isCollecting) {
      return originalFetch(...args);
    }
    const startTime = now();
    if (t.firstRequestStart === null) {
      t.firstRequestStart = startTime;
    }
    const input = args[0];
    const url = input instanceof Request ? input.url : String(input);
    const method =
      (args[1] && args[1].method) ||
      (input instanceof Request && input.method) ||
      'GET';
    return originalFetch(...args).then(
      (response) => {
        settle(url, method, startTime, false);
        return response;
      },
      (err) => {
        settle(url, method, startTime, true);
        throw err;
      }
    );
  };

  const Xhr = window.XMLHttpRequest;
  if (Xhr && Xhr.prototype) {
    const originalOpen = Xhr.prototype.open;
    const originalSend = Xhr.prototype.send;
    Xhr.prototype.open = function (method, url, ...rest) {
      this.__navpulseMeta = {
        method: String(method || 'GET').toUpperCase(),
        url: String(url)
      };
      return originalOpen.call(this, method, url, ...rest);
    };
    Xhr.prototype.send = function (...args) {
      const t = state.timeline;
      if (t.isCollecting && this.__navpulseMeta) {
        const meta = this.__navpulseMeta;
        const startTime = now();
        if (t.firstRequestStart === null) {
          t.firstRequestStart = startTime;
        }
        this.addEventListener('loadend', () => {
          settle(meta.url, meta.method, startTime, this.status === 0);
        });
      }
      return originalSend.apply(this, args);
    };
  }

  const markRoute = () => {
    const t = state.timeline;
    if (!t.isCollecting) {
      return;
    }
    if (t.routeResolved === null) {
      t.routeResolved = now();
    }
  };
  const originalPushState = history.pushState.bind(history);
  history.pushState = (...args) => {
    const result = originalPushState(...args);
    markRoute();
    return result;
  };
  const originalReplaceState = history.replaceState.bind(history);
  history.replaceState = (...args) => {
    const result = originalReplaceState(...args);
    markRoute();
    return result;
  };
  window.addEventListener('popstate', markRoute);

  const markMutations = (records) => {
    const t = state.timeline;
    if (!t.isCollecting || records.length === 0) {
      return;
    }
    const timestamp = now();
    if (t.domUpdated === null) {
      t.domUpdated = timestamp;
    }
    t.renderComplete = timestamp;
    t.mutationCount += records.length;
  };
  const observeBody = () => {
    const target = document.body || document.documentElement;
    if (!target) {
      return;
    }
    new MutationObserver(markMutations).observe(target, {
      childList: true,
      subtree: true,
      attributes: true,
      characterData: true
    });
  };
  if (document.body) {
    observeBody();
  } else {
    window.addEventListener('DOMContentLoaded', observeBody, { once: true });
  }

  window.__navpulse = state;
  return true;
})()
"#;

/// Start a fresh collection session; returns the new `navStart`.
pub const RESET_CALL: &str =
    "(() => { const s = window.__navpulse; return s ? s.reset() : null; })()";

/// Stop collecting; hooks stay installed for the page lifetime.
pub const PAUSE_CALL: &str =
    "(() => { const s = window.__navpulse; return s ? s.pause() : null; })()";

/// Deep, serialization-safe copy of the live timeline. Travels as a JSON
/// string because evaluation channels only reliably carry primitives by
/// value.
pub const SNAPSHOT_CALL: &str =
    "(() => { const s = window.__navpulse; return s ? s.snapshot() : null; })()";

/// Cheap stability poll: the latest `renderComplete`, or 0 when unset.
pub const RENDER_COMPLETE_POLL: &str =
    "(() => { const s = window.__navpulse; return (s && s.timeline.renderComplete) || 0; })()";

/// Evaluate the probe program. Returns `true` when hooks were installed by
/// this call, `false` when the page already carried them.
pub async fn install<C>(channel: &C) -> Result<bool, ChannelError>
where
    C: PageChannel + ?Sized,
{
    let value = channel.evaluate(PROBE_SOURCE).await?;
    let fresh = value.as_bool().unwrap_or(false);
    trace!(fresh, "probe install evaluated");
    Ok(fresh)
}

/// Reset the timeline and open a new collection session.
pub async fn reset<C>(channel: &C) -> Result<f64, MeasureError>
where
    C: PageChannel + ?Sized,
{
    let value = channel.evaluate(RESET_CALL).await?;
    value.as_f64().ok_or(MeasureError::ProbeMissing)
}

/// Gate all hooks off. Installation itself is never undone.
pub async fn pause<C>(channel: &C) -> Result<(), MeasureError>
where
    C: PageChannel + ?Sized,
{
    let value = channel.evaluate(PAUSE_CALL).await?;
    if value.as_bool() == Some(true) {
        Ok(())
    } else {
        Err(MeasureError::ProbeMissing)
    }
}

/// Pull a decoupled timeline snapshot out of the page.
pub async fn snapshot<C>(channel: &C) -> Result<Timeline, MeasureError>
where
    C: PageChannel + ?Sized,
{
    let value = channel.evaluate(SNAPSHOT_CALL).await?;
    match value {
        serde_json::Value::Null => Err(MeasureError::ProbeMissing),
        serde_json::Value::String(raw) => Ok(serde_json::from_str(&raw)?),
        // A channel that already materialized the object is fine too.
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Read the stability signal. A page without the probe, or without any
/// observed mutation, reads as 0.
pub async fn render_complete<C>(channel: &C) -> Result<f64, ChannelError>
where
    C: PageChannel + ?Sized,
{
    let value = channel.evaluate(RENDER_COMPLETE_POLL).await?;
    Ok(value.as_f64().unwrap_or(0.0))
}
