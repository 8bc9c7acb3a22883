//! PageChannel - the evaluation seam to the hosting automation layer.
//!
//! The engine needs exactly three capabilities from its host: run a script in
//! the page, have page-global state survive between evaluations, and read
//! JSON-serializable results back. Anything that can do that can drive a
//! measurement. The `cdp` feature provides a chromiumoxide adapter; the
//! `navpulse-test` crate provides an in-memory simulator.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure of the evaluation channel itself: page navigated away or closed,
/// target detached, transport error.
///
/// Never retried by the engine - a torn-down page context makes retrying
/// meaningless. The caller decides whether to re-measure on a fresh page.
#[derive(Debug, Clone, Error)]
#[error("page evaluation channel failed: {message}")]
pub struct ChannelError {
    pub message: String,
}

impl ChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Asynchronous "evaluate code in page context and return its result"
/// primitive.
///
/// The host issues one evaluation at a time per page; the page runtime itself
/// is single-threaded, so no locking is required on either side.
#[async_trait]
pub trait PageChannel: Send + Sync {
    /// Evaluate `script` in the page and return its JSON-serializable result.
    async fn evaluate(&self, script: &str) -> Result<Value, ChannelError>;
}

#[async_trait]
impl<C: PageChannel + ?Sized> PageChannel for &C {
    async fn evaluate(&self, script: &str) -> Result<Value, ChannelError> {
        (**self).evaluate(script).await
    }
}
