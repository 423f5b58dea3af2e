use crate::types::{Signal, SignalSource};
use async_trait::async_trait;
use std::time::Duration;

/// Boundary between one external provider and the fusion core.
///
/// `fetch` is total: timeouts, rate limits, and provider errors are all
/// expressed as a `Signal` with the matching status and confidence <= 0.1,
/// never as an error crossing this boundary.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> SignalSource;

    async fn fetch(&self, token: &str, timeout: Duration) -> Signal;
}
