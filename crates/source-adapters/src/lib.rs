//! Boundary adapters wrapping external providers. Each adapter emits a
//! normalized `Signal` (or `PriceSeries`) and never fails: timeouts, rate
//! limits, and provider errors all become degraded signals so that partial
//! failure is data, not an exception crossing the boundary.

pub mod news;
pub mod price;
pub mod reddit;
pub mod twitter;

pub use news::NewsAdapter;
pub use price::PriceAdapter;
pub use reddit::RedditAdapter;
pub use twitter::TwitterAdapter;

use fusion_core::types::{Signal, SignalSource};

/// Map a failed HTTP round trip to the matching degraded signal.
pub(crate) fn signal_from_transport_error(
    source: SignalSource,
    token: &str,
    err: &reqwest::Error,
) -> Signal {
    if err.is_timeout() {
        tracing::warn!(source = source.as_str(), token, "request timed out");
    } else {
        tracing::warn!(source = source.as_str(), token, error = %err, "request failed");
    }
    Signal::errored(source, token)
}

/// Map a non-success HTTP status to the matching degraded signal.
pub(crate) fn signal_from_status(
    source: SignalSource,
    token: &str,
    status: reqwest::StatusCode,
) -> Signal {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(source = source.as_str(), token, "provider rate limited us");
        Signal::rate_limited(source, token)
    } else {
        tracing::warn!(source = source.as_str(), token, %status, "provider returned error status");
        Signal::errored(source, token)
    }
}
