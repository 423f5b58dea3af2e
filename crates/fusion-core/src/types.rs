use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    News,
    Twitter,
    Reddit,
    Technical,
}

impl SignalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::News => "news",
            SignalSource::Twitter => "twitter",
            SignalSource::Reddit => "reddit",
            SignalSource::Technical => "technical",
        }
    }

    /// Normalize a raw volume figure to [0, 1]. Each source reports volume in
    /// its own unit (articles, engagement, upvotes), so the saturation point
    /// differs per source.
    pub fn volume_norm(&self, volume: u64) -> f64 {
        let norm = match self {
            SignalSource::News => volume as f64 / 10.0,
            SignalSource::Twitter | SignalSource::Reddit => volume as f64 / 1000.0,
            SignalSource::Technical => {
                if volume > 0 {
                    1.0
                } else {
                    0.0
                }
            }
        };
        norm.min(1.0)
    }
}

/// Health of a signal at emission time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Ok,
    Degraded,
    NoData,
    RateLimited,
    Error,
}

impl SignalStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SignalStatus::Ok)
    }
}

/// Clamp a sentiment value into [-1, 1], mapping NaN to neutral.
pub fn clamp_sentiment(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp a confidence value into [0, 1], mapping NaN to zero.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Maximum confidence a non-ok signal may carry.
pub const DEGRADED_CONFIDENCE_CAP: f64 = 0.1;

/// One source's normalized observation for one token. Immutable once built;
/// the constructors enforce the clamping invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub source: SignalSource,
    pub token: String,
    pub sentiment: f64,
    pub confidence: f64,
    pub volume: u64,
    pub status: SignalStatus,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// A healthy signal with real data behind it.
    pub fn ok(source: SignalSource, token: &str, sentiment: f64, confidence: f64, volume: u64) -> Self {
        Self {
            source,
            token: token.to_uppercase(),
            sentiment: clamp_sentiment(sentiment),
            confidence: clamp_confidence(confidence),
            volume,
            status: SignalStatus::Ok,
            timestamp: Utc::now(),
        }
    }

    /// A signal from a source that responded but with reduced quality.
    pub fn degraded(source: SignalSource, token: &str, sentiment: f64, volume: u64) -> Self {
        Self {
            source,
            token: token.to_uppercase(),
            sentiment: clamp_sentiment(sentiment),
            confidence: DEGRADED_CONFIDENCE_CAP,
            volume,
            status: SignalStatus::Degraded,
            timestamp: Utc::now(),
        }
    }

    /// The source is reachable in principle but had nothing for this token,
    /// or is disabled by configuration.
    pub fn no_data(source: SignalSource, token: &str) -> Self {
        Self::empty(source, token, SignalStatus::NoData)
    }

    /// The source refused us for now.
    pub fn rate_limited(source: SignalSource, token: &str) -> Self {
        Self::empty(source, token, SignalStatus::RateLimited)
    }

    /// The fetch failed outright (transport error, timeout, bad payload).
    pub fn errored(source: SignalSource, token: &str) -> Self {
        Self::empty(source, token, SignalStatus::Error)
    }

    fn empty(source: SignalSource, token: &str, status: SignalStatus) -> Self {
        Self {
            source,
            token: token.to_uppercase(),
            sentiment: 0.0,
            confidence: 0.05,
            volume: 0,
            status,
            timestamp: Utc::now(),
        }
    }
}

/// One OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered (ascending by timestamp) price history. May be short or empty;
/// every consumer must degrade gracefully down to zero bars.
pub type PriceSeries = Vec<PriceBar>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Position of the last close inside the bands, clamped to [0, 1].
    pub position: f64,
}

/// Deterministic technical indicators for one token. The `Default` values
/// stand in whenever history is insufficient or numerically degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicatorSet {
    pub rsi: f64,
    pub macd: MacdValue,
    pub bollinger: BollingerValue,
}

impl Default for TechnicalIndicatorSet {
    fn default() -> Self {
        Self {
            rsi: 50.0,
            macd: MacdValue {
                macd: 0.0,
                signal: 0.0,
                histogram: 0.0,
            },
            bollinger: BollingerValue {
                upper: 0.0,
                middle: 0.0,
                lower: 0.0,
                position: 0.5,
            },
        }
    }
}

/// Fused view of everything we learned about one token in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedAnalysis {
    pub token: String,
    pub sentiment: f64,
    pub confidence: f64,
    pub contributing_signals: Vec<Signal>,
    pub technical: TechnicalIndicatorSet,
}

/// Structured (or defensively wrapped) output of the recommendation
/// synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub analysis: String,
    /// 0-100 scale, as the synthesizer reports it.
    pub confidence_level: u8,
    pub market_sentiment: String,
    /// True when the synthesizer output could not be parsed as structured
    /// data and was wrapped verbatim.
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Complete,
    Timeout,
}

/// Final product of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub per_token: BTreeMap<String, FusedAnalysis>,
    pub overall_confidence: f64,
    pub content_hash: String,
    pub recommendation: Option<Recommendation>,
    pub status: ReportStatus,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_signal_clamps_out_of_range_inputs() {
        let s = Signal::ok(SignalSource::News, "btc", 3.5, -0.2, 12);
        assert_eq!(s.token, "BTC");
        assert_eq!(s.sentiment, 1.0);
        assert_eq!(s.confidence, 0.0);
        assert!(s.status.is_ok());
    }

    #[test]
    fn nan_inputs_become_neutral() {
        let s = Signal::ok(SignalSource::Twitter, "ETH", f64::NAN, f64::NAN, 0);
        assert_eq!(s.sentiment, 0.0);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn degraded_statuses_carry_low_confidence() {
        for s in [
            Signal::no_data(SignalSource::Reddit, "BTC"),
            Signal::rate_limited(SignalSource::Twitter, "BTC"),
            Signal::errored(SignalSource::News, "BTC"),
            Signal::degraded(SignalSource::News, "BTC", 0.4, 3),
        ] {
            assert!(s.confidence <= DEGRADED_CONFIDENCE_CAP);
            assert!(!s.status.is_ok());
        }
    }

    #[test]
    fn default_indicators_are_neutral() {
        let t = TechnicalIndicatorSet::default();
        assert_eq!(t.rsi, 50.0);
        assert_eq!(t.macd.macd, 0.0);
        assert_eq!(t.bollinger.position, 0.5);
    }

    #[test]
    fn volume_norm_caps_at_one() {
        assert_eq!(SignalSource::News.volume_norm(100), 1.0);
        assert_eq!(SignalSource::Twitter.volume_norm(500), 0.5);
        assert_eq!(SignalSource::Technical.volume_norm(0), 0.0);
        assert_eq!(SignalSource::Technical.volume_norm(30), 1.0);
    }
}
