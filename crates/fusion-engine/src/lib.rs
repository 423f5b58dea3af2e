//! Per-token signal fusion and batch confidence scoring.
//!
//! Fusion is commutative across signal arrival order: the weighted mean does
//! not depend on how sources are sequenced, and a degraded source is never
//! excluded outright — its pull is bounded by its own (<= 0.1) confidence.

use fusion_core::types::{
    clamp_confidence, clamp_sentiment, FusedAnalysis, Signal, SignalSource, TechnicalIndicatorSet,
};

const BASE_WEIGHT: f64 = 0.7;
const RICHNESS_WEIGHT: f64 = 0.3;

/// Minimum price-history length for the technical signal to count as real
/// data (one RSI window plus the current close).
pub const MIN_TECHNICAL_HISTORY: usize = 15;

/// Fuse one token's signals and indicators into a single analysis.
///
/// `expected_sources` is the number of signals the orchestrator asked for;
/// it anchors the completeness term of the confidence even when some sources
/// never reported.
pub fn fuse(
    token: &str,
    signals: Vec<Signal>,
    technical: TechnicalIndicatorSet,
    expected_sources: usize,
) -> FusedAnalysis {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for signal in &signals {
        // Volume-aware weight: confidence scaled up by (capped) data volume.
        let weight = signal.confidence * (1.0 + signal.source.volume_norm(signal.volume));
        weighted_sum += signal.sentiment * weight;
        weight_total += weight;
    }

    let sentiment = if weight_total > 0.0 {
        clamp_sentiment(weighted_sum / weight_total)
    } else {
        0.0
    };

    let confidence = token_confidence(&signals, expected_sources);

    tracing::debug!(
        token,
        sentiment,
        confidence,
        signals = signals.len(),
        "fused token signals"
    );

    FusedAnalysis {
        token: token.to_uppercase(),
        sentiment,
        confidence,
        contributing_signals: signals,
        technical,
    }
}

/// Confidence for one token: completeness of ok sources blended with a
/// data-richness factor. Falls back to the completeness term alone when no
/// richness is computable.
fn token_confidence(signals: &[Signal], expected_sources: usize) -> f64 {
    if expected_sources == 0 {
        return 0.0;
    }

    let ok_count = signals.iter().filter(|s| s.status.is_ok()).count();
    let base = ok_count as f64 / expected_sources as f64;

    let richness_terms: Vec<f64> = signals
        .iter()
        .filter(|s| s.volume > 0)
        .map(|s| s.source.volume_norm(s.volume))
        .collect();

    let blended = if richness_terms.is_empty() {
        base
    } else {
        let richness = richness_terms.iter().sum::<f64>() / richness_terms.len() as f64;
        BASE_WEIGHT * base + RICHNESS_WEIGHT * richness
    };

    clamp_confidence(blended)
}

/// Derive the `Technical` source signal from the indicator set so price
/// action participates in fusion alongside the text sources.
pub fn technical_signal(
    token: &str,
    indicators: &TechnicalIndicatorSet,
    history_len: usize,
) -> Signal {
    if history_len < MIN_TECHNICAL_HISTORY {
        return Signal::no_data(SignalSource::Technical, token);
    }

    // RSI distance from neutral, Bollinger position, and MACD histogram
    // direction, each mapped into [-1, 1] before blending.
    let rsi_term = (indicators.rsi - 50.0) / 50.0;
    let band_term = indicators.bollinger.position * 2.0 - 1.0;
    let macd_term = indicators.macd.histogram.tanh();

    let sentiment = 0.5 * rsi_term + 0.3 * band_term + 0.2 * macd_term;

    // Deterministic math over real history earns a fixed mid confidence;
    // the richness term rewards longer series up to ~60 bars.
    let confidence = 0.4 + 0.2 * (history_len as f64 / 60.0).min(1.0);

    Signal::ok(
        SignalSource::Technical,
        token,
        sentiment,
        confidence,
        history_len as u64,
    )
}

/// Batch-level Confidence Scorer: one number for the whole report, derived
/// from per-signal health and data richness across every token.
pub fn batch_confidence(analyses: &[FusedAnalysis]) -> f64 {
    let signals: Vec<&Signal> = analyses
        .iter()
        .flat_map(|a| a.contributing_signals.iter())
        .collect();

    if signals.is_empty() {
        return 0.0;
    }

    let ok_count = signals.iter().filter(|s| s.status.is_ok()).count();
    let base = ok_count as f64 / signals.len() as f64;

    let richness_terms: Vec<f64> = signals
        .iter()
        .filter(|s| s.volume > 0)
        .map(|s| s.source.volume_norm(s.volume))
        .collect();

    if richness_terms.is_empty() {
        return clamp_confidence(base);
    }

    let richness = richness_terms.iter().sum::<f64>() / richness_terms.len() as f64;
    clamp_confidence(BASE_WEIGHT * base + RICHNESS_WEIGHT * richness)
}
