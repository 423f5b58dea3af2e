use fusion_core::types::{FusedAnalysis, SignalSource, SignalStatus};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Fixed rendering order for the per-token source lines.
const SOURCE_ORDER: [SignalSource; 3] = [
    SignalSource::News,
    SignalSource::Twitter,
    SignalSource::Reddit,
];

fn status_label(status: SignalStatus) -> &'static str {
    match status {
        SignalStatus::Ok => "ok",
        SignalStatus::Degraded => "degraded",
        SignalStatus::NoData => "no_data",
        SignalStatus::RateLimited => "rate_limited",
        SignalStatus::Error => "error",
    }
}

/// Render the fused analyses into the prompt context for the synthesizer.
///
/// The layout is deterministic: tokens in lexicographic order, sources in a
/// fixed order, numbers at fixed precision. Identical analyses always produce
/// an identical context string (and therefore an identical prompt).
pub fn build_context(per_token: &BTreeMap<String, FusedAnalysis>) -> String {
    let mut out = String::new();

    for (token, analysis) in per_token {
        for source in SOURCE_ORDER {
            let line = analysis
                .contributing_signals
                .iter()
                .find(|s| s.source == source);

            match line {
                Some(s) => {
                    let _ = writeln!(
                        out,
                        "{token} {}: status={}, sentiment={:.3}, confidence={:.3}, volume={}",
                        source.as_str(),
                        status_label(s.status),
                        s.sentiment,
                        s.confidence,
                        s.volume,
                    );
                }
                None => {
                    let _ = writeln!(out, "{token} {}: absent", source.as_str());
                }
            }
        }

        let t = &analysis.technical;
        let _ = writeln!(
            out,
            "{token} technical: rsi={:.2}, macd_histogram={:.4}, bollinger_position={:.3}",
            t.rsi, t.macd.histogram, t.bollinger.position,
        );
        let _ = writeln!(
            out,
            "{token} aggregate: sentiment={:.3}, confidence={:.3}",
            analysis.sentiment, analysis.confidence,
        );
        out.push('\n');
    }

    out
}
