//! Fan-out orchestration: run every source adapter for every token
//! concurrently under one global deadline, fuse whatever arrived, synthesize
//! a recommendation, and stamp the report with a canonical content hash.
//!
//! A run is never failed by slow or broken sources. The only hard errors are
//! configuration problems detected before fan-out begins.

pub mod cache;
pub mod context;
pub mod hash;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fusion_core::types::{
    AnalysisReport, FusedAnalysis, PriceSeries, Recommendation, ReportStatus, Signal,
    SignalSource,
};
use fusion_core::{EngineError, SourceAdapter};
use serde::Serialize;
use source_adapters::PriceAdapter;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use synth_client::SynthClient;

use cache::ReportCache;

/// Overall confidence reported when the deadline expired before a single
/// source fetch finished.
const TIMEOUT_FLOOR_CONFIDENCE: f64 = 0.3;

/// Lifecycle of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Collecting,
    Complete,
    TimedOut,
    Fused,
    Aborted,
}

/// Everything the fan-out tasks wrote before the deadline.
#[derive(Default)]
struct Collected {
    signals: DashMap<(String, SignalSource), Signal>,
    series: DashMap<String, PriceSeries>,
}

/// The hashed portion of a report: every field except the hash itself.
#[derive(Serialize)]
struct ReportBody<'a> {
    per_token: &'a BTreeMap<String, FusedAnalysis>,
    overall_confidence: f64,
    recommendation: &'a Option<Recommendation>,
    status: ReportStatus,
    timestamp: DateTime<Utc>,
}

pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    price: Arc<PriceAdapter>,
    synth: Option<SynthClient>,
    cache: ReportCache,
}

impl Orchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        price: Arc<PriceAdapter>,
        synth: Option<SynthClient>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            adapters,
            price,
            synth,
            cache: ReportCache::new(cache_ttl),
        }
    }

    /// Run one analysis over `tokens` with a single global `deadline`
    /// covering the whole collection phase.
    pub async fn run(
        &self,
        tokens: &[String],
        deadline: Duration,
    ) -> Result<AnalysisReport, EngineError> {
        let mut state = RunState::Pending;
        tracing::debug!(state = ?state, "run created");

        if self.adapters.is_empty() {
            state = RunState::Aborted;
            tracing::error!(state = ?state, "no source adapters configured");
            return Err(EngineError::Configuration(
                "no source adapters configured".to_string(),
            ));
        }
        if tokens.is_empty() {
            state = RunState::Aborted;
            tracing::error!(state = ?state, "no tokens requested");
            return Err(EngineError::Configuration("no tokens requested".to_string()));
        }

        let tokens = normalize_tokens(tokens);
        let cache_key = ReportCache::key(&tokens);
        if let Some(report) = self.cache.get(&cache_key) {
            tracing::info!(key = %cache_key, "serving cached report");
            return Ok(report);
        }

        state = RunState::Collecting;
        tracing::info!(state = ?state, tokens = ?tokens, ?deadline, "collection started");

        let (collected, timed_out) = self.collect(&tokens, deadline).await;
        let completed_fetches = collected.signals.len();

        state = if timed_out {
            RunState::TimedOut
        } else {
            RunState::Complete
        };
        if timed_out {
            tracing::warn!(state = ?state, completed_fetches, "deadline expired, fusing partial results");
        } else {
            tracing::info!(state = ?state, completed_fetches, "collection finished");
        }

        let per_token = self.assemble(&tokens, &collected);
        let analyses: Vec<FusedAnalysis> = per_token.values().cloned().collect();
        let fused_confidence = fusion_engine::batch_confidence(&analyses);
        state = RunState::Fused;
        tracing::info!(state = ?state, fused_confidence, "fusion finished");

        let recommendation = self.synthesize(&per_token).await;

        let mut overall_confidence = match &recommendation {
            Some(rec) => (fused_confidence + f64::from(rec.confidence_level) / 100.0) / 2.0,
            None => fused_confidence,
        };
        if timed_out && completed_fetches == 0 {
            overall_confidence = TIMEOUT_FLOOR_CONFIDENCE;
        }

        let status = if timed_out {
            ReportStatus::Timeout
        } else {
            ReportStatus::Complete
        };
        let timestamp = Utc::now();

        let content_hash = hash::content_hash(&ReportBody {
            per_token: &per_token,
            overall_confidence,
            recommendation: &recommendation,
            status,
            timestamp,
        });

        let report = AnalysisReport {
            per_token,
            overall_confidence,
            content_hash,
            recommendation,
            status,
            timestamp,
        };

        // Only complete reports are worth the full TTL; a timed-out report
        // reflects a transient outage and the next request should retry.
        if report.status == ReportStatus::Complete {
            self.cache.put(cache_key, report.clone());
        }
        Ok(report)
    }

    /// Spawn one task per (token, adapter) pair plus one price fetch per
    /// token, then wait for all of them under the global deadline. Tasks
    /// write into a shared map, so whatever finished before the deadline is
    /// kept even when the run as a whole times out.
    async fn collect(&self, tokens: &[String], deadline: Duration) -> (Arc<Collected>, bool) {
        let collected = Arc::new(Collected::default());
        let mut handles = Vec::with_capacity(tokens.len() * (self.adapters.len() + 1));

        for token in tokens {
            for adapter in &self.adapters {
                let adapter = Arc::clone(adapter);
                let collected = Arc::clone(&collected);
                let token = token.clone();
                handles.push(tokio::spawn(async move {
                    let signal = adapter.fetch(&token, deadline).await;
                    collected.signals.insert((token, adapter.source()), signal);
                }));
            }

            let price = Arc::clone(&self.price);
            let collected = Arc::clone(&collected);
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                let series = price.fetch_series(&token, deadline).await;
                if !series.is_empty() {
                    collected.series.insert(token, series);
                }
            }));
        }

        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let join_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        match tokio::time::timeout(deadline, join_all).await {
            Ok(()) => (collected, false),
            Err(_) => {
                for abort in aborts {
                    abort.abort();
                }
                (collected, true)
            }
        }
    }

    /// Fill the per-token signal slots from whatever was collected; sources
    /// that never reported get an errored placeholder so every fusion sees
    /// the full expected set.
    fn assemble(
        &self,
        tokens: &[String],
        collected: &Collected,
    ) -> BTreeMap<String, FusedAnalysis> {
        let expected_sources = self.adapters.len() + 1;
        let mut per_token = BTreeMap::new();

        for token in tokens {
            let mut signals = Vec::with_capacity(expected_sources);
            for adapter in &self.adapters {
                let key = (token.clone(), adapter.source());
                let signal = collected
                    .signals
                    .get(&key)
                    .map(|s| s.clone())
                    .unwrap_or_else(|| Signal::errored(adapter.source(), token));
                signals.push(signal);
            }

            let series = collected
                .series
                .get(token)
                .map(|s| s.clone())
                .unwrap_or_default();
            let indicators = indicator_engine::compute(&series);
            signals.push(fusion_engine::technical_signal(
                token,
                &indicators,
                series.len(),
            ));

            per_token.insert(
                token.clone(),
                fusion_engine::fuse(token, signals, indicators, expected_sources),
            );
        }

        per_token
    }

    async fn synthesize(
        &self,
        per_token: &BTreeMap<String, FusedAnalysis>,
    ) -> Option<Recommendation> {
        let synth = self.synth.as_ref()?;
        let prompt_context = context::build_context(per_token);

        match synth.generate(&prompt_context).await {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!(error = %e, "synthesizer unavailable, using degraded recommendation");
                Some(degraded_recommendation())
            }
        }
    }
}

fn normalize_tokens(tokens: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let upper = token.trim().to_uppercase();
        if !upper.is_empty() && !normalized.contains(&upper) {
            normalized.push(upper);
        }
    }
    normalized
}

/// Stand-in recommendation when the synthesizer could not be reached at all.
fn degraded_recommendation() -> Recommendation {
    Recommendation {
        analysis: "Analysis completed with limited data due to upstream constraints.".to_string(),
        confidence_level: 30,
        market_sentiment: "neutral".to_string(),
        fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fusion_core::types::SignalStatus;

    struct StubAdapter {
        source: SignalSource,
        delay: Duration,
        sentiment: f64,
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn source(&self) -> SignalSource {
            self.source
        }

        async fn fetch(&self, token: &str, _timeout: Duration) -> Signal {
            tokio::time::sleep(self.delay).await;
            Signal::ok(self.source, token, self.sentiment, 0.8, 10)
        }
    }

    fn stub(source: SignalSource, delay_ms: u64, sentiment: f64) -> Arc<dyn SourceAdapter> {
        Arc::new(StubAdapter {
            source,
            delay: Duration::from_millis(delay_ms),
            sentiment,
        })
    }

    // Unroutable price endpoint: the adapter fails fast and yields an empty
    // series, keeping these tests off the network.
    fn dead_price() -> Arc<PriceAdapter> {
        Arc::new(PriceAdapter::with_base_url("http://127.0.0.1:9".to_string()))
    }

    fn orchestrator(adapters: Vec<Arc<dyn SourceAdapter>>, ttl: Duration) -> Orchestrator {
        Orchestrator::new(adapters, dead_price(), None, ttl)
    }

    #[tokio::test]
    async fn fast_sources_produce_a_complete_report() {
        let orch = orchestrator(
            vec![
                stub(SignalSource::News, 5, 0.4),
                stub(SignalSource::Twitter, 5, -0.1),
            ],
            Duration::ZERO,
        );

        let tokens = vec!["btc".to_string(), "ETH".to_string()];
        let report = orch.run(&tokens, Duration::from_secs(5)).await.unwrap();

        assert_eq!(report.status, ReportStatus::Complete);
        assert_eq!(report.per_token.len(), 2);
        assert!(report.per_token.contains_key("BTC"));
        assert!(report.per_token.contains_key("ETH"));
        assert_eq!(report.content_hash.len(), 64);
        assert!(report.overall_confidence > 0.0 && report.overall_confidence <= 1.0);
        assert!(report.recommendation.is_none());

        // Expected set per token: two stub sources plus technical.
        let btc = &report.per_token["BTC"];
        assert_eq!(btc.contributing_signals.len(), 3);
    }

    #[tokio::test]
    async fn slow_source_times_out_but_fast_results_survive() {
        let orch = orchestrator(
            vec![
                stub(SignalSource::News, 10, 0.5),
                stub(SignalSource::Twitter, 5_000, 0.5),
            ],
            Duration::ZERO,
        );

        let tokens = vec!["BTC".to_string()];
        let report = orch.run(&tokens, Duration::from_millis(300)).await.unwrap();

        assert_eq!(report.status, ReportStatus::Timeout);

        let btc = &report.per_token["BTC"];
        let news = btc
            .contributing_signals
            .iter()
            .find(|s| s.source == SignalSource::News)
            .unwrap();
        let twitter = btc
            .contributing_signals
            .iter()
            .find(|s| s.source == SignalSource::Twitter)
            .unwrap();

        assert!(news.status.is_ok());
        assert_eq!(twitter.status, SignalStatus::Error);
        assert!(twitter.confidence <= 0.1);
    }

    #[tokio::test]
    async fn nothing_completed_before_deadline_floors_overall_confidence() {
        let orch = orchestrator(
            vec![
                stub(SignalSource::News, 5_000, 0.5),
                stub(SignalSource::Twitter, 5_000, 0.5),
            ],
            Duration::ZERO,
        );

        let tokens = vec!["BTC".to_string()];
        let report = orch.run(&tokens, Duration::from_millis(50)).await.unwrap();

        assert_eq!(report.status, ReportStatus::Timeout);
        assert_eq!(report.overall_confidence, TIMEOUT_FLOOR_CONFIDENCE);
        // Every slot was filled with a placeholder, not dropped.
        assert_eq!(report.per_token["BTC"].contributing_signals.len(), 3);
    }

    #[tokio::test]
    async fn no_adapters_aborts_before_fan_out() {
        let orch = orchestrator(vec![], Duration::ZERO);
        let err = orch
            .run(&["BTC".to_string()], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[tokio::test]
    async fn no_tokens_aborts_before_fan_out() {
        let orch = orchestrator(vec![stub(SignalSource::News, 5, 0.1)], Duration::ZERO);
        let err = orch.run(&[], Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[tokio::test]
    async fn second_run_within_ttl_is_served_from_cache() {
        let orch = orchestrator(
            vec![stub(SignalSource::News, 5, 0.4)],
            Duration::from_secs(60),
        );

        let tokens = vec!["BTC".to_string(), "ETH".to_string()];
        let first = orch.run(&tokens, Duration::from_secs(5)).await.unwrap();

        // Same token set, different order and case: still the cached report.
        let reordered = vec!["eth".to_string(), "btc".to_string()];
        let second = orch.run(&reordered, Duration::from_secs(5)).await.unwrap();

        assert_eq!(first.content_hash, second.content_hash);
        assert_eq!(first.timestamp, second.timestamp);
    }

    #[tokio::test]
    async fn timed_out_reports_are_not_cached() {
        let orch = orchestrator(
            vec![stub(SignalSource::News, 5_000, 0.5)],
            Duration::from_secs(60),
        );

        let tokens = vec!["BTC".to_string()];
        let first = orch.run(&tokens, Duration::from_millis(50)).await.unwrap();
        assert_eq!(first.status, ReportStatus::Timeout);

        // A fresh run, not the cached degraded report.
        let second = orch.run(&tokens, Duration::from_millis(50)).await.unwrap();
        assert_ne!(first.timestamp, second.timestamp);
    }

    #[test]
    fn token_normalization_dedupes_and_uppercases() {
        let tokens = vec![
            " btc ".to_string(),
            "BTC".to_string(),
            "eth".to_string(),
            String::new(),
        ];
        assert_eq!(normalize_tokens(&tokens), vec!["BTC", "ETH"]);
    }
}
