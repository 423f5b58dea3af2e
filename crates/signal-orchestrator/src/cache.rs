use dashmap::DashMap;
use fusion_core::types::AnalysisReport;
use std::time::{Duration, Instant};

struct CacheEntry {
    report: AnalysisReport,
    cached_at: Instant,
}

/// TTL cache for finished reports, keyed by the normalized token set.
/// Staleness is checked at read time; expired entries are dropped on access.
pub struct ReportCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Canonical cache key: uppercased, sorted, deduplicated token set, so
    /// `["eth", "BTC"]` and `["BTC", "ETH", "ETH"]` share one entry.
    pub fn key(tokens: &[String]) -> String {
        let mut normalized: Vec<String> = tokens.iter().map(|t| t.to_uppercase()).collect();
        normalized.sort();
        normalized.dedup();
        normalized.join("+")
    }

    pub fn get(&self, key: &str) -> Option<AnalysisReport> {
        let fresh = {
            let entry = self.entries.get(key)?;
            if entry.cached_at.elapsed() < self.ttl {
                Some(entry.report.clone())
            } else {
                None
            }
        };

        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    pub fn put(&self, key: String, report: AnalysisReport) {
        self.entries.insert(
            key,
            CacheEntry {
                report,
                cached_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fusion_core::types::ReportStatus;
    use std::collections::BTreeMap;

    fn report() -> AnalysisReport {
        AnalysisReport {
            per_token: BTreeMap::new(),
            overall_confidence: 0.5,
            content_hash: "abc".to_string(),
            recommendation: None,
            status: ReportStatus::Complete,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn key_normalizes_case_order_and_duplicates() {
        let a = ReportCache::key(&["eth".to_string(), "BTC".to_string()]);
        let b = ReportCache::key(&["BTC".to_string(), "ETH".to_string(), "ETH".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a, "BTC+ETH");
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache = ReportCache::new(Duration::from_secs(60));
        cache.put("BTC".to_string(), report());

        let hit = cache.get("BTC").unwrap();
        assert_eq!(hit.content_hash, "abc");
    }

    #[test]
    fn zero_ttl_entries_are_immediately_stale() {
        let cache = ReportCache::new(Duration::ZERO);
        cache.put("BTC".to_string(), report());

        assert!(cache.get("BTC").is_none());
        // And the stale entry was evicted on access.
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn unknown_keys_miss() {
        let cache = ReportCache::new(Duration::from_secs(60));
        assert!(cache.get("SOL").is_none());
    }
}
