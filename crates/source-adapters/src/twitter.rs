use async_trait::async_trait;
use fusion_core::types::{Signal, SignalSource};
use fusion_core::SourceAdapter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use text_scorer::TextScorer;

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const MAX_RESULTS: u32 = 100;

/// Engagement weighting caps a single viral tweet at 10x the baseline, so
/// outliers can pull but not dominate the per-token average.
pub(crate) fn engagement_weight(engagement: u64) -> f64 {
    1.0 + (engagement as f64 / 100.0).min(10.0)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
    #[serde(default)]
    public_metrics: PublicMetrics,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
}

impl PublicMetrics {
    fn engagement(&self) -> u64 {
        self.like_count + self.retweet_count + self.reply_count
    }
}

/// Twitter recent-search source. Without a bearer token the adapter is
/// disabled and always reports `NoData`.
pub struct TwitterAdapter {
    client: reqwest::Client,
    bearer_token: Option<String>,
    scorer: Arc<TextScorer>,
}

impl TwitterAdapter {
    pub fn new(bearer_token: Option<String>, scorer: Arc<TextScorer>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
            scorer,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bearer_token.is_some()
    }

    fn score_tweets(&self, token: &str, tweets: &[Tweet]) -> Signal {
        if tweets.is_empty() {
            return Signal::no_data(SignalSource::Twitter, token);
        }

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut total_engagement: u64 = 0;

        for tweet in tweets {
            let engagement = tweet.public_metrics.engagement();
            let weight = engagement_weight(engagement);
            weighted_sum += self.scorer.score_text(&tweet.text) * weight;
            weight_total += weight;
            total_engagement += engagement;
        }

        let sentiment = weighted_sum / weight_total;
        let confidence = (tweets.len() as f64 / 100.0).min(1.0);

        Signal::ok(
            SignalSource::Twitter,
            token,
            sentiment,
            confidence,
            total_engagement,
        )
    }
}

#[async_trait]
impl SourceAdapter for TwitterAdapter {
    fn source(&self) -> SignalSource {
        SignalSource::Twitter
    }

    async fn fetch(&self, token: &str, timeout: Duration) -> Signal {
        let bearer = match &self.bearer_token {
            Some(b) => b,
            None => return Signal::no_data(SignalSource::Twitter, token),
        };

        let query = format!("#{token} OR ${token} OR {token} -is:retweet lang:en");
        let response = self
            .client
            .get(SEARCH_URL)
            .timeout(timeout)
            .bearer_auth(bearer)
            .query(&[
                ("query", query),
                ("max_results", MAX_RESULTS.to_string()),
                ("tweet.fields", "public_metrics".to_string()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return crate::signal_from_transport_error(SignalSource::Twitter, token, &e),
        };

        if !response.status().is_success() {
            return crate::signal_from_status(SignalSource::Twitter, token, response.status());
        }

        match response.json::<SearchResponse>().await {
            Ok(body) => self.score_tweets(token, &body.data),
            Err(e) => crate::signal_from_transport_error(SignalSource::Twitter, token, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::types::SignalStatus;

    fn adapter(bearer: Option<&str>) -> TwitterAdapter {
        TwitterAdapter::new(
            bearer.map(String::from),
            Arc::new(TextScorer::without_models()),
        )
    }

    #[tokio::test]
    async fn disabled_adapter_always_reports_no_data() {
        let signal = adapter(None).fetch("ETH", Duration::from_secs(1)).await;
        assert_eq!(signal.status, SignalStatus::NoData);
        assert!(signal.confidence <= 0.1);
    }

    #[test]
    fn engagement_weight_is_capped_at_ten_x() {
        assert_eq!(engagement_weight(0), 1.0);
        assert_eq!(engagement_weight(100), 2.0);
        assert_eq!(engagement_weight(1_000), 11.0);
        assert_eq!(engagement_weight(1_000_000), 11.0);
    }

    #[test]
    fn viral_tweet_pulls_but_does_not_dominate() {
        let tweets = vec![
            Tweet {
                text: "huge pump, moon incoming".to_string(),
                public_metrics: PublicMetrics {
                    like_count: 1_000_000,
                    ..Default::default()
                },
            },
            Tweet {
                text: "dump and crash, bearish".to_string(),
                public_metrics: PublicMetrics::default(),
            },
            Tweet {
                text: "dump and crash, bearish".to_string(),
                public_metrics: PublicMetrics::default(),
            },
        ];

        let signal = adapter(Some("t")).score_tweets("BTC", &tweets);

        // The viral bullish tweet outweighs 2 quiet bearish ones (11 vs 2)...
        assert!(signal.sentiment > 0.0);
        // ...but its weight is capped: sentiment stays well inside the bound.
        assert!(signal.sentiment < 1.0);
        assert!(signal.status.is_ok());
    }

    #[test]
    fn empty_result_set_is_no_data() {
        let signal = adapter(Some("t")).score_tweets("BTC", &[]);
        assert_eq!(signal.status, SignalStatus::NoData);
    }

    #[test]
    fn response_parsing_tolerates_missing_metrics() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"data": [{"text": "strong rally"}]}"#).unwrap();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].public_metrics.engagement(), 0);
    }
}
