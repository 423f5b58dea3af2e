use async_trait::async_trait;
use fusion_core::types::{Signal, SignalSource};
use fusion_core::SourceAdapter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use text_scorer::TextScorer;

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const ARTICLES_PER_TOKEN: usize = 10;

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// News source backed by NewsAPI. Without an API key the adapter is
/// disabled and always reports `NoData`.
pub struct NewsAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    scorer: Arc<TextScorer>,
}

impl NewsAdapter {
    pub fn new(api_key: Option<String>, scorer: Arc<TextScorer>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            scorer,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn score_articles(&self, token: &str, articles: &[NewsApiArticle]) -> Signal {
        let scores: Vec<f64> = articles
            .iter()
            .filter_map(|a| {
                let title = a.title.as_deref()?;
                Some(self.scorer.score_article(title, a.description.as_deref()))
            })
            .collect();

        if scores.is_empty() {
            return Signal::no_data(SignalSource::News, token);
        }

        let sentiment = scores.iter().sum::<f64>() / scores.len() as f64;
        // Strongly polarized coverage reads as higher-conviction evidence
        // than a pile of neutral headlines.
        let confidence = scores.iter().map(|s| s.abs()).sum::<f64>() / scores.len() as f64;

        Signal::ok(
            SignalSource::News,
            token,
            sentiment,
            confidence,
            scores.len() as u64,
        )
    }
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    fn source(&self) -> SignalSource {
        SignalSource::News
    }

    async fn fetch(&self, token: &str, timeout: Duration) -> Signal {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return Signal::no_data(SignalSource::News, token),
        };

        let response = self
            .client
            .get(NEWSAPI_URL)
            .timeout(timeout)
            .query(&[
                ("q", format!("{} cryptocurrency", token)),
                ("language", "en".to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", ARTICLES_PER_TOKEN.to_string()),
                ("apiKey", api_key.clone()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return crate::signal_from_transport_error(SignalSource::News, token, &e),
        };

        if !response.status().is_success() {
            return crate::signal_from_status(SignalSource::News, token, response.status());
        }

        match response.json::<NewsApiResponse>().await {
            Ok(body) => self.score_articles(token, &body.articles),
            Err(e) => crate::signal_from_transport_error(SignalSource::News, token, &e),
        }
    }
}
