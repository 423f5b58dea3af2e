use async_trait::async_trait;
use fusion_core::types::{Signal, SignalSource};
use fusion_core::SourceAdapter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use text_scorer::TextScorer;
use tokio::sync::Mutex;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const SUBREDDITS: &[&str] = &["cryptocurrency", "bitcoin", "ethereum", "defi", "altcoin"];
const POSTS_PER_SUBREDDIT: u32 = 50;
const USER_AGENT: &str = "token-research-bot/1.0";

/// Renew this long before the token actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Community-vote weighting: at least 1x so zero-score posts still count,
/// scaled up by upvotes.
pub(crate) fn vote_weight(score: i64) -> f64 {
    (score as f64 / 10.0).max(1.0)
}

struct Credentials {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
}

/// Reddit search source across crypto subreddits, authenticated with the
/// OAuth client-credentials grant. Without both credentials the adapter is
/// disabled and always reports `NoData`.
pub struct RedditAdapter {
    client: reqwest::Client,
    credentials: Option<Credentials>,
    scorer: Arc<TextScorer>,
    token: Mutex<Option<CachedToken>>,
}

impl RedditAdapter {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        scorer: Arc<TextScorer>,
    ) -> Self {
        let credentials = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(Credentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Self {
            client: reqwest::Client::new(),
            credentials,
            scorer,
            token: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Return a valid bearer token, exchanging the client credentials for a
    /// fresh one when the cached token is missing or near expiry.
    async fn bearer_token(&self, credentials: &Credentials, timeout: Duration) -> Option<String> {
        {
            let cached = self.token.lock().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Some(token.value.clone());
                }
            }
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .timeout(timeout)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "reddit token exchange refused");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "reddit token exchange failed");
                return None;
            }
        };

        let body: TokenResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "reddit token response was malformed");
                return None;
            }
        };

        let lifetime = Duration::from_secs(body.expires_in.max(60));
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);

        let mut cached = self.token.lock().await;
        *cached = Some(CachedToken {
            value: body.access_token.clone(),
            expires_at,
        });
        Some(body.access_token)
    }

    fn score_posts(&self, token: &str, posts: &[RedditPost]) -> Signal {
        if posts.is_empty() {
            return Signal::no_data(SignalSource::Reddit, token);
        }

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut total_score: u64 = 0;

        for post in posts {
            let text = format!("{} {}", post.title, post.selftext);
            let weight = vote_weight(post.score);
            weighted_sum += self.scorer.score_text(&text) * weight;
            weight_total += weight;
            total_score += post.score.max(0) as u64;
        }

        let sentiment = weighted_sum / weight_total;
        let confidence = (posts.len() as f64 / 50.0).min(1.0);

        Signal::ok(
            SignalSource::Reddit,
            token,
            sentiment,
            confidence,
            total_score,
        )
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn source(&self) -> SignalSource {
        SignalSource::Reddit
    }

    async fn fetch(&self, token: &str, timeout: Duration) -> Signal {
        let credentials = match &self.credentials {
            Some(c) => c,
            None => return Signal::no_data(SignalSource::Reddit, token),
        };

        let bearer = match self.bearer_token(credentials, timeout).await {
            Some(b) => b,
            None => return Signal::errored(SignalSource::Reddit, token),
        };

        let mut posts: Vec<RedditPost> = Vec::new();
        let mut last_failure: Option<Signal> = None;

        for subreddit in SUBREDDITS {
            let url = format!("{OAUTH_BASE}/r/{subreddit}/search");
            let response = self
                .client
                .get(&url)
                .timeout(timeout)
                .bearer_auth(&bearer)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .query(&[
                    ("q", token.to_string()),
                    ("limit", POSTS_PER_SUBREDDIT.to_string()),
                    ("t", "week".to_string()),
                    ("restrict_sr", "1".to_string()),
                ])
                .send()
                .await;

            match response {
                Ok(r) if r.status().is_success() => match r.json::<Listing>().await {
                    Ok(listing) => {
                        posts.extend(listing.data.children.into_iter().map(|c| c.data))
                    }
                    Err(e) => {
                        last_failure = Some(crate::signal_from_transport_error(
                            SignalSource::Reddit,
                            token,
                            &e,
                        ))
                    }
                },
                Ok(r) => {
                    last_failure =
                        Some(crate::signal_from_status(SignalSource::Reddit, token, r.status()))
                }
                Err(e) => {
                    last_failure = Some(crate::signal_from_transport_error(
                        SignalSource::Reddit,
                        token,
                        &e,
                    ))
                }
            }
        }

        // Partial subreddit failures are fine as long as something scored.
        if posts.is_empty() {
            return last_failure.unwrap_or_else(|| Signal::no_data(SignalSource::Reddit, token));
        }

        self.score_posts(token, &posts)
    }
}
