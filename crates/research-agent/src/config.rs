use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Recommendation synthesizer (OpenAI-compatible endpoint)
    pub synth_api_key: String,
    pub synth_base_url: String,
    pub synth_model: String,

    // Optional source credentials; a missing credential disables the source
    // rather than failing startup
    pub newsapi_key: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,

    // Timing
    pub analysis_timeout: Duration,
    pub monitor_interval: Duration,
    pub cache_ttl: Duration,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            // The synthesizer key is the one hard requirement
            synth_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?,
            synth_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            synth_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),

            newsapi_key: env::var("NEWSAPI_KEY").ok(),
            twitter_bearer_token: env::var("TWITTER_BEARER_TOKEN").ok(),
            reddit_client_id: env::var("REDDIT_CLIENT_ID").ok(),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").ok(),

            analysis_timeout: Duration::from_secs(
                env::var("ANALYSIS_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("ANALYSIS_TIMEOUT_SECS must be an integer")?,
            ),
            monitor_interval: Duration::from_secs(
                env::var("MONITOR_INTERVAL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .context("MONITOR_INTERVAL_SECS must be an integer")?,
            ),
            cache_ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .context("CACHE_TTL_SECS must be an integer")?,
            ),
        };

        Ok(config)
    }
}
