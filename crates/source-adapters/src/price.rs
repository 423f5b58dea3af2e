use chrono::{DateTime, Utc};
use fusion_core::types::{PriceBar, PriceSeries};
use std::time::Duration;

const OHLC_DAYS: u32 = 30;

/// Price-history source backed by the CoinGecko OHLC endpoint (keyless).
/// Emits a `PriceSeries` rather than a `Signal`; the fusion layer turns the
/// computed indicators into the `Technical` signal. Any failure yields an
/// empty series, which downstream indicator math treats as "insufficient
/// data" and answers with neutral defaults.
pub struct PriceAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl PriceAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://api.coingecko.com/api/v3".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Well-known symbol to provider coin id; unknown symbols fall through
    /// as their lowercase form, which the provider may or may not know.
    fn coin_id(token: &str) -> String {
        match token.to_uppercase().as_str() {
            "BTC" => "bitcoin".to_string(),
            "ETH" => "ethereum".to_string(),
            "SOL" => "solana".to_string(),
            "SONIC" => "sonic-3".to_string(),
            other => other.to_lowercase(),
        }
    }

    pub async fn fetch_series(&self, token: &str, timeout: Duration) -> PriceSeries {
        let url = format!(
            "{}/coins/{}/ohlc?vs_currency=usd&days={}",
            self.base_url,
            Self::coin_id(token),
            OHLC_DAYS
        );

        let response = match self.client.get(&url).timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(token, error = %e, "price fetch failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(token, status = %response.status(), "price provider returned error");
            return Vec::new();
        }

        // Rows of [timestamp_ms, open, high, low, close].
        let rows: Vec<Vec<f64>> = match response.json().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(token, error = %e, "price payload was malformed");
                return Vec::new();
            }
        };

        parse_ohlc_rows(&rows)
    }
}

impl Default for PriceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ohlc_rows(rows: &[Vec<f64>]) -> PriceSeries {
    let mut series: PriceSeries = rows
        .iter()
        .filter_map(|row| {
            if row.len() < 5 {
                return None;
            }
            let timestamp: DateTime<Utc> = DateTime::from_timestamp_millis(row[0] as i64)?;
            Some(PriceBar {
                timestamp,
                open: row[1],
                high: row[2],
                low: row[3],
                close: row[4],
                volume: 0.0,
            })
        })
        .collect();

    series.sort_by_key(|b| b.timestamp);
    series
}
