//! Client for the recommendation synthesizer: an OpenAI-compatible chat
//! completion endpoint that turns the fused analysis context into narrative
//! advice. Output parsing is defensive — unstructured text is wrapped into
//! the documented fallback rather than failing the report.

mod error;

pub use error::{SynthError, SynthResult};

use fusion_core::types::Recommendation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Confidence assigned when the synthesizer answered but not in a
/// structured form we could parse.
const FALLBACK_CONFIDENCE_LEVEL: u8 = 70;

const SYSTEM_PROMPT: &str = "You are a professional cryptocurrency analyst \
with expertise in market analysis and technical analysis.";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Clone)]
pub struct SynthClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SynthClient {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> SynthResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// Ask the synthesizer for a recommendation based on the fused context.
    /// Transport or service failures surface as errors for the caller to
    /// replace with a degraded recommendation; parse failures are absorbed
    /// here via the raw-text fallback.
    pub async fn generate(&self, context: &str) -> SynthResult<Recommendation> {
        let prompt = format!(
            "Based on the following market analysis data, provide a research \
             summary and trading outlook.\n\n{context}\n\nRespond as JSON with \
             fields: analysis (string), confidence_level (0-100), \
             market_sentiment (bullish/bearish/neutral)."
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
            max_tokens: 2000,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SynthError::ServiceUnavailable(format!(
                "status: {}",
                response.status()
            )));
        }

        let body = response.json::<ChatResponse>().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(SynthError::EmptyCompletion)?;

        Ok(parse_recommendation(&content))
    }
}

/// Parse the synthesizer output. Strict JSON first (with or without a
/// markdown code fence); anything else becomes the raw-text fallback
/// wrapper.
pub fn parse_recommendation(content: &str) -> Recommendation {
    let stripped = strip_code_fence(content);

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(stripped) {
        if let Some(obj) = value.as_object() {
            let analysis = obj
                .get("analysis")
                .or_else(|| obj.get("executive_summary"))
                .and_then(|v| v.as_str())
                .unwrap_or(content)
                .to_string();

            let confidence_level = obj
                .get("confidence_level")
                .and_then(|v| v.as_f64())
                .map(|v| v.clamp(0.0, 100.0) as u8)
                .unwrap_or(FALLBACK_CONFIDENCE_LEVEL);

            let market_sentiment = obj
                .get("market_sentiment")
                .or_else(|| obj.get("overall_market_sentiment"))
                .and_then(|v| v.as_str())
                .unwrap_or("neutral")
                .to_string();

            return Recommendation {
                analysis,
                confidence_level,
                market_sentiment,
                fallback: false,
            };
        }
    }

    tracing::debug!("synthesizer output was not structured JSON, wrapping raw text");
    Recommendation {
        analysis: content.to_string(),
        confidence_level: FALLBACK_CONFIDENCE_LEVEL,
        market_sentiment: "neutral".to_string(),
        fallback: true,
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_json() {
        let rec = parse_recommendation(
            r#"{"analysis": "BTC looks steady", "confidence_level": 82, "market_sentiment": "bullish"}"#,
        );

        assert!(!rec.fallback);
        assert_eq!(rec.analysis, "BTC looks steady");
        assert_eq!(rec.confidence_level, 82);
        assert_eq!(rec.market_sentiment, "bullish");
    }

    #[test]
    fn parses_fenced_json() {
        let rec = parse_recommendation(
            "```json\n{\"analysis\": \"flat week\", \"confidence_level\": 55}\n```",
        );

        assert!(!rec.fallback);
        assert_eq!(rec.analysis, "flat week");
        assert_eq!(rec.confidence_level, 55);
        assert_eq!(rec.market_sentiment, "neutral");
    }

    #[test]
    fn wraps_free_text_with_documented_fallback() {
        let rec = parse_recommendation("Markets are mixed; stay cautious.");

        assert!(rec.fallback);
        assert_eq!(rec.analysis, "Markets are mixed; stay cautious.");
        assert_eq!(rec.confidence_level, 70);
        assert_eq!(rec.market_sentiment, "neutral");
    }

    #[test]
    fn accepts_alternate_field_names() {
        let rec = parse_recommendation(
            r#"{"executive_summary": "summary", "overall_market_sentiment": "bearish"}"#,
        );

        assert!(!rec.fallback);
        assert_eq!(rec.analysis, "summary");
        assert_eq!(rec.market_sentiment, "bearish");
        assert_eq!(rec.confidence_level, 70);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let rec = parse_recommendation(r#"{"analysis": "x", "confidence_level": 900}"#);
        assert_eq!(rec.confidence_level, 100);
    }

    #[test]
    fn non_object_json_falls_back() {
        let rec = parse_recommendation("[1, 2, 3]");
        assert!(rec.fallback);
    }
}
