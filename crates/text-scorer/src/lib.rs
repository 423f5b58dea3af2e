//! Text sentiment scoring: a fixed-weight blend of a word-list lexicon, a
//! crypto keyword heuristic, and an optional pre-trained classifier handle.
//!
//! The combination weights are a contract, not a tuning knob:
//! `0.4 * lexicon + 0.3 * classifier + 0.3 * keyword`, output clamped to
//! [-1, 1]. When a domain-specific classifier is configured it occupies the
//! classifier slot for article scoring.

use fusion_core::types::clamp_sentiment;
use std::collections::HashSet;
use std::sync::Arc;

pub mod keywords;
pub mod lexicon;

pub use keywords::KeywordTable;
pub use lexicon::Lexicon;

const LEXICON_WEIGHT: f64 = 0.4;
const CLASSIFIER_WEIGHT: f64 = 0.3;
const KEYWORD_WEIGHT: f64 = 0.3;

/// A precomputed sentiment model consulted by the scorer. Implementations
/// wrap externally produced scalar outputs; the scorer never trains or loads
/// models itself.
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;

    /// Score a text in [-1, 1], or `None` when the model has no opinion.
    fn score(&self, text: &str) -> Option<f64>;
}

/// Model that always abstains. Used when no classifier is configured, so the
/// scorer shape stays the same and the classifier slot contributes zero.
pub struct NullModel;

impl SentimentModel for NullModel {
    fn name(&self) -> &str {
        "null"
    }

    fn score(&self, _text: &str) -> Option<f64> {
        None
    }
}

/// Immutable scoring handle, resolved once at startup and shared by
/// reference across adapters.
#[derive(Clone)]
pub struct TextScorer {
    lexicon: Lexicon,
    keywords: KeywordTable,
    /// General-purpose classifier slot.
    general: Arc<dyn SentimentModel>,
    /// Domain-specific (financial) classifier, preferred for articles.
    domain: Option<Arc<dyn SentimentModel>>,
}

impl TextScorer {
    pub fn new(
        general: Arc<dyn SentimentModel>,
        domain: Option<Arc<dyn SentimentModel>>,
    ) -> Self {
        Self {
            lexicon: Lexicon::default(),
            keywords: KeywordTable::default(),
            general,
            domain,
        }
    }

    /// Scorer with no classifier configured: lexicon + keywords only.
    pub fn without_models() -> Self {
        Self::new(Arc::new(NullModel), None)
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Score a short document (post, tweet). Result is in [-1, 1].
    pub fn score_text(&self, text: &str) -> f64 {
        self.blend(text, self.general.as_ref())
    }

    /// Score a news article (title + optional description). Uses the domain
    /// classifier when one is configured, falling back to the general slot.
    pub fn score_article(&self, title: &str, description: Option<&str>) -> f64 {
        let text = match description {
            Some(desc) => format!("{} {}", title, desc),
            None => title.to_string(),
        };

        let model = self
            .domain
            .as_deref()
            .unwrap_or_else(|| self.general.as_ref());
        self.blend(&text, model)
    }

    fn blend(&self, text: &str, model: &dyn SentimentModel) -> f64 {
        let lexicon_score = self.lexicon.score(text);
        let keyword_score = self.keyword_score(text);
        let classifier_score = match model.score(text) {
            Some(s) => clamp_sentiment(s),
            None => 0.0,
        };

        clamp_sentiment(
            LEXICON_WEIGHT * lexicon_score
                + CLASSIFIER_WEIGHT * classifier_score
                + KEYWORD_WEIGHT * keyword_score,
        )
    }

    /// Keyword heuristic: `(bullish_ratio - bearish_ratio) * 10`, where
    /// ratios are term counts over total word count. Empty document scores 0.
    pub fn keyword_score(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower.split_whitespace().collect();
        if words.is_empty() {
            return 0.0;
        }

        let bullish: HashSet<&str> = self.keywords.bullish.iter().copied().collect();
        let bearish: HashSet<&str> = self.keywords.bearish.iter().copied().collect();

        let word_set = |set: &HashSet<&str>| {
            words
                .iter()
                .filter(|w| set.contains(trim_punct(w)))
                .count() as f64
        };

        let bullish_ratio = word_set(&bullish) / words.len() as f64;
        let bearish_ratio = word_set(&bearish) / words.len() as f64;

        clamp_sentiment((bullish_ratio - bearish_ratio) * 10.0)
    }
}

fn trim_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}
