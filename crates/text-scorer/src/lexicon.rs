use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't",
    "won't", "wouldn't", "couldn't", "shouldn't", "hardly", "barely", "neither", "nor", "without",
];

/// How many words back a negation flips polarity.
const NEGATION_WINDOW: usize = 3;

/// Word-list polarity analyzer with negation handling. The raw hit count is
/// squashed through tanh so the output is a bounded [-1, 1] scalar rather
/// than an open-ended tally.
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: Vec<&'static str>,
    negative: Vec<&'static str>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            positive: vec![
                "rally", "surge", "gain", "profit", "growth", "beat", "upgrade", "outperform",
                "strong", "positive", "rise", "increase", "breakthrough", "innovation", "success",
                "exceed", "momentum", "buy", "recommend", "optimistic", "record", "advance",
                "recovery", "rebound", "expansion", "robust", "upside", "partnership",
            ],
            negative: vec![
                "decline", "loss", "fall", "plunge", "crash", "miss", "downgrade", "underperform",
                "weak", "negative", "drop", "decrease", "concern", "risk", "fail", "disappoint",
                "slump", "sell", "warning", "pessimistic", "retreat", "fear", "trouble", "hack",
                "exploit", "lawsuit", "investigation", "fraud", "bankruptcy", "downside",
            ],
        }
    }
}

impl Lexicon {
    /// Score a text in [-1, 1].
    pub fn score(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?'))
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return 0.0;
        }

        let positive: HashSet<&str> = self.positive.iter().copied().collect();
        let negative: HashSet<&str> = self.negative.iter().copied().collect();
        let negations: HashSet<&str> = NEGATION_WORDS.iter().copied().collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| negations.contains(**w))
            .map(|(i, _)| i)
            .collect();

        let mut tally: i32 = 0;
        for (i, word) in words.iter().enumerate() {
            let is_positive = positive.contains(*word);
            let is_negative = negative.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&pos| pos < i && (i - pos) <= NEGATION_WINDOW);

            let polarity = if is_positive { 1 } else { -1 };
            tally += if negated { -polarity } else { polarity };
        }

        // Two clear hits already read as a strong document.
        (tally as f64 / 2.0).tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_words_score_positive() {
        let lex = Lexicon::default();
        assert!(lex.score("strong rally with record momentum") > 0.0);
    }

    #[test]
    fn negative_words_score_negative() {
        let lex = Lexicon::default();
        assert!(lex.score("crash and heavy loss, fear everywhere") < 0.0);
    }

    #[test]
    fn negation_flips_polarity() {
        let lex = Lexicon::default();
        assert!(lex.score("not a strong result") < 0.0);
        assert!(lex.score("never a loss") > 0.0);
    }

    #[test]
    fn empty_text_is_neutral() {
        assert_eq!(Lexicon::default().score(""), 0.0);
    }

    #[test]
    fn score_is_bounded() {
        let lex = Lexicon::default();
        let loaded = "rally surge gain profit growth beat upgrade strong rise ".repeat(20);
        let s = lex.score(&loaded);
        assert!((-1.0..=1.0).contains(&s));
    }
}
