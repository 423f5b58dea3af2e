/// Crypto-market keyword lists used by the ratio heuristic.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    pub bullish: Vec<&'static str>,
    pub bearish: Vec<&'static str>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            bullish: vec![
                "moon", "pump", "bull", "bullish", "up", "rise", "rally", "surge", "growth",
                "positive", "strong", "breakout", "ath", "accumulate", "adoption",
            ],
            bearish: vec![
                "dump", "bear", "bearish", "down", "fall", "crash", "negative", "weak", "drop",
                "plunge", "selloff", "capitulation", "rekt", "scam", "rug",
            ],
        }
    }
}
