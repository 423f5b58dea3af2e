#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use chrono::Utc;
    use fusion_core::types::PriceBar;

    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64, 46.21, 46.25, 45.71, 46.45,
            45.78, 45.35, 44.03, 44.18, 44.22, 44.57,
        ]
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: Utc::now() - chrono::Duration::days((closes.len() - i) as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000.0,
            })
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001);
        assert!((result[2] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 5).is_empty());
    }

    #[test]
    fn test_ema_starts_at_sma_seed() {
        let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
        let result = ema(&data, 3);

        assert_eq!(result.len(), data.len());
        let seed = (22.0 + 24.0 + 23.0) / 3.0;
        assert!((result[0] - seed).abs() < 0.01);
    }

    #[test]
    fn test_rsi_series_bounds() {
        let result = rsi_series(&sample_prices(), 14);

        assert!(!result.is_empty());
        for &value in &result {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_series_insufficient_data() {
        assert!(rsi_series(&[1.0, 2.0, 3.0], 14).is_empty());
    }

    #[test]
    fn test_compute_rsi_in_range() {
        let bars = bars_from_closes(&sample_prices());
        let indicators = compute(&bars);

        assert!((0.0..=100.0).contains(&indicators.rsi));
        assert!((0.0..=1.0).contains(&indicators.bollinger.position));
    }

    #[test]
    fn test_compute_empty_series_yields_defaults() {
        let indicators = compute(&[]);

        assert_eq!(indicators.rsi, 50.0);
        assert_eq!(indicators.macd.macd, 0.0);
        assert_eq!(indicators.macd.signal, 0.0);
        assert_eq!(indicators.macd.histogram, 0.0);
        assert_eq!(indicators.bollinger.position, 0.5);
    }

    #[test]
    fn test_compute_short_series_macd_exactly_zero() {
        // 25 points: one short of the 26 MACD needs.
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let indicators = compute(&bars_from_closes(&closes));

        assert_eq!(indicators.macd.macd, 0.0);
        assert_eq!(indicators.macd.signal, 0.0);
        assert_eq!(indicators.macd.histogram, 0.0);
    }

    #[test]
    fn test_compute_flat_series_scenario() {
        // 30 flat closes at 100: gain/loss ratio undefined, bands collapse.
        let closes = vec![100.0; 30];
        let indicators = compute(&bars_from_closes(&closes));

        assert_eq!(indicators.rsi, 50.0);
        assert_eq!(indicators.macd.macd, 0.0);
        assert_eq!(indicators.macd.histogram, 0.0);
        assert_eq!(indicators.bollinger.position, 0.5);
        assert_eq!(indicators.bollinger.upper, indicators.bollinger.lower);
    }

    #[test]
    fn test_compute_uptrend_rsi_high() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let indicators = compute(&bars_from_closes(&closes));

        // Pure uptrend: avg_loss is zero, which the contract maps to neutral.
        assert_eq!(indicators.rsi, 50.0);
        // Steady uptrend keeps the close near the upper band.
        assert!(indicators.bollinger.position > 0.5);
        assert!(indicators.macd.macd > 0.0);
    }

    #[test]
    fn test_compute_mostly_down_rsi_low() {
        let mut closes: Vec<f64> = (0..40).map(|i| 200.0 - 3.0 * i as f64).collect();
        closes[20] += 1.0; // one up-tick so avg_loss and avg_gain both exist
        let indicators = compute(&bars_from_closes(&closes));

        assert!(indicators.rsi < 30.0);
    }

    #[test]
    fn test_compute_ignores_nan_closes() {
        let mut closes = vec![100.0; 30];
        closes[5] = f64::NAN;
        let indicators = compute(&bars_from_closes(&closes));

        assert!(indicators.rsi.is_finite());
        assert!(indicators.bollinger.position.is_finite());
        assert!(indicators.macd.macd.is_finite());
    }

    #[test]
    fn test_bollinger_position_clamped() {
        // Spike far above a flat history: position must stay within [0, 1].
        let mut closes = vec![100.0; 25];
        closes.push(500.0);
        let indicators = compute(&bars_from_closes(&closes));

        assert!(indicators.bollinger.position <= 1.0);
        assert!(indicators.bollinger.position >= 0.0);
    }
}
