use fusion_core::types::{BollingerValue, MacdValue, PriceBar, TechnicalIndicatorSet};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_STD_DEV: f64 = 2.0;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// values. Returns one value per input point.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    if data.len() < period {
        return vec![data.iter().sum::<f64>() / data.len() as f64];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());

    let seed: f64 = data[..period].iter().sum::<f64>() / period as f64;
    result.push(seed);

    for i in 1..data.len() {
        let prev = result[i - 1];
        result.push((data[i] - prev) * multiplier + prev);
    }

    result
}

/// Rolling-window RSI: for each point, the simple average gain/loss over the
/// preceding `period` deltas. Values are in [0, 100].
pub fn rsi_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let deltas: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let mut result = Vec::with_capacity(deltas.len() - period + 1);

    for i in period - 1..deltas.len() {
        let window = &deltas[i + 1 - period..=i];
        let avg_gain: f64 = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
        let avg_loss: f64 =
            window.iter().filter(|d| **d < 0.0).map(|d| d.abs()).sum::<f64>() / period as f64;

        if avg_loss == 0.0 {
            // Flat or all-gain window: undefined gain/loss ratio, neutral.
            result.push(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        } else {
            let rs = avg_gain / avg_loss;
            result.push(100.0 - 100.0 / (1.0 + rs));
        }
    }

    result
}

fn latest_rsi(closes: &[f64]) -> f64 {
    if closes.len() < RSI_PERIOD + 1 {
        return 50.0;
    }

    let window = &closes[closes.len() - RSI_PERIOD - 1..];
    let deltas: Vec<f64> = window.windows(2).map(|w| w[1] - w[0]).collect();
    let avg_gain: f64 = deltas.iter().filter(|d| **d > 0.0).sum::<f64>() / RSI_PERIOD as f64;
    let avg_loss: f64 =
        deltas.iter().filter(|d| **d < 0.0).map(|d| d.abs()).sum::<f64>() / RSI_PERIOD as f64;

    if avg_loss == 0.0 {
        return 50.0;
    }

    let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    finite_or(rsi, 50.0).clamp(0.0, 100.0)
}

fn latest_macd(closes: &[f64]) -> MacdValue {
    let zero = MacdValue {
        macd: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };

    if closes.len() < MACD_SLOW {
        return zero;
    }

    let ema_fast = ema(closes, MACD_FAST);
    let ema_slow = ema(closes, MACD_SLOW);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema(&macd_line, MACD_SIGNAL);

    let macd = macd_line.last().copied().unwrap_or(0.0);
    let signal = signal_line.last().copied().unwrap_or(0.0);

    MacdValue {
        macd: finite_or(macd, 0.0),
        signal: finite_or(signal, 0.0),
        histogram: finite_or(macd - signal, 0.0),
    }
}

fn latest_bollinger(closes: &[f64]) -> BollingerValue {
    let neutral = BollingerValue {
        upper: 0.0,
        middle: 0.0,
        lower: 0.0,
        position: 0.5,
    };

    if closes.len() < BOLLINGER_PERIOD {
        return neutral;
    }

    let window = &closes[closes.len() - BOLLINGER_PERIOD..];
    let mean: f64 = window.iter().sum::<f64>() / BOLLINGER_PERIOD as f64;
    let variance: f64 =
        window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / BOLLINGER_PERIOD as f64;
    let std = variance.sqrt();

    let upper = mean + BOLLINGER_STD_DEV * std;
    let lower = mean - BOLLINGER_STD_DEV * std;
    let close = *window.last().unwrap();

    let position = if upper == lower {
        0.5
    } else {
        ((close - lower) / (upper - lower)).clamp(0.0, 1.0)
    };

    BollingerValue {
        upper: finite_or(upper, 0.0),
        middle: finite_or(mean, 0.0),
        lower: finite_or(lower, 0.0),
        position: finite_or(position, 0.5),
    }
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// Compute the full indicator set for a price series. Pure and total: an
/// empty, short, or degenerate series yields the neutral defaults instead of
/// an error, and NaN never propagates into the result.
pub fn compute(series: &[PriceBar]) -> TechnicalIndicatorSet {
    let closes: Vec<f64> = series
        .iter()
        .map(|b| b.close)
        .filter(|c| c.is_finite())
        .collect();

    TechnicalIndicatorSet {
        rsi: latest_rsi(&closes),
        macd: latest_macd(&closes),
        bollinger: latest_bollinger(&closes),
    }
}
