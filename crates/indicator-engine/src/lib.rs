mod indicators;
mod indicators_tests;

pub use indicators::{
    compute, ema, rsi_series, sma, BOLLINGER_PERIOD, MACD_FAST, MACD_SIGNAL, MACD_SLOW,
    RSI_PERIOD,
};
