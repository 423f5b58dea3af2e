pub mod error;
pub mod traits;
pub mod types;

pub use error::EngineError;
pub use traits::SourceAdapter;
pub use types::{
    AnalysisReport, BollingerValue, FusedAnalysis, MacdValue, PriceBar, PriceSeries,
    Recommendation, ReportStatus, Signal, SignalSource, SignalStatus, TechnicalIndicatorSet,
};
