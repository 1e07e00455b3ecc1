// 1. Traits
pub use crate::math::indicator::StreamingIndicator;
pub use crate::report::io::{
    AsFormattedLazyFrame, Report, ReportName, ToCsv, ToJson, ToParquet, ToSchema,
};

// 2. The Core Pipeline Types
pub use crate::pipeline::{Analysis, Dashboard};
pub use crate::data::observation::Observation;
pub use crate::data::source::{Dataset, DatasetCache, SourceFingerprint, SourceFormat};
pub use crate::report::derived::{DerivedRow, derive};

// 3. Selection
pub use crate::data::filter::{DateRange, Selection, YearRange, filter};

// 4. Configuration
pub use crate::config::{MomClip, PipelineConfig, RollingWindow};
pub use crate::math::sentiment::{Direction, IntensityTier, Sentiment, SentimentPolicy};

// 5. Reports
pub use crate::report::cot::{CotCol, CotReport};
pub use crate::report::io::FileExtension;
pub use crate::report::kpi::{KpiField, KpiMetric, KpiSnapshot};
pub use crate::report::monthly::{MonthlySeries, NetSeries};
pub use crate::report::overview::MarketOverview;

// 6. Errors & Diagnostics
pub use crate::diagnostics::{HistoryMetric, Warning};
pub use crate::error::{
    ConfigError, CotError, CotResult, DataError, IoError, SchemaError, SourceError,
};
