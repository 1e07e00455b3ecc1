use std::sync::Arc;

use chrono::{DateTime, Utc};
use polars::{
    frame::DataFrame,
    prelude::{Column, CsvWriter, DataType, Field, PlSmallStr, Schema, SchemaRef, SerWriter},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{CotResult, IoError},
    report::{
        derived::DerivedRow,
        io::{AsFormattedLazyFrame, Report, ReportName, ToSchema, slugify},
        polars_ext::polars_to_cot_error,
    },
};

/// Columns of the exported table: the raw observation followed by every derived metric.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialOrd,
    Ord,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum CotCol {
    // === Observation ===
    Market,
    Date,
    OpenInterest,
    NcLong,
    NcShort,
    CLong,
    CShort,

    // === Net positions ===
    NcNet,
    CNet,
    NcNetPctOi,
    CNetPctOi,

    // === Indicators ===
    /// Rolling min-max index of `nc_net`, `[0, 100]`.
    CotIndex,
    NcNetDeltaPct,
    NcNetMomPct,
    CNetMomPct,
    NcNetMomPctClipped,
    CNetMomPctClipped,

    // === Sentiment ===
    Direction,
    SentimentLabel,
    SentimentColor,
}

impl From<CotCol> for PlSmallStr {
    fn from(value: CotCol) -> Self {
        value.as_str().into()
    }
}

impl CotCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// The derived rows of one selection as a polars table, ready for export.
///
/// `NaN` metrics are kept in memory and written as empty cells.
#[derive(Debug, Clone)]
pub struct CotReport {
    market: String,
    df: DataFrame,
}

impl ReportName for CotReport {
    fn base_name(&self) -> String {
        match slugify(&self.market) {
            slug if slug.is_empty() => "cot".to_string(),
            slug => format!("{slug}_cot"),
        }
    }
}

impl Report for CotReport {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }

    fn as_df_mut(&mut self) -> &mut DataFrame {
        &mut self.df
    }
}

impl ToSchema for CotReport {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = CotCol::iter()
            .map(|col| {
                let dtype = match col {
                    CotCol::Market
                    | CotCol::Direction
                    | CotCol::SentimentLabel
                    | CotCol::SentimentColor => DataType::String,

                    CotCol::Date => DataType::Date,

                    CotCol::OpenInterest
                    | CotCol::NcLong
                    | CotCol::NcShort
                    | CotCol::CLong
                    | CotCol::CShort
                    | CotCol::NcNet
                    | CotCol::CNet
                    | CotCol::NcNetPctOi
                    | CotCol::CNetPctOi
                    | CotCol::CotIndex
                    | CotCol::NcNetDeltaPct
                    | CotCol::NcNetMomPct
                    | CotCol::CNetMomPct
                    | CotCol::NcNetMomPctClipped
                    | CotCol::CNetMomPctClipped => DataType::Float64,
                };
                Field::new(col.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

impl CotReport {
    /// Builds the export table for `market` from its derived rows.
    pub fn new(market: impl Into<String>, rows: &[DerivedRow]) -> CotResult<Self> {
        let err = |e| polars_to_cot_error("COT report", e);
        let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();

        let floats = |f: fn(&DerivedRow) -> f64| rows.iter().map(f).collect::<Vec<f64>>();
        let texts = |f: fn(&DerivedRow) -> Option<String>| {
            rows.iter().map(f).collect::<Vec<Option<String>>>()
        };

        let days = rows
            .iter()
            .map(|r| r.date().signed_duration_since(epoch).num_days() as i32)
            .collect::<Vec<i32>>();

        let columns = CotCol::iter()
            .map(|c| {
                let column = match c {
                    CotCol::Market => {
                        Column::new(c.name(), texts(|r| Some(r.market().to_string())))
                    }
                    CotCol::Date => Column::new(c.name(), days.clone()).cast(&DataType::Date)?,
                    CotCol::OpenInterest => Column::new(
                        c.name(),
                        rows.iter()
                            .map(|r| r.observation.open_interest)
                            .collect::<Vec<Option<f64>>>(),
                    ),
                    CotCol::NcLong => Column::new(c.name(), floats(|r| r.observation.nc_long)),
                    CotCol::NcShort => Column::new(c.name(), floats(|r| r.observation.nc_short)),
                    CotCol::CLong => Column::new(c.name(), floats(|r| r.observation.c_long)),
                    CotCol::CShort => Column::new(c.name(), floats(|r| r.observation.c_short)),
                    CotCol::NcNet => Column::new(c.name(), floats(|r| r.nc_net)),
                    CotCol::CNet => Column::new(c.name(), floats(|r| r.c_net)),
                    CotCol::NcNetPctOi => Column::new(c.name(), floats(|r| r.nc_net_pct_oi)),
                    CotCol::CNetPctOi => Column::new(c.name(), floats(|r| r.c_net_pct_oi)),
                    CotCol::CotIndex => Column::new(c.name(), floats(|r| r.cot_index)),
                    CotCol::NcNetDeltaPct => {
                        Column::new(c.name(), floats(|r| r.nc_net_delta_pct))
                    }
                    CotCol::NcNetMomPct => Column::new(c.name(), floats(|r| r.nc_net_mom_pct)),
                    CotCol::CNetMomPct => Column::new(c.name(), floats(|r| r.c_net_mom_pct)),
                    CotCol::NcNetMomPctClipped => {
                        Column::new(c.name(), floats(|r| r.nc_net_mom_pct_clipped))
                    }
                    CotCol::CNetMomPctClipped => {
                        Column::new(c.name(), floats(|r| r.c_net_mom_pct_clipped))
                    }
                    CotCol::Direction => Column::new(
                        c.name(),
                        texts(|r| r.direction.map(|d| d.to_string())),
                    ),
                    CotCol::SentimentLabel => Column::new(
                        c.name(),
                        texts(|r| r.sentiment_label().map(str::to_string)),
                    ),
                    CotCol::SentimentColor => Column::new(
                        c.name(),
                        texts(|r| r.sentiment_color().map(str::to_string)),
                    ),
                };
                Ok(column)
            })
            .collect::<Result<Vec<_>, polars::error::PolarsError>>()
            .map_err(err)?;

        let df = DataFrame::new(columns).map_err(err)?;

        Ok(Self {
            market: market.into(),
            df,
        })
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Renders the report as UTF-8 CSV with a header row, the download payload.
    pub fn to_csv_bytes(&self) -> CotResult<Vec<u8>> {
        let mut df = self
            .as_formatted_lf()
            .collect()
            .map_err(|e| polars_to_cot_error("CSV payload", e))?;

        let mut buf = Vec::with_capacity(df.height() * CotCol::COUNT * 8);
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        Ok(buf)
    }
}
