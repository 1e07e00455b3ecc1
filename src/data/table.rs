use std::{collections::HashSet, io::Cursor, path::Path};

use polars::{
    frame::DataFrame,
    prelude::{CsvReadOptions, DataType, ParquetReader, SerReader},
};
use serde::{Deserialize, Serialize};

use crate::{
    data::{
        coerce::{coerce_non_negative, coerce_number, normalize_market_name, parse_report_date},
        observation::{Observation, sort_by_date},
        schema::{ReportCol, check_required, find_duplicate, normalize_headers},
        source::SourceFormat,
    },
    error::{CotResult, DataError, SchemaError, SourceError},
};

/// A raw report whose headers have been normalized and verified.
///
/// Construction fails unless every required [`ReportCol`] is present, so
/// downstream stages never see a partial schema.
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
}

/// Row accounting for one coercion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub raw_rows: usize,
    pub missing_date: usize,
    pub missing_market: usize,
}

impl IngestStats {
    pub fn dropped(&self) -> usize {
        self.missing_date + self.missing_market
    }

    pub fn kept(&self) -> usize {
        self.raw_rows - self.dropped()
    }
}

impl RawTable {
    /// Normalizes the headers of an in-memory frame and checks the required set.
    ///
    /// # Errors
    /// - [`SchemaError::DuplicateColumn`] if two headers collapse to the same name.
    /// - [`SchemaError::MissingColumns`] listing every absent required column.
    pub fn from_frame(mut df: DataFrame) -> CotResult<Self> {
        let headers = normalize_headers(df.get_column_names().iter().map(|n| n.as_str()));

        if let Some(dup) = find_duplicate(&headers) {
            return Err(SchemaError::DuplicateColumn(dup.to_string()).into());
        }

        df.set_column_names(headers.iter().map(String::as_str))
            .map_err(|e| DataError::DataFrame(e.to_string()))?;

        let present = headers.into_iter().collect::<HashSet<_>>();
        check_required(&present, &ReportCol::required())?;

        Ok(Self { df })
    }

    /// Parses raw file contents in the given format.
    ///
    /// CSV is read with schema inference disabled so every cell arrives as
    /// text and coercion stays under our control.
    pub fn from_bytes(bytes: Vec<u8>, format: SourceFormat, origin: &Path) -> CotResult<Self> {
        let unreadable = |e: polars::error::PolarsError| SourceError::Unreadable {
            path: origin.to_path_buf(),
            cause: e.to_string(),
        };

        let df = match format {
            SourceFormat::Csv => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .into_reader_with_file_handle(Cursor::new(bytes))
                .finish()
                .map_err(unreadable)?,
            SourceFormat::Parquet => ParquetReader::new(Cursor::new(bytes))
                .finish()
                .map_err(unreadable)?,
        };

        Self::from_frame(df)
    }

    pub fn as_df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn has_column(&self, col: ReportCol) -> bool {
        self.df.column(col.as_str()).is_ok()
    }

    /// Coerces every row into an [`Observation`].
    ///
    /// - Rows whose date does not parse (day-first) are dropped.
    /// - Rows with a blank market name are dropped.
    /// - Unparseable position counts become `NaN`; the row is kept.
    ///
    /// The result is sorted ascending by date across all markets.
    #[tracing::instrument(skip(self), fields(rows = self.height()))]
    pub fn to_observations(&self) -> CotResult<(Vec<Observation>, IngestStats)> {
        let market = self.text_cells(ReportCol::Market)?;
        let date = self.text_cells(ReportCol::Date)?;
        let nc_long = self.text_cells(ReportCol::NoncommercialLong)?;
        let nc_short = self.text_cells(ReportCol::NoncommercialShort)?;
        let c_long = self.text_cells(ReportCol::CommercialLong)?;
        let c_short = self.text_cells(ReportCol::CommercialShort)?;
        let open_interest = if self.has_column(ReportCol::OpenInterest) {
            Some(self.text_cells(ReportCol::OpenInterest)?)
        } else {
            None
        };

        let mut stats = IngestStats {
            raw_rows: self.height(),
            ..Default::default()
        };
        let mut observations = Vec::with_capacity(self.height());

        for i in 0..self.height() {
            let Some(date) = date[i].as_deref().and_then(parse_report_date) else {
                stats.missing_date += 1;
                continue;
            };

            let market = market[i]
                .as_deref()
                .map(normalize_market_name)
                .unwrap_or_default();
            if market.is_empty() {
                stats.missing_market += 1;
                continue;
            }

            observations.push(Observation {
                market,
                date,
                open_interest: open_interest
                    .as_ref()
                    .and_then(|oi| coerce_non_negative(oi[i].as_deref())),
                nc_long: coerce_number(nc_long[i].as_deref()),
                nc_short: coerce_number(nc_short[i].as_deref()),
                c_long: coerce_number(c_long[i].as_deref()),
                c_short: coerce_number(c_short[i].as_deref()),
            });
        }

        sort_by_date(&mut observations);

        tracing::debug!(
            kept = stats.kept(),
            missing_date = stats.missing_date,
            missing_market = stats.missing_market,
            "Coerced raw report rows"
        );

        Ok((observations, stats))
    }

    fn text_cells(&self, col: ReportCol) -> CotResult<Vec<Option<String>>> {
        let type_err = |e: polars::error::PolarsError| DataError::ColumnType {
            column: col.to_string(),
            msg: e.to_string(),
        };

        let column = self
            .df
            .column(col.as_str())
            .map_err(|e| DataError::DataFrame(e.to_string()))?;

        // Typed timestamps render as ISO dates; the time of day is irrelevant.
        let column = match column.dtype() {
            DataType::Datetime(_, _) => column.cast(&DataType::Date).map_err(type_err)?,
            _ => column.clone(),
        }
        .cast(&DataType::String)
        .map_err(type_err)?;

        let cells = column
            .str()
            .map_err(type_err)?
            .into_iter()
            .map(|cell| cell.map(str::to_string))
            .collect();

        Ok(cells)
    }
}
