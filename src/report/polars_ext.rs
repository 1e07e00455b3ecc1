use polars::prelude::{
    DataFrame, DataType, Expr, JsonFormat, JsonWriter, LazyFrame, NULL, SchemaRef, SerWriter, col,
    lit,
};
use serde_json::Value;

use crate::error::{CotError, CotResult, DataError, IoError};

pub(super) fn polars_to_cot_error(report: &str, e: polars::error::PolarsError) -> CotError {
    CotError::Data(DataError::DataFrame(format!(
        "Error while building {report} from derived rows: {e}"
    )))
}

pub trait ExprExt {
    /// Replaces `NaN` with null so writers emit an empty cell instead of the text `NaN`.
    fn nan_to_null(self) -> Expr;
}

impl ExprExt for Expr {
    fn nan_to_null(self) -> Expr {
        self.fill_nan(lit(NULL))
    }
}

/// One exported row keyed by column name.
pub type JsonRow = serde_json::Map<String, Value>;

pub trait DataFrameExt {
    fn to_json_rows(&self) -> CotResult<Vec<JsonRow>>;
}

impl DataFrameExt for DataFrame {
    /// Row objects in frame order. Nulls map to `null`, dates to ISO strings.
    fn to_json_rows(&self) -> CotResult<Vec<JsonRow>> {
        if self.height() == 0 {
            return Ok(Vec::new());
        }

        let mut buf = Vec::new();
        JsonWriter::new(&mut buf)
            .with_json_format(JsonFormat::Json)
            .finish(&mut self.clone())
            .map_err(|e| DataError::DataFrame(e.to_string()))?;

        Ok(serde_json::from_slice(&buf).map_err(IoError::Json)?)
    }
}

pub trait LazyFrameExt {
    fn with_nan_as_null(self, schema: SchemaRef) -> Self;
}

impl LazyFrameExt for LazyFrame {
    fn with_nan_as_null(self, schema: SchemaRef) -> Self {
        let float_exprs = schema
            .iter()
            .filter(|(_, dtype)| matches!(dtype, DataType::Float64 | DataType::Float32))
            .map(|(name, _)| col(name.as_str()).nan_to_null().alias(name.as_str()))
            .collect::<Vec<_>>();

        if float_exprs.is_empty() {
            return self;
        }

        self.with_columns(float_exprs)
    }
}
