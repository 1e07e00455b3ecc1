use std::{
    fs,
    path::{Path, PathBuf},
};

use polars::{
    frame::DataFrame,
    prelude::{
        CsvWriterOptions, IntoLazy, LazyFrame, ParquetWriteOptions, PlPath, PolarsResult,
        SchemaRef, SinkOptions, SinkTarget,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    error::{CotResult, IoError},
    report::polars_ext::{DataFrameExt, LazyFrameExt, polars_to_cot_error},
};

// ================================================================================================
// Traits
// ================================================================================================

/// A report backed by a polars table.
pub trait Report {
    fn as_df(&self) -> &DataFrame;

    fn as_df_mut(&mut self) -> &mut DataFrame;
}

pub trait ReportName {
    fn base_name(&self) -> String;

    fn filename(&self, ext: FileExtension) -> String {
        format!("{}.{}", self.base_name(), ext)
    }
}

pub trait ToSchema {
    /// Returns the canonical schema for this report type.
    fn to_schema() -> SchemaRef;
}

/// The table as it is written out: `NaN` floats become nulls.
pub trait AsFormattedLazyFrame {
    fn as_formatted_lf(&self) -> LazyFrame;
}

pub trait ToJson {
    /// One JSON object per row, `NaN` metrics as `null`.
    fn to_json(&self) -> CotResult<serde_json::Value>;
}

/// File exports. Each writes `<base_name>.<ext>` into `dir`, creating the
/// directory when missing and overwriting an existing file, and returns the
/// path it wrote. Unavailable metrics (`NaN`) are written as empty values.
pub trait ToCsv {
    fn to_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&CsvWriterOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> CotResult<PathBuf>;
}

pub trait ToParquet {
    fn to_parquet(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&ParquetWriteOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> CotResult<PathBuf>;
}

// ================================================================================================
// Blanket Implementations
// ================================================================================================

impl<T> AsFormattedLazyFrame for T
where
    T: Report + ToSchema,
{
    fn as_formatted_lf(&self) -> LazyFrame {
        self.as_df().clone().lazy().with_nan_as_null(T::to_schema())
    }
}

impl<T> ToJson for T
where
    T: Report + ToSchema,
{
    fn to_json(&self) -> CotResult<serde_json::Value> {
        let rows = self
            .as_formatted_lf()
            .collect()
            .map_err(|e| polars_to_cot_error("JSON rows", e))?
            .to_json_rows()?;
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }
}

impl<T> ToCsv for T
where
    T: Report + ReportName + ToSchema,
{
    fn to_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&CsvWriterOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> CotResult<PathBuf> {
        let options = opts.cloned().unwrap_or_default();
        let sink_opts = sink_opts.cloned().unwrap_or_default();
        export(self, dir.as_ref(), FileExtension::Csv, |lf, target| {
            lf.sink_csv(target, options, None, sink_opts)
        })
    }
}

impl<T> ToParquet for T
where
    T: Report + ReportName + ToSchema,
{
    fn to_parquet(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&ParquetWriteOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> CotResult<PathBuf> {
        let options = opts.cloned().unwrap_or_default();
        let sink_opts = sink_opts.cloned().unwrap_or_default();
        export(self, dir.as_ref(), FileExtension::Parquet, |lf, target| {
            lf.sink_parquet(target, options, None, sink_opts)
        })
    }
}

/// Runs the formatted frame of `report` through the sink built by `sink`.
fn export<T>(
    report: &T,
    dir: &Path,
    ext: FileExtension,
    sink: impl FnOnce(LazyFrame, SinkTarget) -> PolarsResult<LazyFrame>,
) -> CotResult<PathBuf>
where
    T: Report + ReportName + ToSchema,
{
    fs::create_dir_all(dir)
        .map_err(|e| IoError::FileSystem(format!("Cannot create '{}': {e}", dir.display())))?;

    let path = dir.join(report.filename(ext));
    let uri = path
        .to_str()
        .ok_or_else(|| IoError::FileSystem(format!("Non UTF-8 path: {}", path.display())))?;

    sink(report.as_formatted_lf(), SinkTarget::Path(PlPath::new(uri)))
        .and_then(LazyFrame::collect)
        .map_err(|e| IoError::WriteFailed(format!("{ext} to '{}': {e}", path.display())))?;

    tracing::info!(
        path = %path.display(),
        format = %ext,
        rows = report.as_df().height(),
        "Exported report"
    );
    Ok(path)
}

/// Turns a market name into a file-name stem.
///
/// # Example
/// - `EURO FX - CHICAGO MERCANTILE EXCHANGE` -> `euro_fx_chicago_mercantile_exchange`
pub(crate) fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum FileExtension {
    Csv,
    Parquet,
}
