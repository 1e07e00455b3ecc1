mod common;

use std::path::{Path, PathBuf};

use cot_viewer::prelude::*;
use polars::prelude::{
    DataFrame, DataType, LazyCsvReader, LazyFileListReader, ParquetWriter, PlPath, TimeUnit,
};

use common::{EURO_FX, dashboard};

fn report() -> CotReport {
    let dash = dashboard(PipelineConfig::default());
    dash.analyze(&dash.default_selection(EURO_FX))
        .expect("Analysis succeeds")
        .to_report()
        .expect("Report builds")
}

#[test]
fn test_csv_export_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("reports");
    let report = report();

    let path = report.to_csv(&out, None, None).expect("CSV export");

    assert_eq!(
        path,
        out.join("euro_fx_chicago_mercantile_exchange_cot.csv"),
        "File name is derived from the market"
    );
    assert!(path.exists());

    let df = LazyCsvReader::new(PlPath::new(
        path.to_str().expect("failed to convert output path to string"),
    ))
    .with_has_header(true)
    .finish()
    .expect("failed to create LazyFrame from CSV")
    .collect()
    .expect("failed to collect DataFrame from LazyFrame");

    assert_eq!(df.height(), 9);
    assert_eq!(df.width(), CotReport::to_schema().len());

    let nc_net = df
        .column(CotCol::NcNet.as_str())
        .expect("nc_net column")
        .f64()
        .expect("nc_net is numeric")
        .get(8);
    assert_eq!(nc_net, Some(150.0));

    let cot_index = df.column(CotCol::CotIndex.as_str()).expect("cot_index column");
    assert_eq!(cot_index.null_count(), 9, "NaN metrics are exported as empty cells");

    let label = df
        .column(CotCol::SentimentLabel.as_str())
        .expect("sentiment column")
        .str()
        .expect("label is text")
        .get(8)
        .map(str::to_string);
    assert_eq!(label.as_deref(), Some("Strong Bullish"));
}

#[test]
fn test_csv_bytes_match_file_columns() {
    let bytes = report().to_csv_bytes().expect("CSV renders");
    let text = String::from_utf8(bytes).expect("UTF-8 payload");
    let header = text.lines().next().expect("Header row");

    let want = CotReport::to_schema()
        .iter_names()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",");
    assert_eq!(header, want);
    assert_eq!(text.lines().count(), 10, "Header plus one line per row");
}

#[test]
fn test_parquet_and_json_export() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let report = report();

    let path = report
        .to_parquet(dir.path(), None, None)
        .expect("Parquet export");
    assert_eq!(path, dir.path().join(report.filename(FileExtension::Parquet)));
    assert!(path.exists());

    let again = report
        .to_parquet(dir.path(), None, None)
        .expect("Existing files are overwritten");
    assert_eq!(again, path);

    let json = report.to_json().expect("JSON export");
    let rows = json.as_array().expect("Array of rows");
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0]["market"], serde_json::Value::from(EURO_FX));
    assert_eq!(rows[2]["nc_net_pct_oi"], serde_json::Value::Null);
}

/// The raw columns of the EURO FX report under their source headers.
fn raw_frame() -> DataFrame {
    let mut df = report()
        .as_df()
        .select([
            CotCol::Market.as_str(),
            CotCol::Date.as_str(),
            CotCol::OpenInterest.as_str(),
            CotCol::NcLong.as_str(),
            CotCol::NcShort.as_str(),
            CotCol::CLong.as_str(),
            CotCol::CShort.as_str(),
        ])
        .expect("Raw columns exist");
    df.set_column_names([
        "Market and Exchange Names",
        "As of Date in Form YYYY-MM-DD",
        "Open Interest (All)",
        "Noncommercial Positions-Long (All)",
        "Noncommercial Positions-Short (All)",
        "Commercial Positions-Long (All)",
        "Commercial Positions-Short (All)",
    ])
    .expect("Seven names for seven columns");
    df
}

fn write_parquet(dir: &Path, mut df: DataFrame) -> PathBuf {
    let path = dir.join("euro.parquet");
    let file = std::fs::File::create(&path).expect("Failed to create parquet file");
    ParquetWriter::new(file)
        .finish(&mut df)
        .expect("Failed to write parquet");
    path
}

fn euro_observations() -> Vec<Observation> {
    let raw = Dataset::load(common::fixture("cot_weekly.csv")).expect("Fixture loads");
    filter(raw.observations(), EURO_FX, &DateRange::all())
}

#[test]
fn test_parquet_source_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = write_parquet(dir.path(), raw_frame());

    let reloaded = Dataset::load(&path).expect("Parquet sources load");
    assert_eq!(reloaded.observations(), euro_observations().as_slice());
}

#[test]
fn test_parquet_source_with_datetime_dates() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut df = raw_frame();
    let date_col = "As of Date in Form YYYY-MM-DD";
    let stamps = df
        .column(date_col)
        .expect("Date column")
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .expect("Date casts to Datetime");
    df.with_column(stamps).expect("Replaces the date column");

    let path = write_parquet(dir.path(), df);
    let reloaded = Dataset::load(&path).expect("Parquet sources load");

    assert_eq!(reloaded.stats().missing_date, 0, "Timestamps must parse");
    assert_eq!(reloaded.observations(), euro_observations().as_slice());
}
