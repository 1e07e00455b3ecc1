#![allow(dead_code)]

use std::path::PathBuf;

use cot_viewer::prelude::*;

pub const EURO_FX: &str = "EURO FX - CHICAGO MERCANTILE EXCHANGE";
pub const GOLD: &str = "GOLD - COMMODITY EXCHANGE INC.";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/cot/input")
        .join(name)
}

pub fn dashboard(config: PipelineConfig) -> Dashboard {
    Dashboard::load(fixture("cot_weekly.csv"), config).expect("Failed to load weekly fixture")
}

pub fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn window(weeks: u16) -> RollingWindow {
    RollingWindow::new(weeks).expect("valid window")
}
