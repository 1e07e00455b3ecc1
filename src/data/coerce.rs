use chrono::{NaiveDate, NaiveTime};

static YEAR_FIRST_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

static DAY_FIRST_DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

static DAY_FIRST_SHORT_YEAR_FORMATS: [&str; 3] = ["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

static COMPACT_DATE_FORMATS: [&str; 1] = ["%Y%m%d"];

/// `%.f` also matches a time without fractional seconds.
static TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Parses a report date using the day-first convention (`31/12/2023`, `31/12/23`).
///
/// ISO dates (`2023-12-31`) and datetimes with a time component
/// (`2024-01-02 00:00:00.000`) are accepted as well. Returns `None` when no
/// layout matches.
pub fn parse_report_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    let (date, time) = match cell.split_once([' ', 'T']) {
        Some((date, time)) => (date, Some(time.trim())),
        None => (cell, None),
    };

    if time.is_some_and(|t| !is_time_of_day(t)) {
        return None;
    }

    date_layouts(date)?
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

/// Picks the candidate layouts from the field widths.
///
/// chrono's `%Y` accepts one to four digits, so the year position has to be
/// decided before parsing: a four-digit leading field is a year, otherwise
/// the day comes first and the width of the last field selects `%Y` or `%y`.
fn date_layouts(date: &str) -> Option<&'static [&'static str]> {
    let widths = date.split(['-', '/', '.']).map(str::len).collect::<Vec<_>>();
    match widths.as_slice() {
        [8] => Some(COMPACT_DATE_FORMATS.as_slice()),
        [4, _, _] => Some(YEAR_FIRST_DATE_FORMATS.as_slice()),
        [_, _, 4] => Some(DAY_FIRST_DATE_FORMATS.as_slice()),
        [_, _, 2] => Some(DAY_FIRST_SHORT_YEAR_FORMATS.as_slice()),
        _ => None,
    }
}

fn is_time_of_day(time: &str) -> bool {
    TIME_FORMATS
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(time, fmt).is_ok())
}

/// Coerces a numeric cell. Empty and non-numeric cells become `NaN`.
///
/// Thousands separators (`1,234`) are tolerated.
pub fn coerce_number(cell: Option<&str>) -> f64 {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return f64::NAN;
    };

    cell.parse::<f64>()
        .or_else(|_| cell.replace(',', "").parse::<f64>())
        .unwrap_or(f64::NAN)
}

/// Coerces an optional non-negative quantity such as open interest.
/// Negative values are rejected as `None`, like missing cells.
pub fn coerce_non_negative(cell: Option<&str>) -> Option<f64> {
    let value = coerce_number(cell);
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Collapses internal whitespace runs and trims the ends.
pub fn normalize_market_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
