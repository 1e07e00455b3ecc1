use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::MomClip;

/// Denominators below this magnitude are treated as zero.
pub const NEAR_ZERO: f64 = 1e-12;

/// Percent change from `prev` to `curr`, relative to `|prev|`.
///
/// Returns `NaN` (never an error, never infinite) when either value is not
/// finite or `|prev| < NEAR_ZERO`.
pub fn pct_change_safe(prev: f64, curr: f64) -> f64 {
    if !prev.is_finite() || !curr.is_finite() || prev.abs() < NEAR_ZERO {
        return f64::NAN;
    }
    let pct = 100.0 * (curr - prev) / prev.abs();
    if pct.is_finite() { pct } else { f64::NAN }
}

/// Element-wise [`pct_change_safe`] against the previous element; the first is `NaN`.
pub fn pct_change_series(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| pct_change_safe(w[0], w[1])))
        .take(values.len())
        .collect()
}

/// Percent change of `values[i]` against the value `lookback` positions earlier,
/// with the denominator floored at one contract: `100 * (now - then) / max(1, |then|)`.
///
/// The lookback is positional. On a report with skipped weeks it spans more
/// calendar time than `lookback` weeks.
pub fn lookback_delta_pct(values: &[f64], i: usize, lookback: usize) -> f64 {
    let Some(then_idx) = i.checked_sub(lookback) else {
        return f64::NAN;
    };
    let (Some(&now), Some(&then)) = (values.get(i), values.get(then_idx)) else {
        return f64::NAN;
    };
    if !now.is_finite() || !then.is_finite() {
        return f64::NAN;
    }
    100.0 * (now - then) / then.abs().max(1.0)
}

/// Symmetric display clip. `NaN` stays `NaN`; without a bound the value passes through.
pub fn clip(pct: f64, bound: Option<MomClip>) -> f64 {
    match bound {
        Some(c) => pct.clamp(-c.value(), c.value()),
        None => pct,
    }
}

// ================================================================================================
// Month-End Resampling
// ================================================================================================

/// One calendar month of a resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// Last calendar day of the month.
    pub month_end: NaiveDate,
    /// Last finite value observed in the month, `NaN` for months without one.
    pub value: f64,
    /// Position of that value in the input series.
    pub source_index: Option<usize>,
    /// Month-over-month percent change; `NaN` for the first month.
    pub pct: f64,
    /// `pct` after the display clip.
    pub pct_clipped: f64,
}

/// Resamples a date-ascending series to one value per calendar month (the last
/// finite observation of the month) and computes the safe month-over-month
/// change. Every month between the first and last date is emitted.
pub fn monthly_change(
    dates: &[NaiveDate],
    values: &[f64],
    bound: Option<MomClip>,
) -> Vec<MonthlyPoint> {
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return Vec::new();
    };

    let mut last_in_month: BTreeMap<(i32, u32), (usize, f64)> = BTreeMap::new();
    for (i, (date, value)) in dates.iter().zip(values).enumerate() {
        if !value.is_finite() {
            continue;
        }
        let key = (date.year(), date.month());
        let is_latest = last_in_month
            .get(&key)
            .is_none_or(|(j, _)| dates[*j] <= *date);
        if is_latest {
            last_in_month.insert(key, (i, *value));
        }
    }

    let mut points: Vec<MonthlyPoint> = Vec::new();
    let mut cursor = first.with_day(1);
    while let Some(month_start) = cursor {
        if month_start > *last {
            break;
        }
        let Some(month_end) = end_of_month(month_start) else {
            break;
        };

        let entry = last_in_month.get(&(month_start.year(), month_start.month()));
        let value = entry.map_or(f64::NAN, |(_, v)| *v);
        let pct = points
            .last()
            .map_or(f64::NAN, |prev| pct_change_safe(prev.value, value));

        points.push(MonthlyPoint {
            month_end,
            value,
            source_index: entry.map(|(i, _)| *i),
            pct,
            pct_clipped: clip(pct, bound),
        });

        cursor = month_start.checked_add_months(Months::new(1));
    }

    points
}

fn end_of_month(month_start: NaiveDate) -> Option<NaiveDate> {
    month_start.checked_add_months(Months::new(1))?.pred_opt()
}
