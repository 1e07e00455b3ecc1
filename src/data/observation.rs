use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One normalized report row for a single market and report date.
///
/// Position counts that failed numeric coercion are stored as `NaN`; the row
/// itself is kept. Rows without a parseable date never become observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub market: String,
    pub date: NaiveDate,
    pub open_interest: Option<f64>,
    pub nc_long: f64,
    pub nc_short: f64,
    pub c_long: f64,
    pub c_short: f64,
}

impl Observation {
    /// Noncommercial net position. `NaN` if either leg is `NaN`.
    pub fn nc_net(&self) -> f64 {
        self.nc_long - self.nc_short
    }

    /// Commercial net position. `NaN` if either leg is `NaN`.
    pub fn c_net(&self) -> f64 {
        self.c_long - self.c_short
    }

    /// True if every position count coerced to a finite number.
    pub fn is_complete(&self) -> bool {
        [self.nc_long, self.nc_short, self.c_long, self.c_short]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Sorts ascending by date. The sort is stable, so duplicate dates keep their
/// input order.
pub(crate) fn sort_by_date(observations: &mut [Observation]) {
    observations.sort_by_key(|o| o.date);
}
