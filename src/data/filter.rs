use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    data::{observation::Observation, source::Dataset},
    error::{ConfigError, CotResult},
};

/// An inclusive calendar-date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    /// Returns [`ConfigError::InvalidDateRange`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CotResult<Self> {
        if start > end {
            return Err(ConfigError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            }
            .into());
        }
        Ok(Self { start, end })
    }

    pub(crate) fn new_unchecked(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The unbounded range; every date is contained.
    pub fn all() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamps this range to `bounds`. Returns `None` if they do not overlap.
    pub fn clamp_to(&self, bounds: &DateRange) -> Option<DateRange> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        (start <= end).then_some(DateRange { start, end })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// An inclusive range of calendar years, the coarse alternative to [`DateRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl TryFrom<YearRange> for DateRange {
    type Error = crate::error::CotError;

    fn try_from(years: YearRange) -> CotResult<Self> {
        let invalid = || ConfigError::InvalidDateRange {
            start: years.start.to_string(),
            end: years.end.to_string(),
        };
        let start = NaiveDate::from_ymd_opt(years.start, 1, 1).ok_or_else(invalid)?;
        let end = NaiveDate::from_ymd_opt(years.end, 12, 31).ok_or_else(invalid)?;
        DateRange::new(start, end)
    }
}

/// The user's current market and date-range choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub market: String,
    pub range: DateRange,
}

impl Selection {
    pub fn new(market: impl Into<String>, range: DateRange) -> Self {
        Self {
            market: market.into(),
            range,
        }
    }

    /// Spans every date the market has data for, the default slider position.
    /// Falls back to the unbounded range for unknown markets.
    pub fn full(dataset: &Dataset, market: &str) -> Self {
        let range = dataset
            .market_date_bounds(market)
            .unwrap_or_else(DateRange::all);
        Self::new(market, range)
    }

    pub fn for_years(market: impl Into<String>, years: YearRange) -> CotResult<Self> {
        Ok(Self::new(market, years.try_into()?))
    }
}

/// Returns the observations of `market` within `range`, ascending by date.
///
/// The market match is exact and case-sensitive on normalized names. A range
/// outside the data yields an empty vector.
pub fn filter(observations: &[Observation], market: &str, range: &DateRange) -> Vec<Observation> {
    let mut selected = observations
        .iter()
        .filter(|o| o.market == market && range.contains(o.date))
        .cloned()
        .collect::<Vec<_>>();
    crate::data::observation::sort_by_date(&mut selected);
    selected
}

pub fn filter_selection(observations: &[Observation], selection: &Selection) -> Vec<Observation> {
    filter(observations, &selection.market, &selection.range)
}

/// Distinct calendar years of a filtered sequence.
pub fn years(observations: &[Observation]) -> Vec<i32> {
    let mut years = observations.iter().map(|o| o.date.year()).collect::<Vec<_>>();
    years.dedup();
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::observation::fixtures::{date, weekly};

    fn mixed() -> Vec<Observation> {
        let mut obs = weekly(
            "EURO FX",
            date(2024, 1, 2),
            &[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)],
            None,
        );
        obs.extend(weekly("euro fx", date(2024, 1, 2), &[(9.0, 0.0)], None));
        obs.extend(weekly("YEN", date(2024, 1, 9), &[(5.0, 0.0)], None));
        obs
    }

    #[test]
    fn test_filter_inclusive_bounds() {
        let range = DateRange::new(date(2024, 1, 9), date(2024, 1, 16)).expect("valid range");
        let have = filter(&mixed(), "EURO FX", &range);
        let nets = have.iter().map(Observation::nc_net).collect::<Vec<_>>();
        assert_eq!(nets, vec![2.0, 3.0], "Both endpoints are inclusive");
    }

    #[test]
    fn test_filter_market_is_case_sensitive() {
        let have = filter(&mixed(), "euro fx", &DateRange::all());
        assert_eq!(have.len(), 1);
        assert_eq!(have[0].nc_long, 9.0);
    }

    #[test]
    fn test_filter_outside_range_is_empty() {
        let range = DateRange::new(date(2030, 1, 1), date(2031, 1, 1)).expect("valid range");
        assert!(filter(&mixed(), "EURO FX", &range).is_empty());
        assert!(filter(&mixed(), "GOLD", &DateRange::all()).is_empty());
    }

    #[test]
    fn test_filter_sorts_per_market() {
        let mut obs = mixed();
        obs.reverse();
        let have = filter(&obs, "EURO FX", &DateRange::all());
        assert!(
            have.windows(2).all(|w| w[0].date <= w[1].date),
            "Filtered rows must be ascending by date"
        );
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_year_range_conversion() {
        let range: DateRange = YearRange {
            start: 2022,
            end: 2023,
        }
        .try_into()
        .expect("valid years");
        assert_eq!(range.start(), date(2022, 1, 1));
        assert_eq!(range.end(), date(2023, 12, 31));

        let inverted = DateRange::try_from(YearRange {
            start: 2024,
            end: 2023,
        });
        assert!(inverted.is_err());
    }

    #[test]
    fn test_clamp_to() {
        let bounds = DateRange::new(date(2024, 1, 1), date(2024, 6, 30)).expect("valid range");
        let wide = DateRange::all();
        assert_eq!(wide.clamp_to(&bounds), Some(bounds));

        let outside = DateRange::new(date(2025, 1, 1), date(2025, 2, 1)).expect("valid range");
        assert_eq!(outside.clamp_to(&bounds), None);
    }

    #[test]
    fn test_years() {
        let obs = weekly("X", date(2023, 12, 19), &[(1.0, 0.0); 4], None);
        assert_eq!(years(&obs), vec![2023, 2024]);
    }
}
