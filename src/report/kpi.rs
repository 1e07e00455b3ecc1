use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::data::observation::Observation;

/// The positions shown as KPI tiles.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum KpiField {
    NcLong,
    NcShort,
    CLong,
    CShort,
    NcNet,
    CNet,
}

impl KpiField {
    pub fn value_of(&self, obs: &Observation) -> f64 {
        match self {
            Self::NcLong => obs.nc_long,
            Self::NcShort => obs.nc_short,
            Self::CLong => obs.c_long,
            Self::CShort => obs.c_short,
            Self::NcNet => obs.nc_net(),
            Self::CNet => obs.c_net(),
        }
    }
}

/// Latest value of one position and its change against the previous report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiMetric {
    pub field: KpiField,
    pub value: f64,
    /// `latest - previous`; `NaN` if either side is `NaN`.
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub latest_date: NaiveDate,
    pub previous_date: NaiveDate,
    pub metrics: Vec<KpiMetric>,
}

impl KpiSnapshot {
    /// Compares the last two observations of a date-ascending sequence.
    ///
    /// Returns `None` with fewer than two observations.
    pub fn from_observations(observations: &[Observation]) -> Option<Self> {
        let [.., previous, latest] = observations else {
            return None;
        };

        let metrics = KpiField::iter()
            .map(|field| {
                let value = field.value_of(latest);
                KpiMetric {
                    field,
                    value,
                    delta: value - field.value_of(previous),
                }
            })
            .collect();

        Some(Self {
            latest_date: latest.date,
            previous_date: previous.date,
            metrics,
        })
    }

    pub fn metric(&self, field: KpiField) -> Option<&KpiMetric> {
        self.metrics.iter().find(|m| m.field == field)
    }
}
