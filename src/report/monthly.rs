use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::{
    config::MomClip,
    data::observation::Observation,
    math::change::{MonthlyPoint, monthly_change},
};

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
pub enum NetSeries {
    NcNet,
    CNet,
}

impl NetSeries {
    fn value_of(&self, obs: &Observation) -> f64 {
        match self {
            Self::NcNet => obs.nc_net(),
            Self::CNet => obs.c_net(),
        }
    }
}

/// Month-end resampled net positions of one trader category with their MoM change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub series: NetSeries,
    pub points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    pub fn from_observations(
        series: NetSeries,
        observations: &[Observation],
        bound: Option<MomClip>,
    ) -> Self {
        let dates = observations.iter().map(|o| o.date).collect::<Vec<_>>();
        let values = observations
            .iter()
            .map(|o| series.value_of(o))
            .collect::<Vec<_>>();

        Self {
            series,
            points: monthly_change(&dates, &values, bound),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent month with a defined change.
    pub fn latest_defined(&self) -> Option<&MonthlyPoint> {
        self.points.iter().rev().find(|p| !p.pct.is_nan())
    }
}
