use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    config::PipelineConfig,
    data::observation::Observation,
    math::{
        change::{lookback_delta_pct, monthly_change},
        indicator::cot_index,
        sentiment::{Direction, Sentiment},
    },
};

/// An [`Observation`] extended with every metric the dashboard displays.
///
/// Unavailable metrics are `NaN` (numeric) or `None` (categorical).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    pub observation: Observation,
    pub nc_net: f64,
    pub c_net: f64,
    pub nc_net_pct_oi: f64,
    pub c_net_pct_oi: f64,
    pub cot_index: f64,
    /// Lookback percent change of `nc_net`, the intensity axis of the sentiment.
    pub nc_net_delta_pct: f64,
    /// Set only on the row that closes its calendar month.
    pub nc_net_mom_pct: f64,
    pub c_net_mom_pct: f64,
    pub nc_net_mom_pct_clipped: f64,
    pub c_net_mom_pct_clipped: f64,
    pub direction: Option<Direction>,
    pub sentiment: Option<Sentiment>,
}

impl DerivedRow {
    pub fn market(&self) -> &str {
        &self.observation.market
    }

    pub fn date(&self) -> NaiveDate {
        self.observation.date
    }

    pub fn sentiment_label(&self) -> Option<&str> {
        self.sentiment.as_ref().map(|s| s.label.as_str())
    }

    pub fn sentiment_color(&self) -> Option<&str> {
        self.sentiment.as_ref().map(|s| s.color.as_str())
    }
}

/// `100 * net / open_interest`, or `NaN` without a usable open interest.
pub fn pct_of_open_interest(net: f64, open_interest: Option<f64>) -> f64 {
    match open_interest {
        Some(oi) if oi.is_finite() && oi != 0.0 => {
            let pct = 100.0 * net / oi;
            if pct.is_finite() { pct } else { f64::NAN }
        }
        _ => f64::NAN,
    }
}

/// Computes every derived metric for a filtered, date-ascending sequence.
///
/// Pure: the same observations and configuration always give the same rows.
/// Empty input gives an empty output.
pub fn derive(observations: &[Observation], config: &PipelineConfig) -> Vec<DerivedRow> {
    let nc_net = observations.iter().map(Observation::nc_net).collect::<Vec<_>>();
    let c_net = observations.iter().map(Observation::c_net).collect::<Vec<_>>();
    let dates = observations.iter().map(|o| o.date).collect::<Vec<_>>();

    let index = cot_index(&nc_net, config.rolling_window());

    let mut nc_mom = vec![(f64::NAN, f64::NAN); observations.len()];
    let mut c_mom = vec![(f64::NAN, f64::NAN); observations.len()];
    for (series, out) in [(&nc_net, &mut nc_mom), (&c_net, &mut c_mom)] {
        for point in monthly_change(&dates, series, config.mom_clip()) {
            if let Some(i) = point.source_index {
                out[i] = (point.pct, point.pct_clipped);
            }
        }
    }

    let policy = config.sentiment();
    let lookback = config.lookback_periods();

    observations
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            let delta_pct = lookback_delta_pct(&nc_net, i, lookback);
            DerivedRow {
                observation: obs.clone(),
                nc_net: nc_net[i],
                c_net: c_net[i],
                nc_net_pct_oi: pct_of_open_interest(nc_net[i], obs.open_interest),
                c_net_pct_oi: pct_of_open_interest(c_net[i], obs.open_interest),
                cot_index: index[i],
                nc_net_delta_pct: delta_pct,
                nc_net_mom_pct: nc_mom[i].0,
                c_net_mom_pct: c_mom[i].0,
                nc_net_mom_pct_clipped: nc_mom[i].1,
                c_net_mom_pct_clipped: c_mom[i].1,
                direction: policy.direction(nc_net[i]),
                sentiment: policy.classify(nc_net[i], delta_pct),
            }
        })
        .collect()
}
