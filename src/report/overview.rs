use itertools::Itertools;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    config::PipelineConfig,
    data::{observation::Observation, source::Dataset},
    report::derived::{DerivedRow, derive},
};

/// Latest derived row of every market in a dataset, the screener view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    /// One entry per market, sorted by market name.
    pub latest: Vec<DerivedRow>,
}

impl MarketOverview {
    /// Derives every market over its full history and keeps the last row.
    ///
    /// Markets are independent, so they are processed in parallel.
    #[tracing::instrument(skip_all, fields(rows = dataset.observations().len()))]
    pub fn compute(dataset: &Dataset, config: &PipelineConfig) -> Self {
        let by_market = dataset
            .observations()
            .iter()
            .map(|o| (o.market.as_str(), o))
            .into_group_map();

        let mut latest = by_market
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter_map(|(_, rows)| {
                // Grouping keeps the dataset's date order.
                let rows = rows.into_iter().cloned().collect::<Vec<Observation>>();
                derive(&rows, config).pop()
            })
            .collect::<Vec<_>>();

        latest.sort_by(|a, b| a.market().cmp(b.market()));

        tracing::debug!(markets = latest.len(), "Computed market overview");
        Self { latest }
    }

    pub fn get(&self, market: &str) -> Option<&DerivedRow> {
        self.latest.iter().find(|r| r.market() == market)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}
