use std::{path::Path, sync::Arc};

use serde::Serialize;

use crate::{
    config::PipelineConfig,
    data::{
        filter::{Selection, filter_selection},
        source::{Dataset, DatasetCache},
    },
    diagnostics::{HistoryMetric, Warning},
    error::CotResult,
    math::sentiment::Sentiment,
    report::{
        cot::CotReport,
        derived::{DerivedRow, derive},
        kpi::KpiSnapshot,
        monthly::{MonthlySeries, NetSeries},
        overview::MarketOverview,
    },
};

/// KPI deltas compare the last two observations.
const KPI_HISTORY: usize = 2;

/// Everything the presentation layer renders for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub selection: Selection,
    /// Hash of the configuration that produced these rows.
    pub config_hash: String,
    pub rows: Vec<DerivedRow>,
    pub nc_monthly: MonthlySeries,
    pub c_monthly: MonthlySeries,
    pub kpi: Option<KpiSnapshot>,
    pub latest_sentiment: Option<Sentiment>,
    pub warnings: Vec<Warning>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&DerivedRow> {
        self.rows.last()
    }

    pub fn to_report(&self) -> CotResult<CotReport> {
        CotReport::new(self.selection.market.clone(), &self.rows)
    }
}

/// A loaded report plus the parameters of the current session.
///
/// The dataset is shared read-only; every [`Dashboard::analyze`] call is an
/// independent, side-effect-free pass over it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Arc<Dataset>,
    config: PipelineConfig,
}

impl Dashboard {
    pub fn new(dataset: Arc<Dataset>, config: PipelineConfig) -> CotResult<Self> {
        config.validate()?;
        Ok(Self { dataset, config })
    }

    /// Loads `path` without caching.
    pub fn load(path: impl AsRef<Path>, config: PipelineConfig) -> CotResult<Self> {
        Self::new(Arc::new(Dataset::load(path)?), config)
    }

    /// Loads `path` through `cache`, reusing the normalized dataset while the file is unchanged.
    pub fn open(
        cache: &mut DatasetCache,
        path: impl AsRef<Path>,
        config: PipelineConfig,
    ) -> CotResult<Self> {
        Self::new(cache.get_or_load(path)?, config)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replaces the session parameters, e.g. after the rolling-window selector changed.
    pub fn set_config(&mut self, config: PipelineConfig) -> CotResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Choices for the market selector.
    pub fn markets(&self) -> Vec<String> {
        self.dataset.markets()
    }

    /// The initial selection for `market`: its full date range.
    pub fn default_selection(&self, market: &str) -> Selection {
        Selection::full(&self.dataset, market)
    }

    /// Filters the dataset to `selection` and derives every metric.
    ///
    /// Insufficient data never fails: affected outputs are `None` or `NaN`
    /// and a [`Warning`] is attached (and logged).
    #[tracing::instrument(skip(self), fields(market = %selection.market, range = %selection.range))]
    pub fn analyze(&self, selection: &Selection) -> CotResult<Analysis> {
        let config_hash = self.config.hash()?;
        let observations = filter_selection(self.dataset.observations(), selection);
        let warnings = self.history_warnings(selection, observations.len());
        warnings.iter().for_each(Warning::log);

        let rows = derive(&observations, &self.config);
        let bound = self.config.mom_clip();

        tracing::debug!(rows = rows.len(), %config_hash, "Derived selection");

        Ok(Analysis {
            selection: selection.clone(),
            config_hash,
            nc_monthly: MonthlySeries::from_observations(NetSeries::NcNet, &observations, bound),
            c_monthly: MonthlySeries::from_observations(NetSeries::CNet, &observations, bound),
            kpi: KpiSnapshot::from_observations(&observations),
            latest_sentiment: rows.last().and_then(|r| r.sentiment.clone()),
            rows,
            warnings,
        })
    }

    /// Latest row of every market over its full history.
    pub fn overview(&self) -> MarketOverview {
        MarketOverview::compute(&self.dataset, &self.config)
    }

    fn history_warnings(&self, selection: &Selection, available: usize) -> Vec<Warning> {
        if available == 0 {
            return vec![Warning::EmptySelection {
                market: selection.market.clone(),
                range: selection.range,
            }];
        }

        [
            (HistoryMetric::KpiDelta, KPI_HISTORY),
            (HistoryMetric::Sentiment, self.config.sentiment_history()),
        ]
        .into_iter()
        .filter(|(_, required)| available < *required)
        .map(|(metric, required)| Warning::InsufficientHistory {
            market: selection.market.clone(),
            available,
            required,
            metric,
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{
            filter::DateRange,
            observation::fixtures::{date, weekly},
            source::SourceFingerprint,
        },
        report::kpi::KpiField,
    };

    fn dashboard(legs: &[(f64, f64)]) -> Dashboard {
        let obs = weekly("EURO FX", date(2024, 1, 2), legs, Some(1_000.0));
        let ds = Dataset::from_observations(SourceFingerprint::new("mem.csv", b"x"), obs);
        Dashboard::new(Arc::new(ds), PipelineConfig::default()).expect("Default config is valid")
    }

    #[test]
    fn test_analyze_scenario() {
        let dash = dashboard(&[(100.0, 40.0), (120.0, 50.0), (90.0, 60.0)]);
        let analysis = dash
            .analyze(&dash.default_selection("EURO FX"))
            .expect("Analysis succeeds");

        assert_eq!(analysis.rows.len(), 3);
        let kpi = analysis.kpi.as_ref().expect("Two or more rows");
        let net = kpi.metric(KpiField::NcNet).expect("nc_net tile");
        assert_eq!(net.delta, -40.0);

        assert!(analysis.latest_sentiment.is_none());
        assert_eq!(
            analysis.warnings,
            vec![Warning::InsufficientHistory {
                market: "EURO FX".to_string(),
                available: 3,
                required: 5,
                metric: HistoryMetric::Sentiment,
            }]
        );
    }

    #[test]
    fn test_empty_selection_is_a_warning() {
        let dash = dashboard(&[(1.0, 0.0), (2.0, 0.0)]);
        let range = DateRange::new(date(2030, 1, 1), date(2030, 12, 31)).expect("valid range");
        let analysis = dash
            .analyze(&Selection::new("EURO FX", range))
            .expect("Empty selections do not fail");

        assert!(analysis.is_empty());
        assert!(analysis.kpi.is_none());
        assert!(analysis.nc_monthly.is_empty());
        assert!(matches!(
            analysis.warnings.as_slice(),
            [Warning::EmptySelection { .. }]
        ));
    }

    #[test]
    fn test_single_row_warns_for_both_metrics() {
        let dash = dashboard(&[(1.0, 0.0)]);
        let analysis = dash
            .analyze(&dash.default_selection("EURO FX"))
            .expect("Analysis succeeds");
        assert_eq!(analysis.warnings.len(), 2);
        assert!(analysis.kpi.is_none());
    }

    #[test]
    fn test_enough_history_has_no_warnings() {
        let legs = [(10.0, 0.0), (10.0, 0.0), (10.0, 0.0), (10.0, 0.0), (11.0, 0.0)];
        let dash = dashboard(&legs);
        let analysis = dash
            .analyze(&dash.default_selection("EURO FX"))
            .expect("Analysis succeeds");

        assert!(analysis.warnings.is_empty());
        let s = analysis.latest_sentiment.expect("Five rows cover the lookback");
        assert_eq!(s.label, "Mild Bullish", "10 -> 11 is +10%");
    }

    #[test]
    fn test_set_config_rejects_invalid() {
        let mut dash = dashboard(&[(1.0, 0.0)]);
        let before = dash.config().clone();
        assert!(dash.set_config(PipelineConfig::default().with_lookback_periods(0)).is_err());
        assert_eq!(dash.config(), &before, "Invalid configs are not applied");
    }

    #[test]
    fn test_config_hash_tags_analysis() {
        let dash = dashboard(&[(1.0, 0.0), (2.0, 0.0)]);
        let analysis = dash
            .analyze(&dash.default_selection("EURO FX"))
            .expect("Analysis succeeds");
        assert_eq!(
            analysis.config_hash,
            PipelineConfig::default().hash().expect("hash encodes")
        );
    }
}
