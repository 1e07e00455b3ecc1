use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, CotError, CotResult},
    math::sentiment::SentimentPolicy,
};

// ================================================================================================
// Domain Strong Types (NewTypes)
// ================================================================================================

/// Trailing window of the COT index, in report weeks.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16")]
pub struct RollingWindow(u16);

impl RollingWindow {
    /// The widths offered by the window selector.
    pub const PRESETS: [u16; 5] = [26, 52, 78, 104, 156];

    /// Floor of the minimum-periods rule `max(5, floor(0.2 * W))`, and the
    /// narrowest window that can ever define an index.
    pub const MIN_WEEKS: u16 = 5;

    pub fn new(weeks: u16) -> CotResult<Self> {
        if weeks < Self::MIN_WEEKS {
            return Err(ConfigError::InvalidRollingWindow(weeks).into());
        }
        Ok(Self(weeks))
    }

    pub fn weeks(&self) -> u16 {
        self.0
    }

    /// Valid observations required before the index is defined: `max(5, floor(0.2 * W))`.
    pub fn min_periods(&self) -> usize {
        (Self::MIN_WEEKS as usize).max(self.0 as usize / 5)
    }
}

impl TryFrom<u16> for RollingWindow {
    type Error = CotError;

    fn try_from(weeks: u16) -> CotResult<Self> {
        Self::new(weeks)
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self(52)
    }
}

/// Symmetric display bound `[-C, C]` for month-over-month percentages.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct MomClip(f64);

impl MomClip {
    /// The range offered by the clip selector.
    pub const SELECTOR_RANGE: RangeInclusive<f64> = 10.0..=500.0;

    pub fn new(bound: f64) -> CotResult<Self> {
        if !bound.is_finite() || bound <= 0.0 {
            return Err(ConfigError::InvalidClipBound(bound).into());
        }
        Ok(Self(bound))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for MomClip {
    type Error = CotError;

    fn try_from(bound: f64) -> CotResult<Self> {
        Self::new(bound)
    }
}

impl Default for MomClip {
    fn default() -> Self {
        Self(100.0)
    }
}

// ================================================================================================
// Pipeline Configuration
// ================================================================================================

/// Parameters of one derive pass. Passed explicitly; there is no global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    rolling_window: RollingWindow,
    mom_clip: Option<MomClip>,
    sentiment: SentimentPolicy,
    /// Positional lookback of the sentiment delta. Assumes one report per week.
    lookback_periods: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rolling_window: RollingWindow::default(),
            mom_clip: Some(MomClip::default()),
            sentiment: SentimentPolicy::default(),
            lookback_periods: 4,
        }
    }
}

impl PipelineConfig {
    pub fn with_rolling_window(self, rolling_window: RollingWindow) -> Self {
        Self {
            rolling_window,
            ..self
        }
    }

    pub fn with_mom_clip(self, mom_clip: Option<MomClip>) -> Self {
        Self { mom_clip, ..self }
    }

    pub fn with_sentiment(self, sentiment: SentimentPolicy) -> Self {
        Self { sentiment, ..self }
    }

    pub fn with_lookback_periods(self, lookback_periods: usize) -> Self {
        Self {
            lookback_periods,
            ..self
        }
    }

    pub fn rolling_window(&self) -> RollingWindow {
        self.rolling_window
    }

    pub fn mom_clip(&self) -> Option<MomClip> {
        self.mom_clip
    }

    pub fn sentiment(&self) -> &SentimentPolicy {
        &self.sentiment
    }

    pub fn lookback_periods(&self) -> usize {
        self.lookback_periods
    }

    /// Observations needed before the sentiment delta is defined.
    pub fn sentiment_history(&self) -> usize {
        self.lookback_periods + 1
    }

    /// Validates every parameter, including ones built through deserialization.
    pub fn validate(&self) -> CotResult<()> {
        RollingWindow::new(self.rolling_window.weeks())?;
        if let Some(clip) = self.mom_clip {
            MomClip::new(clip.value())?;
        }
        if self.lookback_periods == 0 {
            return Err(ConfigError::InvalidLookback(self.lookback_periods).into());
        }
        self.sentiment.validate()
    }

    /// Computes a deterministic hash of this configuration.
    ///
    /// Used to tag exports and log lines with the parameters that produced them.
    pub fn hash(&self) -> CotResult<String> {
        let mut hasher = blake3::Hasher::new();
        let bytes = postcard::to_stdvec(self).map_err(ConfigError::Encoding)?;
        hasher.update(&bytes);
        Ok(format!("{}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_periods_rule() {
        let cases = [(26, 5), (52, 10), (78, 15), (104, 20), (156, 31), (10, 5), (5, 5)];
        for (weeks, want) in cases {
            let w = RollingWindow::new(weeks).expect("valid window");
            assert_eq!(w.min_periods(), want, "min_periods for W={weeks}");
        }
    }

    #[test]
    fn test_rolling_window_rejects_narrow_windows() {
        for weeks in [0, 1, 4] {
            assert!(RollingWindow::new(weeks).is_err(), "W={weeks} can never fill");
        }
        assert!(RollingWindow::new(5).is_ok());
        assert_eq!(RollingWindow::default().weeks(), 52);
    }

    #[test]
    fn test_mom_clip_validation() {
        assert!(MomClip::new(50.0).is_ok());
        assert!(MomClip::new(0.0).is_err());
        assert!(MomClip::new(-1.0).is_err());
        assert!(MomClip::new(f64::NAN).is_err());
        assert!(MomClip::new(f64::INFINITY).is_err());
        assert!(MomClip::SELECTOR_RANGE.contains(&MomClip::default().value()));
    }

    #[test]
    fn test_config_builders_and_validation() {
        let cfg = PipelineConfig::default()
            .with_rolling_window(RollingWindow::new(104).expect("valid window"))
            .with_mom_clip(None)
            .with_lookback_periods(2);
        assert_eq!(cfg.rolling_window().weeks(), 104);
        assert_eq!(cfg.mom_clip(), None);
        assert_eq!(cfg.sentiment_history(), 3);
        assert!(cfg.validate().is_ok());

        let bad = PipelineConfig::default().with_lookback_periods(0);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_hash_is_deterministic_and_sensitive() {
        let a = PipelineConfig::default();
        let b = PipelineConfig::default();
        let c = PipelineConfig::default()
            .with_rolling_window(RollingWindow::new(26).expect("valid window"));

        let ha = a.hash().expect("hash should encode");
        assert_eq!(ha, b.hash().expect("hash should encode"));
        assert_ne!(ha, c.hash().expect("hash should encode"));
        assert_eq!(ha.len(), 64, "blake3 hex digest");
    }

    #[test]
    fn test_config_json_round_trip_validates() {
        let json = serde_json::to_string(&PipelineConfig::default().with_mom_clip(None))
            .expect("serialize");
        let cfg: PipelineConfig = serde_json::from_str(&json).expect("deserialize");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_deserialization_runs_constructor_checks() {
        let json = |window: u16, clip: &str| {
            serde_json::to_string(&PipelineConfig::default())
                .expect("serialize")
                .replace("\"rolling_window\":52", &format!("\"rolling_window\":{window}"))
                .replace("\"mom_clip\":100.0", &format!("\"mom_clip\":{clip}"))
        };

        let ok: PipelineConfig = serde_json::from_str(&json(26, "50.0")).expect("valid config");
        assert_eq!(ok.rolling_window().weeks(), 26);
        assert_eq!(ok.mom_clip().map(|c| c.value()), Some(50.0));

        assert!(serde_json::from_str::<PipelineConfig>(&json(52, "-5.0")).is_err());
        assert!(serde_json::from_str::<PipelineConfig>(&json(52, "0.0")).is_err());
        assert!(serde_json::from_str::<PipelineConfig>(&json(0, "100.0")).is_err());
        assert!(serde_json::from_str::<MomClip>("-5.0").is_err());
    }
}
