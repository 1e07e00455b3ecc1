use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ConfigError, CotError, CotResult};

/// Net positions within `±DEFAULT_EPSILON` contracts are considered flat.
pub const DEFAULT_EPSILON: f64 = 1e-9;

// ================================================================================================
// Direction
// ================================================================================================

/// Which side the noncommercial (speculative) net position is on.
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
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Classifies a net position. `NaN` yields `None`.
    pub fn from_net(net: f64, epsilon: f64) -> Option<Self> {
        if net.is_nan() {
            None
        } else if net > epsilon {
            Some(Self::Bullish)
        } else if net < -epsilon {
            Some(Self::Bearish)
        } else {
            Some(Self::Neutral)
        }
    }
}

// ================================================================================================
// Intensity
// ================================================================================================

/// One row of the intensity policy: `|delta_pct|` in `[lower, upper)` maps to `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityTier {
    pub lower: f64,
    /// `None` for the open-ended top tier.
    pub upper: Option<f64>,
    pub label: String,
    pub color: String,
    /// Whether a move of this size carries a direction. The lowest tier usually does not.
    pub directional: bool,
}

impl IntensityTier {
    pub fn new(
        lower: f64,
        upper: Option<f64>,
        label: &str,
        color: &str,
        directional: bool,
    ) -> Self {
        Self {
            lower,
            upper,
            label: label.to_string(),
            color: color.to_string(),
            directional,
        }
    }

    pub fn contains(&self, magnitude: f64) -> bool {
        self.lower <= magnitude && self.upper.is_none_or(|upper| magnitude < upper)
    }
}

/// Direction and intensity of the noncommercial positioning at one report date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub direction: Direction,
    pub intensity: IntensityTier,
    pub delta_pct: f64,
    pub label: String,
    pub color: String,
}

/// Ordered threshold table turning net positions and their recent change into
/// a sentiment label and display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPolicy {
    pub epsilon: f64,
    pub tiers: Vec<IntensityTier>,
    pub bullish_color: String,
    pub bearish_color: String,
    pub neutral_color: String,
}

impl Default for SentimentPolicy {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            tiers: vec![
                IntensityTier::new(0.0, Some(5.0), "Neutral", "#9e9e9e", false),
                IntensityTier::new(5.0, Some(15.0), "Mild", "#fff59d", true),
                IntensityTier::new(15.0, Some(30.0), "Moderate", "#ffb74d", true),
                IntensityTier::new(30.0, None, "Strong", "#e53935", true),
            ],
            bullish_color: "#2e7d32".to_string(),
            bearish_color: "#c62828".to_string(),
            neutral_color: "#9e9e9e".to_string(),
        }
    }
}

impl SentimentPolicy {
    /// Checks that tiers start at zero, are contiguous and strictly increasing.
    pub fn validate(&self) -> CotResult<()> {
        let invalid = |msg: String| -> CotError { ConfigError::InvalidIntensityTiers(msg).into() };

        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon).into());
        }

        let (Some(first), Some(last)) = (self.tiers.first(), self.tiers.last()) else {
            return Err(invalid("at least one tier is required".to_string()));
        };
        if first.lower != 0.0 {
            return Err(invalid(format!("first tier must start at 0, got {}", first.lower)));
        }
        if let Some(upper) = last.upper {
            return Err(invalid(format!("last tier must be unbounded, got {upper}")));
        }
        let empty = |t: &&IntensityTier| {
            !t.lower.is_finite() || t.upper.is_some_and(|upper| t.lower >= upper)
        };
        if let Some(t) = self.tiers.iter().find(empty) {
            return Err(invalid(format!(
                "tier '{}' has an empty range starting at {}",
                t.label, t.lower
            )));
        }
        if let Some(w) = self.tiers.windows(2).find(|w| w[0].upper != Some(w[1].lower)) {
            return Err(invalid(format!(
                "tiers '{}' and '{}' are not contiguous",
                w[0].label, w[1].label
            )));
        }
        Ok(())
    }

    pub fn direction(&self, net: f64) -> Option<Direction> {
        Direction::from_net(net, self.epsilon)
    }

    /// Buckets the magnitude of a percent change. `NaN` yields `None`.
    pub fn intensity(&self, delta_pct: f64) -> Option<&IntensityTier> {
        if delta_pct.is_nan() {
            return None;
        }
        let magnitude = delta_pct.abs();
        self.tiers.iter().find(|t| t.contains(magnitude))
    }

    /// Combines direction and intensity, e.g. `"Moderate Bullish"`.
    ///
    /// Returns `None` when either axis is not available.
    pub fn classify(&self, net: f64, delta_pct: f64) -> Option<Sentiment> {
        let direction = self.direction(net)?;
        let intensity = self.intensity(delta_pct)?.clone();

        let (label, color) = match direction {
            Direction::Neutral => (Direction::Neutral.to_string(), self.neutral_color.clone()),
            _ if !intensity.directional => (intensity.label.clone(), self.neutral_color.clone()),
            Direction::Bullish => (
                format!("{} {}", intensity.label, direction),
                self.bullish_color.clone(),
            ),
            Direction::Bearish => (
                format!("{} {}", intensity.label, direction),
                self.bearish_color.clone(),
            ),
        };

        Some(Sentiment {
            direction,
            intensity,
            delta_pct,
            label,
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_axis() {
        let eps = DEFAULT_EPSILON;
        assert_eq!(Direction::from_net(10.0, eps), Some(Direction::Bullish));
        assert_eq!(Direction::from_net(-10.0, eps), Some(Direction::Bearish));
        assert_eq!(Direction::from_net(0.0, eps), Some(Direction::Neutral));
        assert_eq!(Direction::from_net(1e-10, eps), Some(Direction::Neutral));
        assert_eq!(Direction::from_net(f64::NAN, eps), None);
    }

    #[test]
    fn test_intensity_axis_boundaries() {
        let policy = SentimentPolicy::default();
        let label = |d: f64| policy.intensity(d).map(|t| t.label.as_str());

        assert_eq!(label(0.0), Some("Neutral"));
        assert_eq!(label(4.99), Some("Neutral"));
        assert_eq!(label(5.0), Some("Mild"));
        assert_eq!(label(-14.9), Some("Mild"), "Magnitude, not sign");
        assert_eq!(label(15.0), Some("Moderate"));
        assert_eq!(label(30.0), Some("Strong"));
        assert_eq!(label(1e9), Some("Strong"));
        assert_eq!(label(f64::NAN), None);
    }

    #[test]
    fn test_classify_combines_axes() {
        let policy = SentimentPolicy::default();

        let s = policy.classify(5_000.0, 20.0).expect("Both axes available");
        assert_eq!(s.label, "Moderate Bullish");
        assert_eq!(s.color, policy.bullish_color);

        let s = policy.classify(-5_000.0, -45.0).expect("Both axes available");
        assert_eq!(s.label, "Strong Bearish");
        assert_eq!(s.color, policy.bearish_color);

        let s = policy.classify(-5_000.0, 2.0).expect("Both axes available");
        assert_eq!(s.label, "Neutral", "Negligible moves carry no direction");
        assert_eq!(s.direction, Direction::Bearish, "Direction is still reported");

        let s = policy.classify(0.0, 50.0).expect("Both axes available");
        assert_eq!(s.label, "Neutral");

        assert!(policy.classify(100.0, f64::NAN).is_none());
        assert!(policy.classify(f64::NAN, 10.0).is_none());
    }

    #[test]
    fn test_custom_tier_table() {
        let policy = SentimentPolicy {
            tiers: vec![
                IntensityTier::new(0.0, Some(10.0), "Quiet", "#eeeeee", false),
                IntensityTier::new(10.0, None, "Loud", "#000000", true),
            ],
            ..SentimentPolicy::default()
        };
        assert!(policy.validate().is_ok());
        let s = policy.classify(1.0, 12.0).expect("Both axes available");
        assert_eq!(s.label, "Loud Bullish");
        assert_eq!(s.intensity.color, "#000000");
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut policy = SentimentPolicy::default();
        assert!(policy.validate().is_ok());

        policy.tiers[2].lower = 16.0;
        assert!(policy.validate().is_err(), "Gap between tiers");

        let mut policy = SentimentPolicy::default();
        policy.tiers.clear();
        assert!(policy.validate().is_err(), "Empty table");

        let mut policy = SentimentPolicy::default();
        policy.tiers[0].lower = 1.0;
        assert!(policy.validate().is_err(), "Must start at zero");

        let mut policy = SentimentPolicy::default();
        policy.tiers.pop();
        assert!(policy.validate().is_err(), "Must be unbounded above");

        let mut policy = SentimentPolicy::default();
        policy.epsilon = -1.0;
        assert!(policy.validate().is_err());
    }
}
