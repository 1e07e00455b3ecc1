use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::data::filter::DateRange;

/// Metrics that need more than one observation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum HistoryMetric {
    KpiDelta,
    Sentiment,
}

/// Non-fatal conditions of one analysis pass. The affected outputs are
/// reported as not available; everything else is still computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// The market and date filter matched no rows.
    EmptySelection { market: String, range: DateRange },
    InsufficientHistory {
        market: String,
        available: usize,
        required: usize,
        metric: HistoryMetric,
    },
}

impl Warning {
    /// Emits the warning as a structured `tracing` event.
    pub fn log(&self) {
        match self {
            Self::EmptySelection { market, range } => {
                tracing::warn!(%market, %range, "No observations in the selected range");
            }
            Self::InsufficientHistory {
                market,
                available,
                required,
                metric,
            } => {
                tracing::warn!(
                    %market,
                    available,
                    required,
                    %metric,
                    "Insufficient history: metric reported as not available"
                );
            }
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySelection { market, range } => {
                write!(f, "No data for '{market}' in {range}")
            }
            Self::InsufficientHistory {
                market,
                available,
                required,
                metric,
            } => write!(
                f,
                "'{market}' has {available} observation(s), {metric} needs at least {required}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::observation::fixtures::date;

    #[test]
    fn test_display() {
        let w = Warning::InsufficientHistory {
            market: "GOLD".to_string(),
            available: 3,
            required: 5,
            metric: HistoryMetric::Sentiment,
        };
        assert_eq!(
            w.to_string(),
            "'GOLD' has 3 observation(s), sentiment needs at least 5"
        );

        let range = DateRange::new(date(2030, 1, 1), date(2030, 12, 31)).expect("valid range");
        let w = Warning::EmptySelection {
            market: "GOLD".to_string(),
            range,
        };
        assert_eq!(w.to_string(), "No data for 'GOLD' in 2030-01-01..=2030-12-31");
    }
}
