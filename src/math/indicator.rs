use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::RollingWindow;

/// A trait for incremental indicators.
/// Designed to be object-safe so callers can hold `Box<dyn StreamingIndicator>`.
pub trait StreamingIndicator: std::fmt::Debug + Send + Sync {
    /// Update the indicator with the latest scalar value (e.g., a net position).
    /// Returns `Some(value)` if the indicator is defined at this step, otherwise `None`.
    fn update(&mut self, value: f64) -> Option<f64>;

    /// Reset the internal state to clear history (e.g., when the market changes).
    fn reset(&mut self);
}

// ================================================================================================
// COT Index: Rolling Min-Max Percentile
// ================================================================================================

/// Rolling min-max position of the latest value inside its trailing window,
/// scaled to `[0, 100]`.
///
/// The window spans the last `window` updates. Non-finite updates occupy a
/// slot but do not count as valid observations. The index is undefined when:
/// - fewer than `min_periods` valid values are in the window,
/// - the latest value is not finite,
/// - the window has zero range (`max == min`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingRangeIndex {
    window_size: usize,
    min_periods: usize,
    buffer: VecDeque<f64>,
}

impl RollingRangeIndex {
    pub fn new(window: RollingWindow) -> Self {
        let size = window.weeks() as usize;
        Self {
            window_size: size,
            min_periods: window.min_periods(),
            buffer: VecDeque::with_capacity(size),
        }
    }

    fn window_extremes(&self) -> Option<(f64, f64)> {
        let mut count = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in self.buffer.iter().filter(|v| v.is_finite()) {
            count += 1;
            min = min.min(*v);
            max = max.max(*v);
        }
        (count >= self.min_periods).then_some((min, max))
    }
}

impl StreamingIndicator for RollingRangeIndex {
    fn update(&mut self, value: f64) -> Option<f64> {
        self.buffer.push_back(value);
        if self.buffer.len() > self.window_size {
            self.buffer.pop_front();
        }

        if !value.is_finite() {
            return None;
        }

        let (min, max) = self.window_extremes()?;
        let range = max - min;
        if range <= 0.0 {
            // Zero-variance window
            return None;
        }

        Some(100.0 * (value - min) / range)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Runs `indicator` over `values` from a clean state, mapping undefined steps to `NaN`.
pub fn run_indicator<I>(indicator: &mut I, values: &[f64]) -> Vec<f64>
where
    I: StreamingIndicator + ?Sized,
{
    indicator.reset();
    values
        .iter()
        .map(|v| indicator.update(*v).unwrap_or(f64::NAN))
        .collect()
}

/// COT index of a date-ascending net position series.
pub fn cot_index(net: &[f64], window: RollingWindow) -> Vec<f64> {
    run_indicator(&mut RollingRangeIndex::new(window), net)
}
