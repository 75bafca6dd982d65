//! Swing point detection: local highs and lows over a symmetric window.
//!
//! A bar at `i` is a swing HIGH when its high is the maximum (ties included)
//! of the highs in `[i-W, i+W]`, and a swing LOW when its low is the minimum
//! of the lows in the same window. Both tests run independently, so one bar can
//! yield two records.
//!
//! Bars closer than `W` to either end lack context and are never classified.
//!
//! Lookahead: W.

use super::Detector;
use crate::config::{ConfigError, SwingConfig};
use crate::domain::{Bar, SwingKind, SwingPoint};

#[derive(Debug, Clone)]
pub struct SwingDetector {
    window: usize,
    name: String,
}

impl SwingDetector {
    pub fn new(window: usize) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::InvalidWindow(window));
        }
        Ok(Self {
            window,
            name: format!("swing_{window}"),
        })
    }

    pub fn from_config(config: &SwingConfig) -> Result<Self, ConfigError> {
        Self::new(config.window)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Detect all swing points, ordered by index (HIGH before LOW on a shared bar).
    ///
    /// Ties are not deduplicated: every bar sharing the window extreme is emitted.
    /// A series shorter than `2W + 1` yields an empty result.
    pub fn detect(&self, bars: &[Bar]) -> Vec<SwingPoint> {
        let n = bars.len();
        let w = self.window;
        let mut swings = Vec::new();

        if n < w.saturating_mul(2).saturating_add(1) {
            return swings;
        }

        for i in w..n - w {
            let window = &bars[i - w..=i + w];
            let bar = &bars[i];

            let max_high = window
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            if bar.high >= max_high {
                swings.push(SwingPoint {
                    index: i,
                    kind: SwingKind::High,
                    price: bar.high,
                });
            }

            let min_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            if bar.low <= min_low {
                swings.push(SwingPoint {
                    index: i,
                    kind: SwingKind::Low,
                    price: bar.low,
                });
            }
        }

        swings
    }
}

impl Detector for SwingDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookahead(&self) -> usize {
        self.window
    }
}
