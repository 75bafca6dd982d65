//! Fair value gap detection: three-bar price discontinuities.
//!
//! For bars `i-2, i-1, i`:
//! - Bullish: `low[i] > high[i-2]`, gap `[high[i-2], low[i]]`,
//!   `gap_pct = (low[i] - high[i-2]) / high[i-2] * 100`
//! - Bearish: `high[i] < low[i-2]`, gap `[high[i], low[i-2]]`,
//!   `gap_pct = (low[i-2] - high[i]) / high[i] * 100`
//!
//! A gap is recorded only when `gap_pct >= min_gap_pct`. The middle bar is not
//! examined. On well-formed bars the two conditions are mutually exclusive.
//!
//! Lookahead: 0 (uses only `i-2..=i`).

use super::Detector;
use crate::config::{ConfigError, FvgConfig};
use crate::domain::{Bar, Direction, FairValueGap};

#[derive(Debug, Clone)]
pub struct FairValueGapDetector {
    min_gap_pct: f64,
    name: String,
}

impl FairValueGapDetector {
    pub fn new(min_gap_pct: f64) -> Result<Self, ConfigError> {
        if !(min_gap_pct.is_finite() && min_gap_pct >= 0.0) {
            return Err(ConfigError::InvalidPercentage {
                field: "fvg.min_gap_pct",
                value: min_gap_pct,
            });
        }
        Ok(Self {
            min_gap_pct,
            name: format!("fvg_{min_gap_pct}"),
        })
    }

    pub fn from_config(config: &FvgConfig) -> Result<Self, ConfigError> {
        Self::new(config.min_gap_pct)
    }

    /// Detect all gaps, ordered by index.
    pub fn detect(&self, bars: &[Bar]) -> Vec<FairValueGap> {
        let mut gaps = Vec::new();

        for i in 2..bars.len() {
            let current = &bars[i];
            let first = &bars[i - 2];

            if current.low > first.high {
                let gap_pct = (current.low - first.high) / first.high * 100.0;
                if gap_pct >= self.min_gap_pct {
                    gaps.push(FairValueGap {
                        index: i,
                        direction: Direction::Bullish,
                        gap_high: current.low,
                        gap_low: first.high,
                        gap_pct,
                    });
                }
            }

            if current.high < first.low {
                let gap_pct = (first.low - current.high) / current.high * 100.0;
                if gap_pct >= self.min_gap_pct {
                    gaps.push(FairValueGap {
                        index: i,
                        direction: Direction::Bearish,
                        gap_high: first.low,
                        gap_low: current.high,
                        gap_pct,
                    });
                }
            }
        }

        gaps
    }
}

impl Detector for FairValueGapDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookahead(&self) -> usize {
        0
    }
}
