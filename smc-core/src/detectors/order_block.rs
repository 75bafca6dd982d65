//! Order block detection: high-volume swing bars followed by displacement.
//!
//! For each swing point at `i`:
//! 1. Volume spike: `volume[i] > volume_multiplier * avg(volume[i-L..i])`, the
//!    trailing average excluding bar `i`. Short history uses whatever bars
//!    exist; with no prior bar there is no average and the swing is skipped.
//! 2. Displacement: some close in `(i, i+L]` moves at least `displacement_pct`
//!    beyond the zone in the implied direction (above the zone high for a
//!    swing LOW, below the zone low for a swing HIGH).
//!
//! Swing LOW anchors a bullish block, swing HIGH a bearish one. The zone is the
//! anchor bar's high/low. Blocks never expire within a run.
//!
//! Lookahead: L for this stage. Fed with swing points, an order block at `i`
//! depends on bars up to `i + max(W, L)` end to end.

use super::Detector;
use crate::config::{ConfigError, OrderBlockConfig};
use crate::domain::{Bar, Direction, OrderBlock, SwingKind, SwingPoint};

#[derive(Debug, Clone)]
pub struct OrderBlockDetector {
    volume_multiplier: f64,
    lookback: usize,
    displacement_pct: f64,
    name: String,
}

impl OrderBlockDetector {
    pub fn new(config: &OrderBlockConfig) -> Result<Self, ConfigError> {
        if config.lookback == 0 {
            return Err(ConfigError::InvalidLookback(config.lookback));
        }
        if !(config.volume_multiplier.is_finite() && config.volume_multiplier > 0.0) {
            return Err(ConfigError::InvalidMultiplier(config.volume_multiplier));
        }
        if !(config.displacement_pct.is_finite() && config.displacement_pct >= 0.0) {
            return Err(ConfigError::InvalidPercentage {
                field: "order_blocks.displacement_pct",
                value: config.displacement_pct,
            });
        }
        Ok(Self {
            volume_multiplier: config.volume_multiplier,
            lookback: config.lookback,
            displacement_pct: config.displacement_pct,
            name: format!("order_block_{}x{}", config.volume_multiplier, config.lookback),
        })
    }

    /// Detect order blocks in swing order.
    pub fn detect(&self, bars: &[Bar], swings: &[SwingPoint]) -> Vec<OrderBlock> {
        swings
            .iter()
            .filter(|swing| swing.index < bars.len())
            .filter(|swing| self.has_volume_spike(bars, swing.index))
            .filter_map(|swing| {
                let bar = &bars[swing.index];
                let direction = match swing.kind {
                    SwingKind::Low => Direction::Bullish,
                    SwingKind::High => Direction::Bearish,
                };
                self.has_displacement(bars, swing.index, direction)
                    .then_some(OrderBlock {
                        index: swing.index,
                        direction,
                        zone_high: bar.high,
                        zone_low: bar.low,
                    })
            })
            .collect()
    }

    /// Mean volume of up to `lookback` bars strictly before `index`.
    ///
    /// `None` when `index` is outside `bars` or has no earlier bar.
    pub fn trailing_average_volume(&self, bars: &[Bar], index: usize) -> Option<f64> {
        if index >= bars.len() {
            return None;
        }
        let start = index.saturating_sub(self.lookback);
        let history = &bars[start..index];
        if history.is_empty() {
            return None;
        }
        let total: f64 = history.iter().map(|b| b.volume).sum();
        Some(total / history.len() as f64)
    }

    fn has_volume_spike(&self, bars: &[Bar], index: usize) -> bool {
        match self.trailing_average_volume(bars, index) {
            Some(avg) => bars[index].volume > self.volume_multiplier * avg,
            None => false,
        }
    }

    fn has_displacement(&self, bars: &[Bar], index: usize, direction: Direction) -> bool {
        let end = index.saturating_add(self.lookback).min(bars.len() - 1);
        if end <= index {
            return false;
        }
        let anchor = &bars[index];
        let factor = self.displacement_pct / 100.0;
        let forward = &bars[index + 1..=end];

        match direction {
            Direction::Bullish => {
                let target = anchor.high * (1.0 + factor);
                forward.iter().any(|b| b.close > target)
            }
            Direction::Bearish => {
                let target = anchor.low * (1.0 - factor);
                forward.iter().any(|b| b.close < target)
            }
        }
    }
}

impl Detector for OrderBlockDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookahead(&self) -> usize {
        self.lookback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::make_ohlcv_bars;

    fn detector(volume_multiplier: f64, lookback: usize) -> OrderBlockDetector {
        OrderBlockDetector::new(&OrderBlockConfig {
            volume_multiplier,
            lookback,
            displacement_pct: 1.0,
        })
        .unwrap()
    }

    fn low_at(index: usize, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            kind: SwingKind::Low,
            price,
        }
    }

    fn high_at(index: usize, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            kind: SwingKind::High,
            price,
        }
    }

    /// Flat 100-ish bars with volume 1000, a spike at `spike` and a given close path after it.
    fn bars_with_spike(spike: usize, spike_volume: f64, later_close: f64) -> Vec<Bar> {
        let rows: Vec<_> = (0..10)
            .map(|i| {
                if i == spike {
                    (100.0, 101.0, 99.0, 100.0, spike_volume)
                } else if i > spike {
                    let c = later_close;
                    (c, c + 0.5, c - 0.5, c, 1000.0)
                } else {
                    (100.0, 100.5, 99.5, 100.0, 1000.0)
                }
            })
            .collect();
        make_ohlcv_bars(&rows)
    }

    #[test]
    fn bullish_block_at_swing_low_with_spike_and_displacement() {
        // 103 > 101 * 1.01 = 102.01
        let bars = bars_with_spike(4, 2000.0, 103.0);
        let obs = detector(1.5, 5).detect(&bars, &[low_at(4, 99.0)]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].index, 4);
        assert_eq!(obs[0].direction, Direction::Bullish);
        assert_eq!(obs[0].zone_high, 101.0);
        assert_eq!(obs[0].zone_low, 99.0);
    }

    #[test]
    fn bearish_block_at_swing_high() {
        // 97 < 99 * 0.99 = 98.01
        let bars = bars_with_spike(4, 2000.0, 97.0);
        let obs = detector(1.5, 5).detect(&bars, &[high_at(4, 101.0)]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].direction, Direction::Bearish);
    }

    #[test]
    fn no_block_without_volume_spike() {
        // 1500 is not strictly above 1.5 * 1000.
        let bars = bars_with_spike(4, 1500.0, 103.0);
        assert!(detector(1.5, 5).detect(&bars, &[low_at(4, 99.0)]).is_empty());
    }

    #[test]
    fn no_block_without_displacement() {
        // 102 < 102.01
        let bars = bars_with_spike(4, 5000.0, 102.0);
        assert!(detector(1.5, 5).detect(&bars, &[low_at(4, 99.0)]).is_empty());
    }

    #[test]
    fn wrong_direction_displacement_does_not_count() {
        // Price falls after a swing low: not a bullish block.
        let bars = bars_with_spike(4, 5000.0, 90.0);
        assert!(detector(1.5, 5).detect(&bars, &[low_at(4, 99.0)]).is_empty());
    }

    #[test]
    fn displacement_must_happen_within_lookback() {
        let mut rows: Vec<_> = (0..12)
            .map(|_| (100.0, 100.5, 99.5, 100.0, 1000.0))
            .collect();
        rows[3] = (100.0, 101.0, 99.0, 100.0, 5000.0);
        // Displacement only at bar 10, 7 bars after the anchor.
        rows[10] = (103.0, 103.5, 102.5, 103.0, 1000.0);
        let bars = make_ohlcv_bars(&rows);

        assert!(detector(1.5, 5).detect(&bars, &[low_at(3, 99.0)]).is_empty());
        assert_eq!(detector(1.5, 7).detect(&bars, &[low_at(3, 99.0)]).len(), 1);
    }

    #[test]
    fn short_history_uses_available_bars() {
        let det = detector(1.5, 20);
        let bars = bars_with_spike(2, 2000.0, 103.0);
        // Only bars 0 and 1 precede the anchor.
        assert_eq!(det.trailing_average_volume(&bars, 2), Some(1000.0));
        assert_eq!(det.detect(&bars, &[low_at(2, 99.0)]).len(), 1);
    }

    #[test]
    fn trailing_average_excludes_anchor_bar() {
        let det = detector(1.5, 3);
        let bars = bars_with_spike(4, 9000.0, 100.0);
        assert_eq!(det.trailing_average_volume(&bars, 4), Some(1000.0));
        assert_eq!(det.trailing_average_volume(&bars, 0), None);
    }

    #[test]
    fn trailing_average_outside_series_is_none() {
        let det = detector(1.5, 3);
        let bars = bars_with_spike(4, 9000.0, 100.0);
        assert_eq!(det.trailing_average_volume(&bars, 10), None);
        assert_eq!(det.trailing_average_volume(&bars, 500), None);
        assert_eq!(det.trailing_average_volume(&[], 0), None);
    }

    #[test]
    fn huge_lookback_is_capped_at_series_end() {
        let bars = bars_with_spike(4, 2000.0, 103.0);
        let obs = detector(1.5, usize::MAX).detect(&bars, &[low_at(4, 99.0)]);
        assert_eq!(obs.len(), 1);
    }

    #[test]
    fn swing_on_last_bar_has_no_forward_window() {
        let bars = bars_with_spike(9, 5000.0, 100.0);
        assert!(detector(1.5, 5).detect(&bars, &[low_at(9, 99.0)]).is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad_lookback = OrderBlockConfig {
            lookback: 0,
            ..OrderBlockConfig::default()
        };
        assert!(OrderBlockDetector::new(&bad_lookback).is_err());

        let bad_multiplier = OrderBlockConfig {
            volume_multiplier: -1.0,
            ..OrderBlockConfig::default()
        };
        assert!(OrderBlockDetector::new(&bad_multiplier).is_err());
    }

    #[test]
    fn lookahead_equals_lookback() {
        assert_eq!(detector(1.5, 20).lookahead(), 20);
    }
}
