//! Market structure: trend state machine with BoS / MSB events.
//!
//! Walks the bars in order while tracking the most recent *confirmed* swing
//! high and low. A swing at index `s` is confirmed at bar `s + W`, once its
//! right-hand window has closed, so no event at bar `i` depends on bars after
//! `i`.
//!
//! States: `RANGE`, `UPTREND`, `DOWNTREND`. The walk starts from the
//! analyzer's initial trend, `RANGE` unless the caller knows better.
//! - `RANGE` → `UPTREND` when the last two confirmed highs and the last two
//!   confirmed lows are both strictly rising; `DOWNTREND` when both are falling.
//!   No break events fire while in `RANGE`.
//! - `UPTREND`: close below the last low → MSB bearish, flip to `DOWNTREND`;
//!   otherwise close above the last high → BoS bullish.
//! - `DOWNTREND`: close above the last high → MSB bullish, flip to `UPTREND`;
//!   otherwise close below the last low → BoS bearish.
//!
//! MSB is checked first, so a bar that breaks both stale references reports
//! the reversal. A level that produced an event is consumed until a new swing
//! of the same kind confirms.
//!
//! Lookahead: 0.

use super::Detector;
use crate::config::{ConfigError, SmcConfig};
use crate::domain::{Bar, Direction, StructureEvent, StructureKind, SwingKind, SwingPoint, Trend};
use serde::{Deserialize, Serialize};

/// Output of a full structure walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub events: Vec<StructureEvent>,
    /// Trend state after processing each bar; same length as the input.
    pub trend_by_bar: Vec<Trend>,
    pub final_trend: Trend,
}

#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    window: usize,
    initial_trend: Trend,
}

impl StructureAnalyzer {
    /// `window` is the swing window the swing points were detected with.
    pub fn new(window: usize) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::InvalidWindow(window));
        }
        Ok(Self {
            window,
            initial_trend: Trend::Range,
        })
    }

    pub fn from_config(config: &SmcConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.swing.window)?.with_initial_trend(config.structure.initial_trend))
    }

    /// Seed the state machine with a trend carried over from earlier history.
    pub fn with_initial_trend(mut self, trend: Trend) -> Self {
        self.initial_trend = trend;
        self
    }

    pub fn initial_trend(&self) -> Trend {
        self.initial_trend
    }

    /// Run the state machine over the full series.
    ///
    /// `swings` must be ordered by index, as produced by
    /// [`SwingDetector`](super::SwingDetector).
    pub fn analyze(&self, bars: &[Bar], swings: &[SwingPoint]) -> StructureAnalysis {
        let mut state = StructureState {
            trend: self.initial_trend,
            ..StructureState::default()
        };
        let mut events = Vec::new();
        let mut trend_by_bar = Vec::with_capacity(bars.len());
        let mut cursor = 0;

        for (i, bar) in bars.iter().enumerate() {
            while cursor < swings.len() && swings[cursor].confirmed_at(self.window) <= i {
                state.confirm(&swings[cursor]);
                cursor += 1;
            }

            if let Some((kind, direction)) = state.evaluate(bar.close) {
                events.push(StructureEvent {
                    index: i,
                    kind,
                    direction,
                });
            }

            trend_by_bar.push(state.trend);
        }

        StructureAnalysis {
            events,
            trend_by_bar,
            final_trend: state.trend,
        }
    }
}

impl Detector for StructureAnalyzer {
    fn name(&self) -> &str {
        "market_structure"
    }

    fn lookahead(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy)]
struct Level {
    price: f64,
    broken: bool,
}

#[derive(Debug, Default)]
struct StructureState {
    trend: Trend,
    last_high: Option<Level>,
    prev_high: Option<f64>,
    last_low: Option<Level>,
    prev_low: Option<f64>,
}

impl StructureState {
    fn confirm(&mut self, swing: &SwingPoint) {
        let fresh = Level {
            price: swing.price,
            broken: false,
        };
        match swing.kind {
            SwingKind::High => {
                self.prev_high = self.last_high.map(|l| l.price);
                self.last_high = Some(fresh);
            }
            SwingKind::Low => {
                self.prev_low = self.last_low.map(|l| l.price);
                self.last_low = Some(fresh);
            }
        }

        if self.trend == Trend::Range {
            self.trend = self.range_breakout();
        }
    }

    fn range_breakout(&self) -> Trend {
        let (Some(prev_high), Some(high), Some(prev_low), Some(low)) =
            (self.prev_high, self.last_high, self.prev_low, self.last_low)
        else {
            return Trend::Range;
        };

        if high.price > prev_high && low.price > prev_low {
            Trend::Uptrend
        } else if high.price < prev_high && low.price < prev_low {
            Trend::Downtrend
        } else {
            Trend::Range
        }
    }

    fn evaluate(&mut self, close: f64) -> Option<(StructureKind, Direction)> {
        let below_low = unbroken_level(self.last_low).is_some_and(|p| close < p);
        let above_high = unbroken_level(self.last_high).is_some_and(|p| close > p);

        match self.trend {
            Trend::Uptrend if below_low => {
                self.consume_low();
                self.trend = Trend::Downtrend;
                Some((StructureKind::Msb, Direction::Bearish))
            }
            Trend::Uptrend if above_high => {
                self.consume_high();
                Some((StructureKind::Bos, Direction::Bullish))
            }
            Trend::Downtrend if above_high => {
                self.consume_high();
                self.trend = Trend::Uptrend;
                Some((StructureKind::Msb, Direction::Bullish))
            }
            Trend::Downtrend if below_low => {
                self.consume_low();
                Some((StructureKind::Bos, Direction::Bearish))
            }
            _ => None,
        }
    }

    fn consume_high(&mut self) {
        if let Some(level) = self.last_high.as_mut() {
            level.broken = true;
        }
    }

    fn consume_low(&mut self) {
        if let Some(level) = self.last_low.as_mut() {
            level.broken = true;
        }
    }
}

fn unbroken_level(level: Option<Level>) -> Option<f64> {
    level.filter(|l| !l.broken).map(|l| l.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::make_ohlcv_bars;

    fn closes(values: &[f64]) -> Vec<Bar> {
        let rows: Vec<_> = values.iter().map(|&c| (c, c, c, c, 1000.0)).collect();
        make_ohlcv_bars(&rows)
    }

    fn swing(index: usize, kind: SwingKind, price: f64) -> SwingPoint {
        SwingPoint { index, kind, price }
    }

    fn ev(index: usize, kind: StructureKind, direction: Direction) -> StructureEvent {
        StructureEvent {
            index,
            kind,
            direction,
        }
    }

    #[test]
    fn higher_highs_and_lows_start_uptrend_then_bos() {
        let swings = [
            swing(1, SwingKind::Low, 90.0),
            swing(2, SwingKind::High, 110.0),
            swing(3, SwingKind::Low, 95.0),
            swing(4, SwingKind::High, 115.0),
        ];
        let bars = closes(&[100.0, 92.0, 108.0, 97.0, 112.0, 100.0, 116.0, 117.0]);
        let analysis = StructureAnalyzer::new(1).unwrap().analyze(&bars, &swings);

        assert_eq!(
            analysis.events,
            vec![ev(6, StructureKind::Bos, Direction::Bullish)]
        );
        assert_eq!(&analysis.trend_by_bar[..5], &[Trend::Range; 5]);
        assert_eq!(&analysis.trend_by_bar[5..], &[Trend::Uptrend; 3]);
        assert_eq!(analysis.final_trend, Trend::Uptrend);
    }

    #[test]
    fn msb_flips_trend_and_consumes_level() {
        let swings = [
            swing(1, SwingKind::Low, 90.0),
            swing(2, SwingKind::High, 110.0),
            swing(3, SwingKind::Low, 95.0),
            swing(4, SwingKind::High, 115.0),
            swing(8, SwingKind::Low, 93.0),
        ];
        let bars = closes(&[
            100.0, 92.0, 108.0, 97.0, 112.0, 100.0, 116.0, 117.0, 94.0, 90.0, 89.0,
        ]);
        let analysis = StructureAnalyzer::new(1).unwrap().analyze(&bars, &swings);

        assert_eq!(
            analysis.events,
            vec![
                ev(6, StructureKind::Bos, Direction::Bullish),
                ev(8, StructureKind::Msb, Direction::Bearish),
                // New swing low at 8 confirms at 9 and is broken the same bar.
                ev(9, StructureKind::Bos, Direction::Bearish),
            ]
        );
        assert_eq!(analysis.final_trend, Trend::Downtrend);
    }

    #[test]
    fn msb_wins_over_bos_on_stale_levels() {
        let swings = [
            swing(1, SwingKind::Low, 90.0),
            swing(2, SwingKind::High, 100.0),
            swing(3, SwingKind::Low, 95.0),
            swing(4, SwingKind::High, 105.0),
            swing(5, SwingKind::Low, 110.0),
        ];
        let bars = closes(&[97.0, 91.0, 99.0, 96.0, 104.0, 104.0, 107.0]);
        let analysis = StructureAnalyzer::new(1).unwrap().analyze(&bars, &swings);

        // Bar 6 closes above the stale high (105) and below the fresh low (110).
        assert_eq!(
            analysis.events,
            vec![ev(6, StructureKind::Msb, Direction::Bearish)]
        );
        assert_eq!(analysis.final_trend, Trend::Downtrend);
    }

    #[test]
    fn downtrend_bos_then_bullish_reversal() {
        let swings = [
            swing(1, SwingKind::High, 110.0),
            swing(2, SwingKind::Low, 100.0),
            swing(3, SwingKind::High, 105.0),
            swing(4, SwingKind::Low, 95.0),
        ];
        let bars = closes(&[108.0, 109.0, 101.0, 104.0, 96.0, 94.0, 106.0]);
        let analysis = StructureAnalyzer::new(1).unwrap().analyze(&bars, &swings);

        assert_eq!(
            analysis.events,
            vec![
                ev(5, StructureKind::Bos, Direction::Bearish),
                ev(6, StructureKind::Msb, Direction::Bullish),
            ]
        );
        assert_eq!(analysis.trend_by_bar[5], Trend::Downtrend);
        assert_eq!(analysis.final_trend, Trend::Uptrend);
    }

    #[test]
    fn mixed_swings_stay_in_range_without_events() {
        // Higher high but lower low: expanding range.
        let swings = [
            swing(1, SwingKind::High, 110.0),
            swing(2, SwingKind::Low, 95.0),
            swing(3, SwingKind::High, 115.0),
            swing(4, SwingKind::Low, 90.0),
        ];
        let bars = closes(&[100.0, 109.0, 96.0, 114.0, 91.0, 130.0, 70.0]);
        let analysis = StructureAnalyzer::new(1).unwrap().analyze(&bars, &swings);

        assert!(analysis.events.is_empty());
        assert!(analysis.trend_by_bar.iter().all(|t| *t == Trend::Range));
    }

    #[test]
    fn swings_are_not_used_before_confirmation() {
        // With W = 3 the swing high at 2 is only known from bar 5 on.
        let swings = [
            swing(1, SwingKind::Low, 90.0),
            swing(2, SwingKind::High, 110.0),
            swing(3, SwingKind::Low, 95.0),
            swing(4, SwingKind::High, 115.0),
        ];
        let bars = closes(&[100.0; 10]);
        let analysis = StructureAnalyzer::new(3).unwrap().analyze(&bars, &swings);
        assert_eq!(analysis.trend_by_bar[6], Trend::Range);
        assert_eq!(analysis.trend_by_bar[7], Trend::Uptrend);
    }

    #[test]
    fn downtrend_seed_reverses_on_first_break_without_warmup() {
        // A single confirmed high is not enough to leave RANGE, but a seeded
        // DOWNTREND reacts to it immediately.
        let swings = [swing(1, SwingKind::High, 105.0)];
        let bars = closes(&[100.0, 104.0, 101.0, 106.0, 107.0]);

        let seeded = StructureAnalyzer::new(1)
            .unwrap()
            .with_initial_trend(Trend::Downtrend)
            .analyze(&bars, &swings);
        assert_eq!(
            seeded.events,
            vec![ev(3, StructureKind::Msb, Direction::Bullish)]
        );
        assert_eq!(&seeded.trend_by_bar[..3], &[Trend::Downtrend; 3]);
        assert_eq!(seeded.final_trend, Trend::Uptrend);

        let unseeded = StructureAnalyzer::new(1).unwrap().analyze(&bars, &swings);
        assert!(unseeded.events.is_empty());
        assert_eq!(unseeded.final_trend, Trend::Range);
    }

    #[test]
    fn initial_trend_comes_from_config() {
        let mut config = SmcConfig::default();
        config.structure.initial_trend = Trend::Uptrend;
        let analyzer = StructureAnalyzer::from_config(&config).unwrap();
        assert_eq!(analyzer.initial_trend(), Trend::Uptrend);
        assert_eq!(StructureAnalyzer::new(5).unwrap().initial_trend(), Trend::Range);
    }

    #[test]
    fn seeded_trend_persists_on_empty_series() {
        let analysis = StructureAnalyzer::new(2)
            .unwrap()
            .with_initial_trend(Trend::Downtrend)
            .analyze(&[], &[]);
        assert_eq!(analysis.final_trend, Trend::Downtrend);
    }

    #[test]
    fn empty_series_is_range() {
        let analysis = StructureAnalyzer::new(5).unwrap().analyze(&[], &[]);
        assert!(analysis.events.is_empty());
        assert!(analysis.trend_by_bar.is_empty());
        assert_eq!(analysis.final_trend, Trend::Range);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(StructureAnalyzer::new(0).is_err());
    }
}
