//! Analysis pipeline: bars → swings → {order blocks, structure}, FVGs → score.
//!
//! [`analyze`] is a pure function of its inputs. It performs no I/O, holds no
//! state between calls and can be invoked from any number of threads at once.

use crate::config::{ConfigError, SmcConfig};
use crate::detectors::{
    Detector, FairValueGapDetector, OrderBlockDetector, StructureAnalyzer, SwingDetector,
};
use crate::domain::{Bar, FairValueGap, OrderBlock, StructureEvent, SwingPoint, Trend};
use crate::scoring::{ScoreAggregator, SmcResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Whether the series was long enough to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Complete,
    /// Fewer bars than `2W + 1`. The result is neutral and every collection empty.
    InsufficientData { required: usize, available: usize },
}

/// Result plus every intermediate collection, for diagnostics or persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmcAnalysis {
    pub status: AnalysisStatus,
    pub result: SmcResult,
    pub swings: Vec<SwingPoint>,
    pub order_blocks: Vec<OrderBlock>,
    pub fair_value_gaps: Vec<FairValueGap>,
    pub structure_events: Vec<StructureEvent>,
    /// One trend state per input bar.
    pub trend_by_bar: Vec<Trend>,
}

impl SmcAnalysis {
    fn insufficient(bars: usize, required: usize) -> Self {
        Self {
            status: AnalysisStatus::InsufficientData {
                required,
                available: bars,
            },
            result: SmcResult::neutral(),
            swings: Vec::new(),
            order_blocks: Vec::new(),
            fair_value_gaps: Vec::new(),
            structure_events: Vec::new(),
            trend_by_bar: vec![Trend::Range; bars],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }
}

/// Per-bar score from [`rolling_scores`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingScore {
    /// Absolute index of the last bar in the analyzed slice.
    pub index: usize,
    pub result: SmcResult,
}

/// The validated set of components for one configuration.
struct Pipeline {
    swing: SwingDetector,
    order_blocks: OrderBlockDetector,
    fvg: FairValueGapDetector,
    structure: StructureAnalyzer,
    scoring: ScoreAggregator,
    min_bars: usize,
}

impl Pipeline {
    fn new(config: &SmcConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pipeline = Self {
            swing: SwingDetector::from_config(&config.swing)?,
            order_blocks: OrderBlockDetector::new(&config.order_blocks)?,
            fvg: FairValueGapDetector::from_config(&config.fvg)?,
            structure: StructureAnalyzer::from_config(config)?,
            scoring: ScoreAggregator::new(&config.scoring)?,
            min_bars: config.min_bars(),
        };
        trace!(
            swing = pipeline.swing.name(),
            order_blocks = pipeline.order_blocks.name(),
            fvg = pipeline.fvg.name(),
            structure = pipeline.structure.name(),
            lookahead = pipeline.lookahead(),
            initial_trend = ?pipeline.structure.initial_trend(),
            "pipeline ready"
        );
        Ok(pipeline)
    }

    /// End-to-end look-ahead of any recorded output: order blocks need their
    /// swing confirmed and their displacement window closed.
    fn lookahead(&self) -> usize {
        let order_blocks = self.swing.lookahead().max(self.order_blocks.lookahead());
        order_blocks
            .max(self.fvg.lookahead())
            .max(self.structure.lookahead())
    }

    fn run(&self, bars: &[Bar]) -> SmcAnalysis {
        if bars.len() < self.min_bars {
            debug!(
                bars = bars.len(),
                required = self.min_bars,
                "insufficient data, returning neutral result"
            );
            return SmcAnalysis::insufficient(bars.len(), self.min_bars);
        }

        let swings = self.swing.detect(bars);
        let order_blocks = self.order_blocks.detect(bars, &swings);
        let fair_value_gaps = self.fvg.detect(bars);
        let structure = self.structure.analyze(bars, &swings);
        trace!(
            swings = swings.len(),
            order_blocks = order_blocks.len(),
            fair_value_gaps = fair_value_gaps.len(),
            structure_events = structure.events.len(),
            "detectors finished"
        );

        let result = self.scoring.aggregate(
            &order_blocks,
            &fair_value_gaps,
            &structure.events,
            structure.final_trend,
        );

        SmcAnalysis {
            status: AnalysisStatus::Complete,
            result,
            swings,
            order_blocks,
            fair_value_gaps,
            structure_events: structure.events,
            trend_by_bar: structure.trend_by_bar,
        }
    }
}

/// Run the full SMC analysis over `bars`.
///
/// Fails only on invalid configuration. A series shorter than the swing
/// window requires is not an error: it yields a neutral `HOLD` result with
/// [`AnalysisStatus::InsufficientData`].
pub fn analyze(bars: &[Bar], config: &SmcConfig) -> Result<SmcAnalysis, ConfigError> {
    let pipeline = Pipeline::new(config)?;
    let analysis = pipeline.run(bars);
    debug!(
        bars = bars.len(),
        score = analysis.result.score,
        signal = ?analysis.result.signal,
        trend = ?analysis.result.trend,
        "smc analysis complete"
    );
    Ok(analysis)
}

/// Score every bar using only the `window` bars ending at it.
///
/// Bar `i` is scored on `bars[i + 1 - window ..= i]` (or `bars[..= i]` while
/// fewer than `window` bars exist), so no score depends on later bars. Slices
/// too short for the swing window score neutral.
pub fn rolling_scores(
    bars: &[Bar],
    config: &SmcConfig,
    window: usize,
) -> Result<Vec<RollingScore>, ConfigError> {
    if window == 0 {
        return Err(ConfigError::InvalidRollingWindow(window));
    }
    let pipeline = Pipeline::new(config)?;

    let scores = (0..bars.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            RollingScore {
                index: i,
                result: pipeline.run(&bars[start..=i]).result,
            }
        })
        .collect();

    debug!(bars = bars.len(), window, "rolling scores complete");
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::random_walk;
    use crate::scoring::Signal;

    #[test]
    fn short_series_is_neutral_not_error() {
        let bars = random_walk(10, 1);
        let analysis = analyze(&bars, &SmcConfig::default()).unwrap();
        assert_eq!(
            analysis.status,
            AnalysisStatus::InsufficientData {
                required: 11,
                available: 10
            }
        );
        assert_eq!(analysis.result.signal, Signal::Hold);
        assert_eq!(analysis.result.counts.bullish_signals, 0);
        assert!(analysis.swings.is_empty());
        assert!(analysis.fair_value_gaps.is_empty());
        assert_eq!(analysis.trend_by_bar.len(), 10);
    }

    #[test]
    fn empty_series_is_neutral() {
        let analysis = analyze(&[], &SmcConfig::default()).unwrap();
        assert!(!analysis.is_complete());
        assert_eq!(analysis.result, SmcResult::neutral());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = SmcConfig::default();
        config.swing.window = 0;
        assert!(matches!(
            analyze(&random_walk(100, 1), &config),
            Err(ConfigError::InvalidWindow(0))
        ));
    }

    #[test]
    fn complete_analysis_populates_collections() {
        let bars = random_walk(300, 7);
        let analysis = analyze(&bars, &SmcConfig::default()).unwrap();
        assert!(analysis.is_complete());
        assert!(!analysis.swings.is_empty());
        assert_eq!(analysis.trend_by_bar.len(), bars.len());
        assert_eq!(
            analysis.result.trend,
            *analysis.trend_by_bar.last().unwrap()
        );
        let total = analysis.order_blocks.len()
            + analysis.fair_value_gaps.len()
            + analysis.structure_events.len();
        assert_eq!(
            analysis.result.counts.bullish_signals + analysis.result.counts.bearish_signals,
            total
        );
    }

    #[test]
    fn rolling_scores_cover_every_bar() {
        let bars = random_walk(80, 3);
        let scores = rolling_scores(&bars, &SmcConfig::default(), 40).unwrap();
        assert_eq!(scores.len(), 80);
        for (i, s) in scores.iter().enumerate() {
            assert_eq!(s.index, i);
        }
        // Slices shorter than 2W + 1 = 11 bars are neutral.
        assert!(scores[..10]
            .iter()
            .all(|s| s.result == SmcResult::neutral()));
    }

    #[test]
    fn rolling_score_matches_direct_analysis_of_slice() {
        let bars = random_walk(120, 11);
        let config = SmcConfig::default();
        let scores = rolling_scores(&bars, &config, 50).unwrap();
        let direct = analyze(&bars[70..=119], &config).unwrap();
        assert_eq!(scores[119].result, direct.result);
    }

    #[test]
    fn pipeline_lookahead_is_widest_stage() {
        let mut config = SmcConfig::default();
        assert_eq!(Pipeline::new(&config).unwrap().lookahead(), 20);
        config.swing.window = 30;
        assert_eq!(Pipeline::new(&config).unwrap().lookahead(), 30);
    }

    #[test]
    fn seeded_trend_reaches_the_score() {
        let bars: Vec<Bar> = random_walk(30, 1)
            .into_iter()
            .map(|b| Bar {
                open: 50.0,
                high: 50.0,
                low: 50.0,
                close: 50.0,
                volume: 10.0,
                ..b
            })
            .collect();
        let mut config = SmcConfig::default();
        config.structure.initial_trend = Trend::Downtrend;

        let analysis = analyze(&bars, &config).unwrap();
        assert!(analysis.structure_events.is_empty());
        assert!(analysis.trend_by_bar.iter().all(|t| *t == Trend::Downtrend));
        assert_eq!(analysis.result.score, -30);
        assert_eq!(analysis.result.signal, Signal::Sell);
    }

    #[test]
    fn huge_window_is_insufficient_not_overflow() {
        let mut config = SmcConfig::default();
        config.swing.window = usize::MAX;
        let analysis = analyze(&random_walk(50, 2), &config).unwrap();
        assert!(!analysis.is_complete());
    }

    #[test]
    fn zero_rolling_window_is_rejected() {
        assert!(matches!(
            rolling_scores(&random_walk(20, 1), &SmcConfig::default(), 0),
            Err(ConfigError::InvalidRollingWindow(0))
        ));
    }
}
