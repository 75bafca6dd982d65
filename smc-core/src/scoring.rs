//! Composite SMC score and discrete signal.
//!
//! `score = trend_sign * weights.trend + Σ cap(net(category) * weight(category))`,
//! clamped to `[-100, 100]`. Each category's term is bounded by its cap, so a
//! long run of one event type cannot drown out trend and structure. Every event
//! in the input window counts the same; recency only matters through what the
//! caller passes in.

use crate::config::{ConfigError, ScoringConfig};
use crate::domain::{Direction, FairValueGap, OrderBlock, StructureEvent, StructureKind, Trend};
use serde::{Deserialize, Serialize};

pub const SCORE_MIN: i32 = -100;
pub const SCORE_MAX: i32 = 100;

/// Discrete trade bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// How far past the signal threshold the score sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Conviction {
    Strong,
    Moderate,
    Mixed,
}

/// Bullish/bearish counts for one event category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub bullish: usize,
    pub bearish: usize,
}

impl Tally {
    fn add(&mut self, direction: Direction) {
        match direction {
            Direction::Bullish => self.bullish += 1,
            Direction::Bearish => self.bearish += 1,
        }
    }

    /// Bullish minus bearish.
    pub fn net(&self) -> i64 {
        self.bullish as i64 - self.bearish as i64
    }
}

/// Per-category event counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTally {
    pub order_blocks: Tally,
    pub fair_value_gaps: Tally,
    pub break_of_structure: Tally,
    pub market_structure_break: Tally,
}

impl EventTally {
    pub fn from_events(
        order_blocks: &[OrderBlock],
        fair_value_gaps: &[FairValueGap],
        structure_events: &[StructureEvent],
    ) -> Self {
        let mut tally = Self::default();
        for ob in order_blocks {
            tally.order_blocks.add(ob.direction);
        }
        for gap in fair_value_gaps {
            tally.fair_value_gaps.add(gap.direction);
        }
        for event in structure_events {
            match event.kind {
                StructureKind::Bos => tally.break_of_structure.add(event.direction),
                StructureKind::Msb => tally.market_structure_break.add(event.direction),
            }
        }
        tally
    }

    fn categories(&self) -> [Tally; 4] {
        [
            self.order_blocks,
            self.fair_value_gaps,
            self.break_of_structure,
            self.market_structure_break,
        ]
    }
}

/// Total bullish and bearish events across all categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub bullish_signals: usize,
    pub bearish_signals: usize,
}

/// Final engine output for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmcResult {
    /// Always within `[-100, 100]`.
    pub score: i32,
    pub signal: Signal,
    pub conviction: Conviction,
    pub counts: SignalCounts,
    pub tally: EventTally,
    pub trend: Trend,
}

impl SmcResult {
    /// `HOLD`, zero score and counts, `RANGE`.
    pub fn neutral() -> Self {
        Self {
            score: 0,
            signal: Signal::Hold,
            conviction: Conviction::Mixed,
            counts: SignalCounts::default(),
            tally: EventTally::default(),
            trend: Trend::Range,
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match (self.signal, self.conviction) {
            (Signal::Buy, Conviction::Strong) => "Strong bullish SMC confluence",
            (Signal::Buy, _) => "Bullish SMC setup",
            (Signal::Sell, Conviction::Strong) => "Strong bearish SMC confluence",
            (Signal::Sell, _) => "Bearish SMC setup",
            (Signal::Hold, _) => "Mixed SMC signals",
        }
    }
}

/// Folds detector outputs into an [`SmcResult`].
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    config: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(config: &ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn aggregate(
        &self,
        order_blocks: &[OrderBlock],
        fair_value_gaps: &[FairValueGap],
        structure_events: &[StructureEvent],
        trend: Trend,
    ) -> SmcResult {
        let tally = EventTally::from_events(order_blocks, fair_value_gaps, structure_events);
        let score = self.score(&tally, trend);

        let counts = tally
            .categories()
            .iter()
            .fold(SignalCounts::default(), |acc, t| SignalCounts {
                bullish_signals: acc.bullish_signals + t.bullish,
                bearish_signals: acc.bearish_signals + t.bearish,
            });

        SmcResult {
            score,
            signal: self.signal_for(score),
            conviction: self.conviction_for(score),
            counts,
            tally,
            trend,
        }
    }

    /// Weighted, per-category capped, clamped score.
    pub fn score(&self, tally: &EventTally, trend: Trend) -> i32 {
        let w = &self.config.weights;
        let c = &self.config.caps;
        // i64 so a long series of same-side events cannot overflow before clamping.
        let raw = i64::from(trend.sign()) * i64::from(w.trend)
            + category_term(tally.order_blocks, w.order_block, c.order_block)
            + category_term(tally.fair_value_gaps, w.fair_value_gap, c.fair_value_gap)
            + category_term(
                tally.break_of_structure,
                w.break_of_structure,
                c.break_of_structure,
            )
            + category_term(
                tally.market_structure_break,
                w.market_structure_break,
                c.market_structure_break,
            );
        raw.clamp(i64::from(SCORE_MIN), i64::from(SCORE_MAX)) as i32
    }

    pub fn signal_for(&self, score: i32) -> Signal {
        if score >= self.config.buy_threshold {
            Signal::Buy
        } else if score <= -self.config.buy_threshold {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    pub fn conviction_for(&self, score: i32) -> Conviction {
        let magnitude = score.abs();
        if magnitude >= self.config.strong_threshold {
            Conviction::Strong
        } else if magnitude >= self.config.buy_threshold {
            Conviction::Moderate
        } else {
            Conviction::Mixed
        }
    }
}

/// `net * weight`, bounded to `±cap` unless `cap` is 0.
fn category_term(tally: Tally, weight: i32, cap: i32) -> i64 {
    let term = tally.net().saturating_mul(i64::from(weight));
    if cap == 0 {
        term
    } else {
        term.clamp(-i64::from(cap), i64::from(cap))
    }
}
