//! Derived structural records, all keyed by bar index.

use serde::{Deserialize, Serialize};

/// Which extreme a swing point marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwingKind {
    High,
    Low,
}

/// Bullish or bearish bias of a detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// +1 for bullish, -1 for bearish.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => -1,
        }
    }
}

/// Break of Structure (continuation) or Market Structure Break (reversal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructureKind {
    Bos,
    Msb,
}

/// Running trend state of the market structure state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Uptrend,
    Downtrend,
    #[default]
    Range,
}

impl Trend {
    /// +1 for an uptrend, -1 for a downtrend, 0 in a range.
    pub fn sign(self) -> i32 {
        match self {
            Trend::Uptrend => 1,
            Trend::Downtrend => -1,
            Trend::Range => 0,
        }
    }
}

/// A local price pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub kind: SwingKind,
    pub price: f64,
}

impl SwingPoint {
    /// First bar at which this swing is knowable: its right-hand window must
    /// have closed.
    pub fn confirmed_at(&self, window: usize) -> usize {
        self.index.saturating_add(window)
    }
}

/// A high-volume zone anchored at a swing point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub index: usize,
    pub direction: Direction,
    pub zone_high: f64,
    pub zone_low: f64,
}

/// A three-bar price inefficiency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub index: usize,
    pub direction: Direction,
    pub gap_high: f64,
    pub gap_low: f64,
    pub gap_pct: f64,
}

/// A break of a confirmed swing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureEvent {
    pub index: usize,
    pub kind: StructureKind,
    pub direction: Direction,
}
