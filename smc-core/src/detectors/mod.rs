//! Structural detectors.
//!
//! Data flows strictly forward: bars → swing points → {order blocks, market
//! structure}, with fair value gaps computed independently from the bars.
//! Every detector is a pure function of its inputs and owns no state between
//! calls.

pub mod fvg;
pub mod order_block;
pub mod structure;
pub mod swing;

pub use fvg::FairValueGapDetector;
pub use order_block::OrderBlockDetector;
pub use structure::{StructureAnalysis, StructureAnalyzer};
pub use swing::SwingDetector;

/// Common surface of every detector.
///
/// # Look-ahead bound
/// An output recorded at bar `i` may depend on bars up to `i + lookahead()`
/// and never beyond. The bound is per stage: a detector fed by another
/// (order blocks by swing points) inherits its upstream bound as well, so the
/// end-to-end horizon is the maximum along the chain. Every detector must pass
/// the truncated-vs-full series test with that bound.
pub trait Detector: Send + Sync {
    /// Human-readable name (e.g., "swing_5", "fvg_0.5").
    fn name(&self) -> &str;

    /// Bars after `i` an output at `i` may look at.
    fn lookahead(&self) -> usize;
}

/// Build bars from `(open, high, low, close, volume)` tuples, one hour apart.
#[cfg(test)]
pub fn make_ohlcv_bars(data: &[(f64, f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close, volume))| crate::domain::Bar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

/// Build bars from `(high, low)` pairs with mid-range open/close and flat volume.
#[cfg(test)]
pub fn make_hl_bars(data: &[(f64, f64)]) -> Vec<crate::domain::Bar> {
    let rows: Vec<_> = data
        .iter()
        .map(|&(high, low)| {
            let mid = (high + low) / 2.0;
            (mid, high, low, mid, 1000.0)
        })
        .collect();
    make_ohlcv_bars(&rows)
}
