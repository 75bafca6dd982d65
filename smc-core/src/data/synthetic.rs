//! Seeded random-walk bars.
//!
//! Hourly bars with a valid OHLC envelope, occasional opening gaps (so fair
//! value gaps appear) and occasional volume spikes (so order blocks appear).
//! The same `(n, seed)` always yields the same series.

use crate::domain::Bar;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 2024-01-01T00:00:00Z
const START_EPOCH_SECS: i64 = 1_704_067_200;
const BAR_SECS: i64 = 3_600;
const START_PRICE: f64 = 100.0;
const BASE_VOLUME: f64 = 1_000.0;

pub fn random_walk(n: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(n);
    let mut prev_close = START_PRICE;

    for i in 0..n {
        let gap = if rng.gen_bool(0.05) {
            rng.gen_range(-0.03..0.03)
        } else {
            0.0
        };
        let open = (prev_close * (1.0 + gap)).max(1.0);
        let close = (open * (1.0 + rng.gen_range(-0.015..0.015))).max(1.0);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.006));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.006));

        let mut volume = BASE_VOLUME * rng.gen_range(0.5..1.5);
        if rng.gen_bool(0.08) {
            volume *= rng.gen_range(2.0..4.0);
        }

        let timestamp =
            DateTime::<Utc>::from_timestamp(START_EPOCH_SECS + i as i64 * BAR_SECS, 0)
                .unwrap_or_default();

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
        prev_close = close;
    }

    bars
}
