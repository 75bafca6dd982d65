//! Deterministic identification of analysis inputs.
//!
//! Persisted diagnostics carry the hash of the configuration and of the bar
//! series they were computed from, so two reports can be compared without
//! shipping the inputs. Hashes are BLAKE3 over a fixed little-endian encoding
//! of every field, stable across builds and platforms.

use crate::config::SmcConfig;
use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exact identity of an `SmcConfig` (every parameter value).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of a bar series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn config_hash(config: &SmcConfig) -> ConfigHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(config.swing.window as u64).to_le_bytes());

    let ob = &config.order_blocks;
    hasher.update(&ob.volume_multiplier.to_le_bytes());
    hasher.update(&(ob.lookback as u64).to_le_bytes());
    hasher.update(&ob.displacement_pct.to_le_bytes());

    hasher.update(&config.fvg.min_gap_pct.to_le_bytes());

    hasher.update(&config.structure.initial_trend.sign().to_le_bytes());

    let scoring = &config.scoring;
    let w = &scoring.weights;
    let c = &scoring.caps;
    for value in [
        scoring.buy_threshold,
        scoring.strong_threshold,
        w.order_block,
        w.fair_value_gap,
        w.break_of_structure,
        w.market_structure_break,
        w.trend,
        c.order_block,
        c.fair_value_gap,
        c.break_of_structure,
        c.market_structure_break,
    ] {
        hasher.update(&value.to_le_bytes());
    }

    ConfigHash(hasher.finalize().to_hex().to_string())
}

pub fn dataset_hash(bars: &[Bar]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(bars.len() as u64).to_le_bytes());
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&value.to_le_bytes());
        }
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}
