//! Engine configuration.
//!
//! Every component reads its parameters from an explicit `SmcConfig` value
//! passed into the call. There is no ambient or global configuration, so two
//! analyses with different settings can run side by side.
//!
//! Configuration can be built in code (`SmcConfig::default()` plus field
//! updates) or loaded from TOML. Missing sections and fields fall back to the
//! defaults below.

use crate::domain::Trend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised for invalid parameter values. Never silently corrected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("swing window must be >= 1, got {0}")]
    InvalidWindow(usize),

    #[error("order block lookback must be >= 1, got {0}")]
    InvalidLookback(usize),

    #[error("volume multiplier must be a positive finite number, got {0}")]
    InvalidMultiplier(f64),

    #[error("{field} must be a finite percentage >= 0, got {value}")]
    InvalidPercentage { field: &'static str, value: f64 },

    #[error(
        "score thresholds must satisfy 0 < buy_threshold <= strong_threshold <= 100, \
         got buy={buy}, strong={strong}"
    )]
    InvalidThreshold { buy: i32, strong: i32 },

    #[error("score weight {field} must be >= 0, got {value}")]
    InvalidWeight { field: &'static str, value: i32 },

    #[error("score cap {field} must be >= 0 (0 disables it), got {value}")]
    InvalidCap { field: &'static str, value: i32 },

    #[error("rolling window must be >= 1, got {0}")]
    InvalidRollingWindow(usize),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Swing point detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwingConfig {
    /// Bars compared on each side of a candidate pivot. Recommended 3..=10.
    pub window: usize,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self { window: 5 }
    }
}

/// Order block detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrderBlockConfig {
    /// Swing bar volume must exceed this multiple of the trailing average.
    pub volume_multiplier: f64,
    /// Bars in the trailing volume average, and the forward displacement horizon.
    pub lookback: usize,
    /// Minimum close-to-zone move, in percent, that counts as displacement.
    pub displacement_pct: f64,
}

impl Default for OrderBlockConfig {
    fn default() -> Self {
        Self {
            volume_multiplier: 1.5,
            lookback: 20,
            displacement_pct: 1.0,
        }
    }
}

/// Fair value gap detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FvgConfig {
    /// Minimum gap size as a percentage of the reference price.
    pub min_gap_pct: f64,
}

impl Default for FvgConfig {
    fn default() -> Self {
        Self { min_gap_pct: 0.5 }
    }
}

/// Points contributed per event. Bullish events add, bearish events subtract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub order_block: i32,
    pub fair_value_gap: i32,
    pub break_of_structure: i32,
    pub market_structure_break: i32,
    /// Added for `UPTREND`, subtracted for `DOWNTREND`.
    pub trend: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            order_block: 10,
            fair_value_gap: 10,
            break_of_structure: 15,
            market_structure_break: 15,
            trend: 30,
        }
    }
}

/// Largest absolute contribution of each event category, applied after
/// weighting. `0` leaves the category uncapped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreCaps {
    pub order_block: i32,
    pub fair_value_gap: i32,
    pub break_of_structure: i32,
    pub market_structure_break: i32,
}

impl ScoreCaps {
    pub fn uncapped() -> Self {
        Self {
            order_block: 0,
            fair_value_gap: 0,
            break_of_structure: 0,
            market_structure_break: 0,
        }
    }
}

impl Default for ScoreCaps {
    fn default() -> Self {
        Self {
            order_block: 20,
            fair_value_gap: 20,
            break_of_structure: 15,
            market_structure_break: 15,
        }
    }
}

/// Score-to-signal mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// `score >= buy_threshold` is BUY, `score <= -buy_threshold` is SELL.
    pub buy_threshold: i32,
    /// `|score| >= strong_threshold` marks a strong conviction.
    pub strong_threshold: i32,
    pub weights: ScoreWeights,
    pub caps: ScoreCaps,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 30,
            strong_threshold: 60,
            weights: ScoreWeights::default(),
            caps: ScoreCaps::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buy_threshold <= 0
            || self.strong_threshold < self.buy_threshold
            || self.strong_threshold > 100
        {
            return Err(ConfigError::InvalidThreshold {
                buy: self.buy_threshold,
                strong: self.strong_threshold,
            });
        }

        let w = &self.weights;
        for (field, value) in [
            ("weights.order_block", w.order_block),
            ("weights.fair_value_gap", w.fair_value_gap),
            ("weights.break_of_structure", w.break_of_structure),
            ("weights.market_structure_break", w.market_structure_break),
            ("weights.trend", w.trend),
        ] {
            if value < 0 {
                return Err(ConfigError::InvalidWeight { field, value });
            }
        }

        let c = &self.caps;
        for (field, value) in [
            ("caps.order_block", c.order_block),
            ("caps.fair_value_gap", c.fair_value_gap),
            ("caps.break_of_structure", c.break_of_structure),
            ("caps.market_structure_break", c.market_structure_break),
        ] {
            if value < 0 {
                return Err(ConfigError::InvalidCap { field, value });
            }
        }

        Ok(())
    }
}

/// Market structure parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StructureConfig {
    /// Trend assumed before the first bar. `RANGE` when no prior history is known.
    pub initial_trend: Trend,
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmcConfig {
    pub swing: SwingConfig,
    pub order_blocks: OrderBlockConfig,
    pub fvg: FvgConfig,
    pub structure: StructureConfig,
    pub scoring: ScoringConfig,
}

impl SmcConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SmcConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Minimum series length for which swing detection can emit anything.
    pub fn min_bars(&self) -> usize {
        self.swing.window.saturating_mul(2).saturating_add(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swing.window == 0 {
            return Err(ConfigError::InvalidWindow(self.swing.window));
        }

        let ob = &self.order_blocks;
        if ob.lookback == 0 {
            return Err(ConfigError::InvalidLookback(ob.lookback));
        }
        if !(ob.volume_multiplier.is_finite() && ob.volume_multiplier > 0.0) {
            return Err(ConfigError::InvalidMultiplier(ob.volume_multiplier));
        }
        check_percentage("order_blocks.displacement_pct", ob.displacement_pct)?;
        check_percentage("fvg.min_gap_pct", self.fvg.min_gap_pct)?;

        self.scoring.validate()
    }
}

fn check_percentage(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPercentage { field, value })
    }
}
