//! SMC Core: Smart Money Concepts detection and scoring engine.
//!
//! This crate turns an OHLCV series into a bounded, interpretable signal:
//! - Domain types (bars, swing points, order blocks, fair value gaps, structure events)
//! - Swing point detector over a symmetric window
//! - Order block detector (volume spike + displacement at swing points)
//! - Fair value gap detector (causal three-bar window)
//! - Market structure state machine emitting BoS / MSB events
//! - Score aggregator producing a score in [-100, 100] and BUY / SELL / HOLD
//!
//! The engine is pure: no I/O, no shared state, deterministic for a given input
//! and configuration. Callers may run any number of analyses in parallel.

pub mod config;
pub mod data;
pub mod detectors;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod scoring;

pub use config::{ConfigError, SmcConfig};
pub use engine::{analyze, rolling_scores, AnalysisStatus, RollingScore, SmcAnalysis};
pub use scoring::{Conviction, Signal, SmcResult};
