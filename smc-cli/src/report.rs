//! Terminal and JSON rendering of analysis output.

use serde::Serialize;
use smc_core::domain::Bar;
use smc_core::fingerprint::{ConfigHash, DatasetHash};
use smc_core::{AnalysisStatus, RollingScore, SmcAnalysis, SmcResult};

/// Persistable record of one analysis.
#[derive(Debug, Serialize)]
pub struct AnalyzeReport<'a> {
    pub source: &'a str,
    pub bars: usize,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub interpretation: &'static str,
    pub status: AnalysisStatus,
    pub result: &'a SmcResult,
    /// Full detector output, only with `--events`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<&'a SmcAnalysis>,
}

/// One line of a multi-file scan.
#[derive(Debug, Serialize)]
pub struct ScanRow {
    pub source: String,
    pub bars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SmcResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn print_summary(source: &str, bars: &[Bar], analysis: &SmcAnalysis, insane_rows: usize) {
    let result = &analysis.result;
    println!();
    println!("=== SMC Result ===");
    println!("Source:         {source}");
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        println!(
            "Period:         {} to {}",
            first.timestamp.format("%Y-%m-%d %H:%M"),
            last.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
    println!("Bars:           {}", bars.len());
    println!("Score:          {:+}", result.score);
    println!("Signal:         {:?} ({:?})", result.signal, result.conviction);
    println!("Trend:          {:?}", result.trend);
    println!("Interpretation: {}", result.interpretation());
    println!();
    println!("--- Signals ---");
    println!("Bullish:        {}", result.counts.bullish_signals);
    println!("Bearish:        {}", result.counts.bearish_signals);
    let t = &result.tally;
    println!(
        "Order Blocks:   {} bull / {} bear",
        t.order_blocks.bullish, t.order_blocks.bearish
    );
    println!(
        "FVGs:           {} bull / {} bear",
        t.fair_value_gaps.bullish, t.fair_value_gaps.bearish
    );
    println!(
        "BoS:            {} bull / {} bear",
        t.break_of_structure.bullish, t.break_of_structure.bearish
    );
    println!(
        "MSB:            {} bull / {} bear",
        t.market_structure_break.bullish, t.market_structure_break.bearish
    );
    println!("Swings:         {}", analysis.swings.len());

    if let AnalysisStatus::InsufficientData {
        required,
        available,
    } = analysis.status
    {
        println!();
        println!("WARNING: insufficient data ({available} bars, need {required}); result is neutral");
    }
    if insane_rows > 0 {
        println!("WARNING: {insane_rows} bar(s) violate OHLC invariants");
    }
    println!();
}

pub fn print_events(bars: &[Bar], analysis: &SmcAnalysis) {
    let stamp = |i: usize| {
        bars.get(i)
            .map(|b| b.timestamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    };

    println!("--- Swing Points ---");
    for s in &analysis.swings {
        println!("{:>6}  {}  {:?}  {:.4}", s.index, stamp(s.index), s.kind, s.price);
    }
    println!();
    println!("--- Order Blocks ---");
    for ob in &analysis.order_blocks {
        println!(
            "{:>6}  {}  {:?}  [{:.4}, {:.4}]",
            ob.index,
            stamp(ob.index),
            ob.direction,
            ob.zone_low,
            ob.zone_high
        );
    }
    println!();
    println!("--- Fair Value Gaps ---");
    for gap in &analysis.fair_value_gaps {
        println!(
            "{:>6}  {}  {:?}  [{:.4}, {:.4}]  {:.2}%",
            gap.index,
            stamp(gap.index),
            gap.direction,
            gap.gap_low,
            gap.gap_high,
            gap.gap_pct
        );
    }
    println!();
    println!("--- Structure ---");
    for event in &analysis.structure_events {
        println!(
            "{:>6}  {}  {:?}  {:?}",
            event.index,
            stamp(event.index),
            event.kind,
            event.direction
        );
    }
    println!();
}

pub fn print_rolling(bars: &[Bar], scores: &[RollingScore]) {
    println!("{:>6}  {:<16}  {:>5}  {:<5}  {:<9}", "Bar", "Time", "Score", "Sig", "Trend");
    for s in scores {
        let time = bars
            .get(s.index)
            .map(|b| b.timestamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:>6}  {:<16}  {:>+5}  {:<5}  {:<9}",
            s.index,
            time,
            s.result.score,
            format!("{:?}", s.result.signal),
            format!("{:?}", s.result.trend)
        );
    }
}

pub fn print_scan(rows: &[ScanRow]) {
    println!(
        "{:<40}  {:>7}  {:>5}  {:<5}  {:<9}  {:>4}  {:>4}",
        "Source", "Bars", "Score", "Sig", "Trend", "Bull", "Bear"
    );
    for row in rows {
        match (&row.result, &row.error) {
            (Some(r), _) => println!(
                "{:<40}  {:>7}  {:>+5}  {:<5}  {:<9}  {:>4}  {:>4}",
                row.source,
                row.bars,
                r.score,
                format!("{:?}", r.signal),
                format!("{:?}", r.trend),
                r.counts.bullish_signals,
                r.counts.bearish_signals
            ),
            (None, Some(err)) => println!("{:<40}  ERROR: {err}", row.source),
            (None, None) => println!("{:<40}  -", row.source),
        }
    }
}
