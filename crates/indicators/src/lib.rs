pub mod annotator;
pub mod config;
pub mod engine;
pub mod recalculator;
pub mod scanner;
pub mod state_machine;
pub mod tracker;
pub mod trimmer;
pub mod window;

pub use annotator::ConfirmationAnnotator;
pub use config::ZigzagConfig;
pub use engine::ZigzagEngine;
pub use recalculator::{IncrementalRecalculator, ReplayPlan};
pub use scanner::{CandidateBuffer, CandidateSlot, ExtremaCandidateScanner};
pub use state_machine::{EngineState, SearchMode, VertexList, ZigzagStateMachine};
pub use tracker::ZigzagTracker;
pub use trimmer::NonRepaintTrimmer;
pub use window::SeriesWindow;

use swingpoint_core::{Bar, ZigzagError};

/// Trait for streaming indicators fed one closed bar at a time.
/// The indicator maintains its own state between calls.
pub trait BarIndicator: Send {
    type Output;

    /// Process the next bar and return what it produced.
    fn next_bar(&mut self, bar: Bar) -> Result<Self::Output, ZigzagError>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of bars needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use swingpoint_core::Bar;

    fn at(index: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap() + Duration::minutes(index as i64)
    }

    /// Bars with the given high/low pairs, opening at the low and closing at the high.
    pub fn bars_from_hl(points: &[(Decimal, Decimal)]) -> Vec<Bar> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| Bar {
                instrument: "TEST".to_string(),
                timestamp: at(i),
                open: low,
                high,
                low,
                close: high,
                volume: Decimal::ONE_HUNDRED,
            })
            .collect()
    }

    /// Flat bars where open, high, low and close all equal the given price.
    pub fn bars_from_closes(closes: &[Decimal]) -> Vec<Bar> {
        let points: Vec<_> = closes.iter().map(|&c| (c, c)).collect();
        bars_from_hl(&points)
    }
}
