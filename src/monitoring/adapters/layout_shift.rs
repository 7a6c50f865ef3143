//! Layout instability: alert when a batch's shift sum exceeds threshold

use crate::host::PerformanceEntry;
use crate::monitoring::alerts::{AlertDetails, AlertKind, Severity};
use crate::monitoring::state::TelemetryState;

pub(crate) fn process(state: &mut TelemetryState, entries: &[PerformanceEntry]) {
    // shifts right after user input are expected and excluded
    let value: f64 = entries
        .iter()
        .filter(|e| !e.had_recent_input())
        .map(PerformanceEntry::value)
        .sum();

    if let Some(current) = state.samples.current_mut() {
        current.cumulative_layout_shift += value;
    }

    if value > state.thresholds.layout_shift {
        state.raise(
            AlertKind::LayoutShift,
            Severity::Medium,
            format!("Cumulative layout shift is high: {value:.3}"),
            AlertDetails::LayoutShift { value },
        );
    }
}
