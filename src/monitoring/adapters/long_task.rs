//! Long tasks: one slow_page alert per offending entry

use crate::host::PerformanceEntry;
use crate::monitoring::alerts::{AlertDetails, AlertKind, Severity};
use crate::monitoring::state::TelemetryState;

pub(crate) fn process(state: &mut TelemetryState, entries: &[PerformanceEntry]) {
    let threshold = state.thresholds.long_task_duration;
    for entry in entries {
        let duration = entry.duration();
        if duration > threshold {
            state.raise(
                AlertKind::SlowPage,
                Severity::Medium,
                format!("Long task blocked the main thread for {duration:.0}ms"),
                AlertDetails::LongTask {
                    duration,
                    start_time: entry.start_time(),
                },
            );
        }
    }
}
