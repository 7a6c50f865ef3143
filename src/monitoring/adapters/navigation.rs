//! Navigation timing: one new sample per navigation entry

use crate::host::{elapsed, EntryCategory, PerformanceEntry};
use crate::monitoring::alerts::{AlertDetails, AlertKind, Severity};
use crate::monitoring::sample::PerformanceSample;
use crate::monitoring::state::TelemetryState;

pub(crate) fn process(state: &mut TelemetryState, entries: &[PerformanceEntry]) {
    for entry in entries.iter().filter(|e| e.is_type(EntryCategory::Navigation)) {
        let fetch_start = entry.fetch_start();
        let page_load_time = elapsed(fetch_start, entry.load_event_end());
        let dom_content_loaded = elapsed(fetch_start, entry.dom_content_loaded_event_end());

        state.samples.push(
            PerformanceSample::new(state.clock.now())
                .with_navigation(page_load_time, dom_content_loaded),
        );

        if page_load_time > state.thresholds.page_load_time {
            state.raise(
                AlertKind::SlowPage,
                Severity::High,
                format!("Page load is slow: {page_load_time:.0}ms"),
                AlertDetails::PageLoad {
                    page_load_time,
                    dom_content_loaded,
                },
            );
        }
    }
}
