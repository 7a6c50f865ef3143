//! Paint timing: first contentful paint on the current sample

use crate::host::PerformanceEntry;
use crate::monitoring::state::TelemetryState;

const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

pub(crate) fn process(state: &mut TelemetryState, entries: &[PerformanceEntry]) {
    for entry in entries
        .iter()
        .filter(|e| e.name.as_deref() == Some(FIRST_CONTENTFUL_PAINT))
    {
        // paint may arrive before navigation; nothing to update yet
        if let Some(current) = state.samples.current_mut() {
            current.first_contentful_paint = entry.start_time();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::state::test_support::state;
    use crate::monitoring::adapters::navigation;

    #[test]
    fn test_fcp_updates_current_sample() {
        let mut state = state();
        navigation::process(&mut state, &[PerformanceEntry::navigation(1000.0, 2000.0, 2500.0)]);
        process(&mut state, &[PerformanceEntry::paint("first-contentful-paint", 1200.0)]);

        assert_eq!(state.samples.current().unwrap().first_contentful_paint, 1200.0);
    }

    #[test]
    fn test_fcp_without_sample_is_noop() {
        let mut state = state();
        process(&mut state, &[PerformanceEntry::paint("first-contentful-paint", 1200.0)]);
        assert!(state.samples.is_empty());
    }

    #[test]
    fn test_other_paint_entries_ignored() {
        let mut state = state();
        navigation::process(&mut state, &[PerformanceEntry::navigation(0.0, 10.0, 20.0)]);
        process(&mut state, &[PerformanceEntry::paint("first-paint", 800.0)]);
        assert_eq!(state.samples.current().unwrap().first_contentful_paint, 0.0);
    }
}
