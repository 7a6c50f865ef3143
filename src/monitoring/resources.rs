//! Periodic resource-load analysis

use super::alerts::{AlertDetails, AlertKind, Severity};
use super::state::TelemetryState;
use crate::host::ResourceEntry;
use std::collections::HashMap;

/// Outcome of one resource scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceScanSummary {
    pub scanned: usize,
    pub large: usize,
    pub slow: usize,
}

/// Classifies every resource against the size and latency thresholds
///
/// Records per-resource durations and the total script transfer size on the
/// current sample and keeps the scan for the optimizer. An empty listing is a
/// no-op.
pub(crate) fn analyze(state: &mut TelemetryState, entries: Vec<ResourceEntry>) -> ResourceScanSummary {
    let mut summary = ResourceScanSummary {
        scanned: entries.len(),
        ..Default::default()
    };
    if entries.is_empty() {
        return summary;
    }

    let size_threshold = state.thresholds.bundle_size;
    let time_threshold = state.thresholds.page_load_time;
    let mut load_times = HashMap::with_capacity(entries.len());
    let mut bundle_size = 0u64;

    for entry in &entries {
        let transfer_size = entry.transfer_size();
        let load_time = entry.load_time();
        load_times.insert(entry.name.clone(), load_time);
        if entry.is_script() {
            bundle_size = bundle_size.saturating_add(transfer_size);
        }

        if transfer_size > size_threshold {
            summary.large += 1;
            state.raise(
                AlertKind::LargeBundle,
                Severity::Medium,
                format!(
                    "Large resource: {} ({:.1}KB)",
                    entry.name,
                    transfer_size as f64 / 1024.0
                ),
                AlertDetails::LargeResource {
                    name: entry.name.clone(),
                    transfer_size,
                },
            );
        }

        if load_time > time_threshold {
            summary.slow += 1;
            state.raise(
                AlertKind::SlowPage,
                Severity::Medium,
                format!("Slow resource: {} took {load_time:.0}ms", entry.name),
                AlertDetails::SlowResource {
                    name: entry.name.clone(),
                    load_time,
                },
            );
        }
    }

    if let Some(current) = state.samples.current_mut() {
        current.resource_load_times = load_times;
        current.bundle_size = bundle_size;
    }
    state.resource_timings = entries;
    summary
}
