//! Observation adapters
//!
//! Each signal category is an independent subscription with its own fault
//! isolation: a host that cannot provide one category only disables that
//! category.

pub(crate) mod layout_shift;
pub(crate) mod lazy_load;
pub(crate) mod long_task;
pub(crate) mod navigation;
pub(crate) mod paint;

use super::state::{lock, SharedState, TelemetryState};
use crate::error::Error;
use crate::host::{EntryCallback, EntryCategory, ObservationSource, PerformanceEntry, Subscription};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies one batch of entries to the engine state
pub(crate) type BatchHandler = fn(&mut TelemetryState, &[PerformanceEntry]);

/// Handler for each observed category
pub(crate) fn handler_for(category: EntryCategory) -> BatchHandler {
    match category {
        EntryCategory::Navigation => navigation::process,
        EntryCategory::Paint => paint::process,
        EntryCategory::LayoutShift => layout_shift::process,
        EntryCategory::LongTask => long_task::process,
    }
}

/// Subscribes one category, returning `None` when the host cannot provide it
pub(crate) fn connect(
    source: &Arc<dyn ObservationSource>,
    category: EntryCategory,
    state: &SharedState,
) -> Option<Box<dyn Subscription>> {
    let handler = handler_for(category);
    let callback_state = Arc::clone(state);
    let callback: EntryCallback = Box::new(move |entries: &[PerformanceEntry]| {
        let mut state = lock(&callback_state);
        if state.destroyed {
            return;
        }
        handler(&mut state, entries);
    });

    let subscribed = catch_unwind(AssertUnwindSafe(|| source.subscribe(category, callback)))
        .unwrap_or_else(|_| Err(Error::Subscription(format!("{category} observer panicked"))));

    match subscribed {
        Ok(subscription) => {
            debug!(category = %category, "Observer connected");
            Some(subscription)
        }
        Err(e) => {
            warn!(category = %category, error = %e, "Observer unavailable; signal disabled");
            None
        }
    }
}
