//! Visibility-driven image lazy loading

use crate::error::Error;
use crate::host::{IntersectionCallback, IntersectionEntry, IntersectionSource, Subscription};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Swaps in deferred sources for targets that became visible
pub(crate) fn load_visible(entries: &[IntersectionEntry]) -> usize {
    let mut loaded = 0;
    for entry in entries.iter().filter(|e| e.is_intersecting) {
        if let Some(src) = entry.target.deferred_source() {
            entry.target.set_source(&src);
            entry.target.remove_deferred_source();
            loaded += 1;
        }
    }
    loaded
}

/// Observes every pending image, returning `None` when the host cannot
pub(crate) fn connect(source: &Arc<dyn IntersectionSource>) -> Option<Box<dyn Subscription>> {
    let callback: IntersectionCallback = Box::new(|entries: &[IntersectionEntry]| {
        let loaded = load_visible(entries);
        if loaded > 0 {
            debug!(loaded, "Lazy images loaded");
        }
    });

    let observed = catch_unwind(AssertUnwindSafe(|| {
        let targets = source.pending_targets();
        source.observe(targets, callback)
    }))
    .unwrap_or_else(|_| Err(Error::Subscription("intersection observer panicked".to_string())));

    match observed {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            warn!(error = %e, "Intersection observer unavailable; lazy loading disabled");
            None
        }
    }
}
