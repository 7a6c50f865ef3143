//! Shared alert producer used by every adapter and tracker

use super::alert::{Alert, AlertDetails, AlertKind, Severity};
use super::ledger::AlertLedger;
use crate::clock::Clock;
use crate::host::{guarded, LocationSource};
use std::sync::Arc;
use tracing::info;

/// Stamps, routes and records alerts
#[derive(Clone)]
pub struct AlertEngine {
    clock: Arc<dyn Clock>,
    location: Option<Arc<dyn LocationSource>>,
}

impl AlertEngine {
    pub fn new(clock: Arc<dyn Clock>, location: Option<Arc<dyn LocationSource>>) -> Self {
        Self { clock, location }
    }

    /// Current route, `/` when the host has no location capability
    pub fn current_route(&self) -> String {
        self.location
            .as_ref()
            .and_then(|location| guarded("location", || location.pathname()))
            .unwrap_or_else(|| "/".to_string())
    }

    /// Appends a timestamped alert to the ledger
    pub fn raise(
        &self,
        ledger: &mut AlertLedger,
        kind: AlertKind,
        severity: Severity,
        message: impl Into<String>,
        details: AlertDetails,
    ) {
        let alert = Alert::new(
            kind,
            severity,
            message,
            &self.current_route(),
            details,
            self.clock.now(),
        );
        info!(
            alert_type = %alert.kind,
            severity = ?alert.severity,
            route = %alert.route,
            "{}",
            alert.message
        );
        ledger.push(alert);
    }
}
