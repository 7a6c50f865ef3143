//! Alerts Module
//!
//! アラートシステム

mod alert;
mod engine;
mod ledger;

pub use alert::{sanitize_route, Alert, AlertDetails, AlertKind, Severity};
pub use engine::AlertEngine;
pub use ledger::AlertLedger;
