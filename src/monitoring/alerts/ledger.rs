//! Bounded, time-evicted alert storage

use super::alert::{Alert, AlertKind};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Alerts in arrival order
///
/// Timestamps never decrease from front to back: a pushed alert stamped
/// earlier than the newest entry is re-stamped to that entry's time.
#[derive(Debug)]
pub struct AlertLedger {
    alerts: VecDeque<Alert>,
    max_alerts: usize,
}

impl AlertLedger {
    /// Creates a ledger holding at most `max_alerts` entries (`0` = unbounded)
    pub fn new(max_alerts: usize) -> Self {
        Self {
            alerts: VecDeque::new(),
            max_alerts,
        }
    }

    pub fn push(&mut self, mut alert: Alert) {
        if let Some(last) = self.alerts.back() {
            if alert.timestamp < last.timestamp {
                alert.timestamp = last.timestamp;
            }
        }
        if self.max_alerts > 0 && self.alerts.len() >= self.max_alerts {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.back()
    }

    /// Up to `limit` most recent alerts, oldest first
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        let skip = self.alerts.len().saturating_sub(limit);
        self.alerts.iter().skip(skip).cloned().collect()
    }

    /// Number of alerts of a kind
    pub fn count_of(&self, kind: AlertKind) -> usize {
        self.alerts.iter().filter(|a| a.kind == kind).count()
    }

    /// Drops alerts stamped before `cutoff`; returns how many were dropped
    pub fn evict_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        while self
            .alerts
            .front()
            .is_some_and(|alert| alert.timestamp < cutoff)
        {
            self.alerts.pop_front();
            removed += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    /// Copy of every retained alert, oldest first
    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new(1000)
    }
}
