//! Alert Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of threshold was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SlowPage,
    SlowApi,
    LayoutShift,
    MemoryLeak,
    LargeBundle,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::SlowPage => "slow_page",
            AlertKind::SlowApi => "slow_api",
            AlertKind::LayoutShift => "layout_shift",
            AlertKind::MemoryLeak => "memory_leak",
            AlertKind::LargeBundle => "large_bundle",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Type-specific alert payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertDetails {
    /// Slow navigation
    PageLoad {
        page_load_time: f64,
        dom_content_loaded: f64,
    },
    /// Main-thread task over the long-task threshold
    LongTask { duration: f64, start_time: f64 },
    /// Resource that took longer than the page-load threshold
    SlowResource { name: String, load_time: f64 },
    /// Slow outbound call; `url` carries no query string
    SlowApi { url: String, response_time: f64 },
    /// Layout instability over one observation batch
    LayoutShift { value: f64 },
    /// Heap usage over threshold
    Memory { used_bytes: u64, threshold: u64 },
    /// Resource transfer over the bundle-size threshold
    LargeResource { name: String, transfer_size: u64 },
}

/// An immutable record that a threshold was exceeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Route the alert was raised on, query string removed
    pub route: String,
    pub details: AlertDetails,
}

impl Alert {
    /// Creates a new alert; `route` is sanitized
    pub fn new(
        kind: AlertKind,
        severity: Severity,
        message: impl Into<String>,
        route: &str,
        details: AlertDetails,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            severity,
            timestamp,
            route: sanitize_route(route),
            details,
        }
    }

    /// Age of the alert relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }
}

/// Strips the query string (everything from the first `?`)
pub fn sanitize_route(route: &str) -> String {
    match route.find('?') {
        Some(idx) => route[..idx].to_string(),
        None => route.to_string(),
    }
}
