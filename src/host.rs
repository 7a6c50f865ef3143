//! Narrow contracts for the capabilities the engine consumes from its host.
//!
//! Every capability is optional. A host that lacks one passes `None` (or returns
//! [`Error::CapabilityUnavailable`](crate::error::Error::CapabilityUnavailable)
//! from `subscribe`), and the engine keeps running with that signal disabled.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// Category of host-provided performance signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryCategory {
    Navigation,
    Paint,
    LayoutShift,
    LongTask,
}

impl EntryCategory {
    /// Every observed category, in subscription order
    pub const ALL: [EntryCategory; 4] = [
        EntryCategory::Navigation,
        EntryCategory::Paint,
        EntryCategory::LayoutShift,
        EntryCategory::LongTask,
    ];

    /// Host-side entry type name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCategory::Navigation => "navigation",
            EntryCategory::Paint => "paint",
            EntryCategory::LayoutShift => "layout-shift",
            EntryCategory::LongTask => "longtask",
        }
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed performance record
///
/// Every field is optional and unknown fields are ignored so that a host can
/// forward raw records. Readers go through the accessor methods, which turn
/// missing or non-finite numbers into `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceEntry {
    pub entry_type: Option<String>,
    pub name: Option<String>,
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
    pub fetch_start: Option<f64>,
    pub load_event_end: Option<f64>,
    pub dom_content_loaded_event_end: Option<f64>,
    pub value: Option<f64>,
    pub had_recent_input: Option<bool>,
}

impl PerformanceEntry {
    /// Navigation timing record
    pub fn navigation(fetch_start: f64, dom_content_loaded_event_end: f64, load_event_end: f64) -> Self {
        Self {
            entry_type: Some("navigation".to_string()),
            fetch_start: Some(fetch_start),
            dom_content_loaded_event_end: Some(dom_content_loaded_event_end),
            load_event_end: Some(load_event_end),
            ..Default::default()
        }
    }

    /// Paint timing record
    pub fn paint(name: &str, start_time: f64) -> Self {
        Self {
            entry_type: Some("paint".to_string()),
            name: Some(name.to_string()),
            start_time: Some(start_time),
            ..Default::default()
        }
    }

    /// Layout shift record
    pub fn layout_shift(value: f64, had_recent_input: bool) -> Self {
        Self {
            entry_type: Some("layout-shift".to_string()),
            value: Some(value),
            had_recent_input: Some(had_recent_input),
            ..Default::default()
        }
    }

    /// Long task record
    pub fn long_task(duration: f64, start_time: f64) -> Self {
        Self {
            entry_type: Some("longtask".to_string()),
            duration: Some(duration),
            start_time: Some(start_time),
            ..Default::default()
        }
    }

    pub fn is_type(&self, category: EntryCategory) -> bool {
        self.entry_type.as_deref() == Some(category.as_str())
    }

    pub fn start_time(&self) -> f64 {
        finite_or_zero(self.start_time)
    }

    pub fn duration(&self) -> f64 {
        finite_or_zero(self.duration)
    }

    pub fn fetch_start(&self) -> f64 {
        finite_or_zero(self.fetch_start)
    }

    pub fn load_event_end(&self) -> f64 {
        finite_or_zero(self.load_event_end)
    }

    pub fn dom_content_loaded_event_end(&self) -> f64 {
        finite_or_zero(self.dom_content_loaded_event_end)
    }

    pub fn value(&self) -> f64 {
        finite_or_zero(self.value)
    }

    /// Missing input flag counts as "no recent input"
    pub fn had_recent_input(&self) -> bool {
        self.had_recent_input.unwrap_or(false)
    }
}

/// Resource-load record from the host's resource listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceEntry {
    pub name: String,
    pub transfer_size: Option<f64>,
    pub fetch_start: Option<f64>,
    pub response_end: Option<f64>,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, transfer_size: u64, fetch_start: f64, response_end: f64) -> Self {
        Self {
            name: name.into(),
            transfer_size: Some(transfer_size as f64),
            fetch_start: Some(fetch_start),
            response_end: Some(response_end),
        }
    }

    /// Transfer size in bytes; malformed values read as zero
    pub fn transfer_size(&self) -> u64 {
        let size = finite_or_zero(self.transfer_size);
        if size <= 0.0 {
            0
        } else {
            size as u64
        }
    }

    /// `responseEnd - fetchStart`, clamped at zero
    pub fn load_time(&self) -> f64 {
        elapsed(finite_or_zero(self.fetch_start), finite_or_zero(self.response_end))
    }

    /// Whether the resource is a script bundle
    pub fn is_script(&self) -> bool {
        let path = self.name.split(['?', '#']).next().unwrap_or_default();
        path.ends_with(".js") || path.ends_with(".mjs")
    }
}

/// `end - start` with malformed input degraded to a non-negative finite value
pub(crate) fn elapsed(start: f64, end: f64) -> f64 {
    let delta = end - start;
    if delta.is_finite() && delta > 0.0 {
        delta
    } else {
        0.0
    }
}

/// Runs a host call, turning a panic into `None`
pub(crate) fn guarded<T>(capability: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(capability, "Host capability panicked");
            None
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Callback invoked with each batch of observed entries
pub type EntryCallback = Box<dyn Fn(&[PerformanceEntry]) + Send + Sync>;

/// Handle to a live host subscription
pub trait Subscription: Send {
    /// Stops delivery; called exactly once by the engine
    fn disconnect(&mut self);
}

/// Host performance-observation capability
pub trait ObservationSource: Send + Sync {
    /// Subscribes to one signal category
    fn subscribe(&self, category: EntryCategory, callback: EntryCallback) -> Result<Box<dyn Subscription>>;
}

/// Host resource-listing capability
pub trait ResourceTimingSource: Send + Sync {
    /// Snapshot of all resource-load records currently known
    fn resource_entries(&self) -> Vec<ResourceEntry>;
}

/// Host memory capability
pub trait MemorySource: Send + Sync {
    /// Used heap size in bytes, when the host exposes it
    fn used_heap_size(&self) -> Option<u64>;
}

/// Host location capability
pub trait LocationSource: Send + Sync {
    /// Current route path, possibly including a query string
    fn pathname(&self) -> String;
}

/// An element with a pending deferred image source
pub trait LazyImage: Send + Sync {
    fn deferred_source(&self) -> Option<String>;
    fn set_source(&self, src: &str);
    fn remove_deferred_source(&self);
}

/// Intersection status for one observed target
#[derive(Clone)]
pub struct IntersectionEntry {
    pub target: Arc<dyn LazyImage>,
    pub is_intersecting: bool,
}

/// Callback invoked with each batch of intersection changes
pub type IntersectionCallback = Box<dyn Fn(&[IntersectionEntry]) + Send + Sync>;

/// Host intersection capability
pub trait IntersectionSource: Send + Sync {
    /// Elements currently carrying a deferred image source
    fn pending_targets(&self) -> Vec<Arc<dyn LazyImage>>;

    /// Observes targets for intersection changes
    fn observe(
        &self,
        targets: Vec<Arc<dyn LazyImage>>,
        callback: IntersectionCallback,
    ) -> Result<Box<dyn Subscription>>;
}

/// Kind of resource a preload hint is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadKind {
    Font,
    Style,
    Script,
    Fetch,
}

impl PreloadKind {
    /// Derives the hint kind from a resource path
    pub fn for_resource(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        if path.ends_with(".woff2") || path.ends_with(".woff") || path.ends_with(".ttf") {
            PreloadKind::Font
        } else if path.ends_with(".css") {
            PreloadKind::Style
        } else if path.ends_with(".js") || path.ends_with(".mjs") {
            PreloadKind::Script
        } else {
            PreloadKind::Fetch
        }
    }
}

/// Host document capability used by startup optimizations
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Checks whether a resource exists
    async fn probe(&self, url: &str) -> Result<bool>;

    /// Adds a preload hint for the resource
    fn add_preload_hint(&self, url: &str, kind: PreloadKind);

    /// Injects an inline stylesheet ahead of other styles
    fn inline_style(&self, css: &str);
}

/// Bundle of optional host capabilities handed to the engine
#[derive(Clone, Default)]
pub struct HostEnvironment {
    pub observer: Option<Arc<dyn ObservationSource>>,
    pub resources: Option<Arc<dyn ResourceTimingSource>>,
    pub memory: Option<Arc<dyn MemorySource>>,
    pub location: Option<Arc<dyn LocationSource>>,
    pub intersection: Option<Arc<dyn IntersectionSource>>,
    pub document: Option<Arc<dyn DocumentHost>>,
}

impl HostEnvironment {
    /// Environment with no capabilities at all
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn ObservationSource>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceTimingSource>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemorySource>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_location(mut self, location: Arc<dyn LocationSource>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_intersection(mut self, intersection: Arc<dyn IntersectionSource>) -> Self {
        self.intersection = Some(intersection);
        self
    }

    pub fn with_document(mut self, document: Arc<dyn DocumentHost>) -> Self {
        self.document = Some(document);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_accessors_default_missing_fields() {
        let entry = PerformanceEntry {
            entry_type: Some("navigation".to_string()),
            ..Default::default()
        };
        assert!(entry.is_type(EntryCategory::Navigation));
        assert_eq!(entry.fetch_start(), 0.0);
        assert_eq!(entry.load_event_end(), 0.0);
        assert!(!entry.had_recent_input());
    }

    #[test]
    fn test_entry_rejects_non_finite_values() {
        let entry = PerformanceEntry {
            duration: Some(f64::NAN),
            start_time: Some(f64::INFINITY),
            ..Default::default()
        };
        assert_eq!(entry.duration(), 0.0);
        assert_eq!(entry.start_time(), 0.0);
    }

    #[test]
    fn test_entry_deserializes_with_unknown_and_missing_fields() {
        let raw = r#"{
            "entryType": "navigation",
            "fetchStart": 1000,
            "__proto__": { "malicious": true },
            "constructor": { "prototype": { "malicious": true } }
        }"#;
        let entry: PerformanceEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.fetch_start(), 1000.0);
        assert_eq!(entry.load_event_end(), 0.0);
    }

    #[test]
    fn test_resource_entry_load_time() {
        let entry = ResourceEntry::new("https://example.com/slow.js", 500 * 1024, 1000.0, 4000.0);
        assert_eq!(entry.load_time(), 3000.0);
        assert!(entry.is_script());

        let inverted = ResourceEntry::new("a.css", 10, 4000.0, 1000.0);
        assert_eq!(inverted.load_time(), 0.0);
        assert!(!inverted.is_script());
    }

    #[test]
    fn test_resource_entry_malformed_size() {
        let entry: ResourceEntry = serde_json::from_str(r#"{"name":"x.js","transferSize":-4}"#).unwrap();
        assert_eq!(entry.transfer_size(), 0);
        assert_eq!(entry.load_time(), 0.0);
    }

    #[test]
    fn test_guarded_catches_panics() {
        assert_eq!(guarded("memory", || 7), Some(7));
        assert_eq!(guarded("memory", || -> u64 { panic!("boom") }), None);
    }

    #[test]
    fn test_preload_kind_for_resource() {
        assert_eq!(PreloadKind::for_resource("/fonts/main.woff2"), PreloadKind::Font);
        assert_eq!(PreloadKind::for_resource("/css/critical.css?v=2"), PreloadKind::Style);
        assert_eq!(PreloadKind::for_resource("/js/vendor.js"), PreloadKind::Script);
        assert_eq!(PreloadKind::for_resource("/api/data"), PreloadKind::Fetch);
    }
}
