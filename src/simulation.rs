//! In-process host and collaborators that script a short browsing session

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webperf_monitor::host::{
    DocumentHost, EntryCallback, EntryCategory, LocationSource, MemorySource, ObservationSource,
    PerformanceEntry, PreloadKind, ResourceEntry, ResourceTimingSource, Subscription,
};
use webperf_monitor::optimization::{CacheCollaborator, CacheStats, Preloader, PreloaderMetrics};
use webperf_monitor::{Collaborators, HostEnvironment, Result};

type Listeners = Arc<Mutex<HashMap<EntryCategory, Arc<EntryCallback>>>>;

/// Observation source that delivers scripted entry batches
#[derive(Default)]
pub struct ScriptedObserver {
    listeners: Listeners,
}

impl ScriptedObserver {
    /// Delivers one batch to the listener of `category`, if still connected
    pub fn emit(&self, category: EntryCategory, entries: &[PerformanceEntry]) {
        let listener = self
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&category)
            .cloned();
        if let Some(listener) = listener {
            (*listener)(entries);
        }
    }
}

impl ObservationSource for ScriptedObserver {
    fn subscribe(&self, category: EntryCategory, callback: EntryCallback) -> Result<Box<dyn Subscription>> {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(category, Arc::new(callback));
        Ok(Box::new(ScriptedSubscription {
            category,
            listeners: self.listeners.clone(),
        }))
    }
}

struct ScriptedSubscription {
    category: EntryCategory,
    listeners: Listeners,
}

impl Subscription for ScriptedSubscription {
    fn disconnect(&mut self) {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.category);
    }
}

/// Fixed resource listing with one oversized bundle and one slow image
pub struct StaticResources;

impl ResourceTimingSource for StaticResources {
    fn resource_entries(&self) -> Vec<ResourceEntry> {
        vec![
            ResourceEntry::new("/js/vendor.js", 1536 * 1024, 100.0, 900.0),
            ResourceEntry::new("/js/app.js", 240 * 1024, 120.0, 480.0),
            ResourceEntry::new("/css/critical.css", 18 * 1024, 90.0, 160.0),
            ResourceEntry::new("/img/hero.jpg", 420 * 1024, 200.0, 2100.0),
        ]
    }
}

/// Heap that grows on every reading
pub struct GrowingHeap {
    used: AtomicU64,
    step: u64,
}

impl GrowingHeap {
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            used: AtomicU64::new(start),
            step,
        }
    }
}

impl MemorySource for GrowingHeap {
    fn used_heap_size(&self) -> Option<u64> {
        Some(self.used.fetch_add(self.step, Ordering::Relaxed))
    }
}

pub struct FixedLocation(pub String);

impl LocationSource for FixedLocation {
    fn pathname(&self) -> String {
        self.0.clone()
    }
}

/// Document where only some critical resources exist
pub struct SimulatedDocument {
    existing: Vec<String>,
}

#[async_trait]
impl DocumentHost for SimulatedDocument {
    async fn probe(&self, url: &str) -> Result<bool> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(self.existing.iter().any(|u| u == url))
    }

    fn add_preload_hint(&self, url: &str, kind: PreloadKind) {
        tracing::info!(url, kind = ?kind, "Preload hint added");
    }

    fn inline_style(&self, css: &str) {
        tracing::info!(bytes = css.len(), "Critical CSS inlined");
    }
}

/// Cache layer with fixed counters
pub struct InMemoryCache {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    pub fn new(hits: u64, misses: u64) -> Self {
        Self {
            hits: AtomicU64::new(hits),
            misses: AtomicU64::new(misses),
        }
    }
}

#[async_trait]
impl CacheCollaborator for InMemoryCache {
    fn get_stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 * 100.0 / total as f64
            },
            total_requests: total,
            cache_hits: hits,
            cache_misses: misses,
        }
    }

    async fn refresh(&self) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.hits.fetch_add(25, Ordering::Relaxed);
        Ok(())
    }
}

/// Preloader that pretends every warmup succeeds
#[derive(Default)]
pub struct RoutePreloader {
    warmed: AtomicU64,
}

#[async_trait]
impl Preloader for RoutePreloader {
    async fn warmup(&self, route: &str) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.warmed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(route, "Route warmed");
        Ok(())
    }

    fn get_performance_metrics(&self) -> PreloaderMetrics {
        PreloaderMetrics {
            prediction_accuracy: 0.82,
            cache_hit_rate: 0.74,
            average_load_time: 180.0,
        }
    }
}

/// Simulated host plus the observer handle used to drive it
pub struct Simulation {
    pub observer: Arc<ScriptedObserver>,
    pub host: HostEnvironment,
    pub collaborators: Collaborators,
}

impl Simulation {
    pub fn new(critical_resources: &[String]) -> Self {
        let observer = Arc::new(ScriptedObserver::default());
        let existing = critical_resources
            .iter()
            .filter(|url| !url.ends_with(".woff2"))
            .cloned()
            .collect();

        let host = HostEnvironment::headless()
            .with_observer(observer.clone())
            .with_resources(Arc::new(StaticResources))
            .with_memory(Arc::new(GrowingHeap::new(60 * 1024 * 1024, 12 * 1024 * 1024)))
            .with_location(Arc::new(FixedLocation("/dashboard?session=demo".to_string())))
            .with_document(Arc::new(SimulatedDocument { existing }));

        let collaborators = Collaborators::new()
            .with_cache(Arc::new(InMemoryCache::new(120, 80)))
            .with_preloader(Arc::new(RoutePreloader::default()));

        Self {
            observer,
            host,
            collaborators,
        }
    }

    /// Entries of one simulated page view; later views get slower
    pub fn page_view(&self, step: u64) {
        let load = 900.0 + step as f64 * 350.0;
        self.observer.emit(
            EntryCategory::Navigation,
            &[PerformanceEntry::navigation(10.0, load * 0.7, load)],
        );
        self.observer.emit(
            EntryCategory::Paint,
            &[PerformanceEntry::paint("first-contentful-paint", load * 0.5)],
        );
        self.observer.emit(
            EntryCategory::LayoutShift,
            &[
                PerformanceEntry::layout_shift(0.03 * step as f64, false),
                PerformanceEntry::layout_shift(0.5, true),
            ],
        );
        if step % 2 == 1 {
            self.observer.emit(
                EntryCategory::LongTask,
                &[PerformanceEntry::long_task(80.0 + step as f64 * 10.0, load * 0.4)],
            );
        }
    }
}
