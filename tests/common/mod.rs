//! Fake host capabilities and collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use webperf_monitor::host::{
    DocumentHost, EntryCallback, EntryCategory, IntersectionCallback, IntersectionEntry,
    IntersectionSource, LazyImage, LocationSource, MemorySource, ObservationSource,
    PerformanceEntry, PreloadKind, ResourceEntry, ResourceTimingSource, Subscription,
};
use webperf_monitor::optimization::{CacheCollaborator, CacheStats, Preloader, PreloaderMetrics};
use webperf_monitor::{Collaborators, Error, HostEnvironment, Result};

/// Observation source that keeps callbacks after disconnect so tests can
/// deliver late batches
#[derive(Default)]
pub struct FakeObserver {
    listeners: Mutex<HashMap<EntryCategory, Arc<EntryCallback>>>,
    pub disconnects: Arc<AtomicUsize>,
    pub failing: HashSet<EntryCategory>,
    pub panicking: HashSet<EntryCategory>,
}

impl FakeObserver {
    pub fn failing(categories: &[EntryCategory]) -> Self {
        Self {
            failing: categories.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn panicking(categories: &[EntryCategory]) -> Self {
        Self {
            panicking: categories.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn emit(&self, category: EntryCategory, entries: &[PerformanceEntry]) {
        let listener = self.listeners.lock().unwrap().get(&category).cloned();
        if let Some(listener) = listener {
            (*listener)(entries);
        }
    }

    pub fn subscribed(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl ObservationSource for FakeObserver {
    fn subscribe(&self, category: EntryCategory, callback: EntryCallback) -> Result<Box<dyn Subscription>> {
        if self.panicking.contains(&category) {
            panic!("observer for {category} blew up");
        }
        if self.failing.contains(&category) {
            return Err(Error::CapabilityUnavailable(category.to_string()));
        }
        self.listeners
            .lock()
            .unwrap()
            .insert(category, Arc::new(callback));
        Ok(Box::new(CountingSubscription::new(self.disconnects.clone())))
    }
}

/// Subscription that counts every disconnect call
pub struct CountingSubscription {
    counter: Arc<AtomicUsize>,
}

impl CountingSubscription {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        Self { counter }
    }
}

impl Subscription for CountingSubscription {
    fn disconnect(&mut self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeResources {
    pub entries: Mutex<Vec<ResourceEntry>>,
}

impl FakeResources {
    pub fn with(entries: Vec<ResourceEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl ResourceTimingSource for FakeResources {
    fn resource_entries(&self) -> Vec<ResourceEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeMemory {
    pub used: Mutex<Option<u64>>,
}

impl FakeMemory {
    pub fn with(used: u64) -> Self {
        Self {
            used: Mutex::new(Some(used)),
        }
    }

    pub fn set(&self, used: u64) {
        *self.used.lock().unwrap() = Some(used);
    }
}

impl MemorySource for FakeMemory {
    fn used_heap_size(&self) -> Option<u64> {
        *self.used.lock().unwrap()
    }
}

pub struct FakeLocation(pub Mutex<String>);

impl FakeLocation {
    pub fn at(path: &str) -> Self {
        Self(Mutex::new(path.to_string()))
    }
}

impl LocationSource for FakeLocation {
    fn pathname(&self) -> String {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeImage {
    pub deferred: Mutex<Option<String>>,
    pub src: Mutex<String>,
}

impl FakeImage {
    pub fn pending(src: &str) -> Arc<Self> {
        Arc::new(Self {
            deferred: Mutex::new(Some(src.to_string())),
            src: Mutex::new(String::new()),
        })
    }
}

impl LazyImage for FakeImage {
    fn deferred_source(&self) -> Option<String> {
        self.deferred.lock().unwrap().clone()
    }

    fn set_source(&self, src: &str) {
        *self.src.lock().unwrap() = src.to_string();
    }

    fn remove_deferred_source(&self) {
        *self.deferred.lock().unwrap() = None;
    }
}

#[derive(Default)]
pub struct FakeIntersection {
    pub images: Vec<Arc<FakeImage>>,
    callback: Mutex<Option<Arc<IntersectionCallback>>>,
    pub observed: AtomicUsize,
    pub disconnects: Arc<AtomicUsize>,
}

impl FakeIntersection {
    pub fn with_images(images: Vec<Arc<FakeImage>>) -> Self {
        Self {
            images,
            ..Default::default()
        }
    }

    /// Reports every image as visible
    pub fn reveal_all(&self) {
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            let entries: Vec<IntersectionEntry> = self
                .images
                .iter()
                .map(|image| IntersectionEntry {
                    target: image.clone() as Arc<dyn LazyImage>,
                    is_intersecting: true,
                })
                .collect();
            (*callback)(&entries);
        }
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl IntersectionSource for FakeIntersection {
    fn pending_targets(&self) -> Vec<Arc<dyn LazyImage>> {
        self.images
            .iter()
            .map(|image| image.clone() as Arc<dyn LazyImage>)
            .collect()
    }

    fn observe(
        &self,
        targets: Vec<Arc<dyn LazyImage>>,
        callback: IntersectionCallback,
    ) -> Result<Box<dyn Subscription>> {
        self.observed.fetch_add(targets.len(), Ordering::SeqCst);
        *self.callback.lock().unwrap() = Some(Arc::new(callback));
        Ok(Box::new(CountingSubscription::new(self.disconnects.clone())))
    }
}

#[derive(Default)]
pub struct FakeDocument {
    pub existing: Vec<String>,
    pub hints: Mutex<Vec<(String, PreloadKind)>>,
    pub styles: Mutex<Vec<String>>,
}

impl FakeDocument {
    pub fn with_existing(existing: &[&str]) -> Self {
        Self {
            existing: existing.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn hinted(&self) -> Vec<String> {
        self.hints
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentHost for FakeDocument {
    async fn probe(&self, url: &str) -> Result<bool> {
        Ok(self.existing.iter().any(|u| u == url))
    }

    fn add_preload_hint(&self, url: &str, kind: PreloadKind) {
        self.hints.lock().unwrap().push((url.to_string(), kind));
    }

    fn inline_style(&self, css: &str) {
        self.styles.lock().unwrap().push(css.to_string());
    }
}

pub struct FakeCache {
    pub hit_rate: f64,
    pub refreshes: AtomicUsize,
}

impl FakeCache {
    pub fn with_hit_rate(hit_rate: f64) -> Self {
        Self {
            hit_rate,
            refreshes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CacheCollaborator for FakeCache {
    fn get_stats(&self) -> CacheStats {
        CacheStats {
            hit_rate: self.hit_rate,
            total_requests: 100,
            cache_hits: self.hit_rate as u64,
            cache_misses: 100 - self.hit_rate as u64,
        }
    }

    async fn refresh(&self) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePreloader {
    pub warmed: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub hang: AtomicBool,
}

impl FakePreloader {
    pub fn failing() -> Self {
        let preloader = Self::default();
        preloader.fail.store(true, Ordering::SeqCst);
        preloader
    }

    pub fn hanging() -> Self {
        let preloader = Self::default();
        preloader.hang.store(true, Ordering::SeqCst);
        preloader
    }
}

#[async_trait]
impl Preloader for FakePreloader {
    async fn warmup(&self, route: &str) -> Result<()> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Collaborator(format!("warmup {route} failed")));
        }
        self.warmed.lock().unwrap().push(route.to_string());
        Ok(())
    }

    fn get_performance_metrics(&self) -> PreloaderMetrics {
        PreloaderMetrics {
            prediction_accuracy: 0.9,
            cache_hit_rate: 0.8,
            average_load_time: 120.0,
        }
    }
}

/// Handles to every fake capability of one host
pub struct FakeHost {
    pub observer: Arc<FakeObserver>,
    pub resources: Arc<FakeResources>,
    pub memory: Arc<FakeMemory>,
    pub location: Arc<FakeLocation>,
    pub intersection: Arc<FakeIntersection>,
    pub document: Arc<FakeDocument>,
}

impl FakeHost {
    /// Host with every capability present and quiet
    pub fn new() -> Self {
        Self::with_observer(FakeObserver::default())
    }

    pub fn with_observer(observer: FakeObserver) -> Self {
        Self {
            observer: Arc::new(observer),
            resources: Arc::new(FakeResources::default()),
            memory: Arc::new(FakeMemory::default()),
            location: Arc::new(FakeLocation::at("/dashboard")),
            intersection: Arc::new(FakeIntersection::with_images(vec![
                FakeImage::pending("image1.jpg"),
                FakeImage::pending("image2.jpg"),
            ])),
            document: Arc::new(FakeDocument::default()),
        }
    }

    pub fn environment(&self) -> HostEnvironment {
        HostEnvironment::headless()
            .with_observer(self.observer.clone())
            .with_resources(self.resources.clone())
            .with_memory(self.memory.clone())
            .with_location(self.location.clone())
            .with_intersection(self.intersection.clone())
            .with_document(self.document.clone())
    }
}

pub fn collaborators(cache: Arc<FakeCache>, preloader: Arc<FakePreloader>) -> Collaborators {
    Collaborators::new().with_cache(cache).with_preloader(preloader)
}

pub const MB: u64 = 1024 * 1024;
