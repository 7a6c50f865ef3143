//! モニターのライフサイクル管理
//!
//! [`PerformanceMonitor`] は自身が開始した購読とバックグラウンドタスクを
//! すべて所有します。観測コールバックとタイマーは Mutex 越しに1つの
//! [`TelemetryState`] を共有し、`.await` やホスト呼び出しの間はロックを保持しません。

use super::adapters::{self, lazy_load};
use super::alerts::{Alert, AlertEngine};
use super::report::{self, PerformanceReport};
use super::resources::{self, ResourceScanSummary};
use super::sample::PerformanceSample;
use super::scorer::calculate_performance_score;
use super::state::{lock, SharedState, TelemetryState};
use crate::clock::{Clock, SystemClock};
use crate::config::{MonitorConfig, OptimizationFlags, OptimizationFlagsUpdate, Thresholds, ThresholdsUpdate};
use crate::host::{guarded, EntryCategory, HostEnvironment, MemorySource, ResourceTimingSource, Subscription};
use crate::optimization::startup::{inline_critical_css, preload_critical_resources};
use crate::optimization::{Collaborators, OptimizationResult, Optimizer, StepOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Builder for [`PerformanceMonitor`]
pub struct MonitorBuilder {
    config: MonitorConfig,
    host: HostEnvironment,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
}

impl MonitorBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            host: HostEnvironment::headless(),
            collaborators: Collaborators::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn host(mut self, host: HostEnvironment) -> Self {
        self.host = host;
        self
    }

    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Clock used for alert and sample timestamps and retention
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn start(self) -> PerformanceMonitor {
        PerformanceMonitor::launch(self)
    }
}

/// Client-side performance telemetry engine
pub struct PerformanceMonitor {
    state: SharedState,
    config: MonitorConfig,
    host: HostEnvironment,
    optimizer: Optimizer,
    subscriptions: Mutex<Vec<Box<dyn Subscription>>>,
    lazy_subscription: Mutex<Option<Box<dyn Subscription>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PerformanceMonitor {
    /// Starts monitoring with the system clock
    ///
    /// Missing or failing host capabilities disable only the signals that
    /// depend on them. Periodic tasks are spawned on the current Tokio
    /// runtime; without one the monitor still accepts manual calls.
    pub fn start(config: MonitorConfig, host: HostEnvironment, collaborators: Collaborators) -> Self {
        MonitorBuilder::new(config)
            .host(host)
            .collaborators(collaborators)
            .start()
    }

    pub fn builder(config: MonitorConfig) -> MonitorBuilder {
        MonitorBuilder::new(config)
    }

    fn launch(builder: MonitorBuilder) -> Self {
        let MonitorBuilder {
            config,
            host,
            collaborators,
            clock,
        } = builder;

        let alert_engine = AlertEngine::new(clock.clone(), host.location.clone());
        let state = TelemetryState::new(&config, alert_engine, clock).shared();
        let optimizer = Optimizer::new(
            collaborators,
            config.critical_routes.clone(),
            config.optimization_step_timeout(),
        );

        let monitor = Self {
            state,
            config,
            host,
            optimizer,
            subscriptions: Mutex::new(Vec::new()),
            lazy_subscription: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        };

        monitor.connect_observers();
        if monitor.config.optimizations.enable_image_lazy_loading {
            monitor.connect_lazy_loading();
        }
        monitor.spawn_periodic_tasks();
        monitor.apply_startup_optimizations();

        info!(
            observers = guard(&monitor.subscriptions).len(),
            tasks = guard(&monitor.tasks).len(),
            "Performance monitor started"
        );
        monitor
    }

    fn connect_observers(&self) {
        let Some(source) = &self.host.observer else {
            warn!("Host has no performance observer; observation signals disabled");
            return;
        };

        let mut subscriptions = guard(&self.subscriptions);
        for category in EntryCategory::ALL {
            if let Some(subscription) = adapters::connect(source, category, &self.state) {
                subscriptions.push(subscription);
            }
        }
    }

    fn connect_lazy_loading(&self) {
        let Some(source) = &self.host.intersection else {
            debug!("Host has no intersection observer; lazy loading disabled");
            return;
        };

        // destroy() はフラグを立ててからこのスロットを回収する
        let mut slot = guard(&self.lazy_subscription);
        if slot.is_none() && !lock(&self.state).destroyed {
            *slot = lazy_load::connect(source);
        }
    }

    fn disconnect_lazy_loading(&self) {
        let subscription = guard(&self.lazy_subscription).take();
        if let Some(subscription) = subscription {
            disconnect(subscription);
        }
    }

    fn spawn_periodic_tasks(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No Tokio runtime; periodic resource, memory and cleanup tasks disabled");
            return;
        };

        let intervals = &self.config.intervals;
        let mut tasks = guard(&self.tasks);

        let resources = self.host.resources.clone();
        tasks.push(spawn_periodic(
            &runtime,
            intervals.resource_scan(),
            self.state.clone(),
            move |state| {
                scan_resources(state, resources.as_ref());
            },
        ));

        let memory = self.host.memory.clone();
        tasks.push(spawn_periodic(
            &runtime,
            intervals.memory_poll(),
            self.state.clone(),
            move |state| {
                poll_memory(state, memory.as_ref());
            },
        ));

        let retention = self.config.retention();
        tasks.push(spawn_periodic(
            &runtime,
            intervals.cleanup(),
            self.state.clone(),
            move |state| {
                let (samples, alerts) = lock(state).cleanup(retention);
                if samples + alerts > 0 {
                    debug!(samples, alerts, "Evicted stale telemetry");
                }
            },
        ));
    }

    fn apply_startup_optimizations(&self) {
        let Some(document) = &self.host.document else {
            return;
        };
        let flags = &self.config.optimizations;

        if flags.enable_critical_css_inline {
            if let Some(css) = &self.config.critical_css {
                if guarded("document", || inline_critical_css(document.as_ref(), css)) == Some(true) {
                    debug!("Critical CSS inlined");
                }
            }
        }

        if flags.enable_resource_preloading && !self.config.critical_resources.is_empty() {
            match Handle::try_current() {
                Ok(runtime) => {
                    let document = document.clone();
                    let resources = self.config.critical_resources.clone();
                    let handle = runtime.spawn(async move {
                        let summary = preload_critical_resources(document, resources).await;
                        debug!(
                            hinted = summary.hinted.len(),
                            skipped = summary.skipped.len(),
                            "Critical resource preloading finished"
                        );
                    });
                    guard(&self.tasks).push(handle);
                }
                Err(_) => warn!("No Tokio runtime; critical resource preloading skipped"),
            }
        }
    }

    fn live_memory(&self) -> Option<u64> {
        self.host
            .memory
            .as_ref()
            .and_then(|memory| guarded("memory", || memory.used_heap_size()).flatten())
    }

    /// Records an outbound API call made by the host application
    pub fn track_api_call(&self, endpoint: &str, start_ms: f64, end_ms: f64) {
        let mut state = lock(&self.state);
        if state.destroyed {
            return;
        }
        state.track_api_call(endpoint, start_ms, end_ms);
    }

    /// Health score of the current state
    pub fn current_score(&self) -> f64 {
        let live_memory = self.live_memory();
        lock(&self.state).current_score(live_memory)
    }

    /// Point-in-time report for external consumers
    pub fn performance_report(&self) -> PerformanceReport {
        let live_memory = self.live_memory();
        let collaborators = self.optimizer.collaborators();
        let cache_stats = collaborators
            .cache
            .as_ref()
            .and_then(|cache| guarded("cache", || cache.get_stats()));
        let preloader_metrics = collaborators
            .preloader
            .as_ref()
            .and_then(|preloader| guarded("preloader", || preloader.get_performance_metrics()));

        let state = lock(&self.state);
        let snapshot = state.current_snapshot(live_memory);
        let score = calculate_performance_score(&snapshot, &state.thresholds);
        let recommendations = report::recommendations(
            &snapshot,
            &state.thresholds,
            &state.optimizations,
            cache_stats.as_ref(),
        );

        PerformanceReport::new(score, state.samples.average_load_time())
            .with_cache_performance(cache_stats)
            .with_predictive_performance(preloader_metrics)
            .with_alerts(state.alerts.recent(self.config.report_alert_limit))
            .with_recommendations(recommendations)
    }

    /// Runs the optimization steps and reports the score before and after
    pub async fn perform_optimization(&self) -> OptimizationResult {
        let before = self.current_score();
        let resources = {
            let state = lock(&self.state);
            if state.destroyed {
                None
            } else {
                Some(state.resource_timings.clone())
            }
        };

        let outcome = match resources {
            Some(resources) => self.optimizer.run_all(&resources).await,
            None => StepOutcome {
                improvements: Vec::new(),
                recommendations: vec!["Monitor has been destroyed; no optimization was run".to_string()],
            },
        };

        let after = self.current_score();
        let result = OptimizationResult::new(before, after, outcome);
        info!(
            before,
            after,
            delta = result.delta(),
            applied = result.improvements.len(),
            "Optimization run finished"
        );
        result
    }

    /// Merges threshold changes; later evaluations use the new values
    pub fn set_thresholds(&self, update: ThresholdsUpdate) {
        let mut state = lock(&self.state);
        state.thresholds.apply(&update);
        debug!(thresholds = ?state.thresholds, "Thresholds updated");
    }

    /// Merges optimization flag changes
    ///
    /// Toggling image lazy loading connects or disconnects the visibility
    /// observer; the other flags affect recommendations only.
    pub fn set_optimizations(&self, update: OptimizationFlagsUpdate) {
        let (lazy_loading, destroyed) = {
            let mut state = lock(&self.state);
            state.optimizations.apply(&update);
            debug!(optimizations = ?state.optimizations, "Optimization flags updated");
            (state.optimizations.enable_image_lazy_loading, state.destroyed)
        };

        if destroyed {
            return;
        }
        if lazy_loading {
            self.connect_lazy_loading();
        } else {
            self.disconnect_lazy_loading();
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        lock(&self.state).thresholds.clone()
    }

    pub fn optimizations(&self) -> OptimizationFlags {
        lock(&self.state).optimizations.clone()
    }

    /// Scans the host resource listing now
    pub fn analyze_resource_performance(&self) -> ResourceScanSummary {
        scan_resources(&self.state, self.host.resources.as_ref())
    }

    /// Reads the host heap size now, returning the reading when available
    pub fn check_memory_usage(&self) -> Option<u64> {
        poll_memory(&self.state, self.host.memory.as_ref())
    }

    /// Evicts samples and alerts older than the retention window
    pub fn cleanup_stale_data(&self) -> (usize, usize) {
        lock(&self.state).cleanup(self.config.retention())
    }

    pub fn snapshot_samples(&self) -> Vec<PerformanceSample> {
        lock(&self.state).samples.snapshot()
    }

    pub fn snapshot_alerts(&self) -> Vec<Alert> {
        lock(&self.state).alerts.snapshot()
    }

    pub fn snapshot_api_timings(&self) -> HashMap<String, f64> {
        lock(&self.state).api_timings.snapshot()
    }

    /// Number of live host subscriptions, lazy loading included
    pub fn active_subscriptions(&self) -> usize {
        guard(&self.subscriptions).len() + usize::from(guard(&self.lazy_subscription).is_some())
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.state).destroyed
    }

    /// Stops every subscription and task and empties all stores
    ///
    /// Idempotent: each subscription is disconnected exactly once.
    pub fn destroy(&self) {
        {
            let mut state = lock(&self.state);
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.clear();
        }

        let tasks = std::mem::take(&mut *guard(&self.tasks));
        for task in &tasks {
            task.abort();
        }

        let mut subscriptions = std::mem::take(&mut *guard(&self.subscriptions));
        subscriptions.extend(guard(&self.lazy_subscription).take());
        let disconnected = subscriptions.len();
        for subscription in subscriptions {
            disconnect(subscription);
        }

        info!(tasks = tasks.len(), disconnected, "Performance monitor destroyed");
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn disconnect(mut subscription: Box<dyn Subscription>) {
    guarded("subscription", || subscription.disconnect());
}

/// Spawns a fixed-period task; the first tick fires one period after start
fn spawn_periodic<F>(runtime: &Handle, period: Duration, state: SharedState, mut tick: F) -> JoinHandle<()>
where
    F: FnMut(&SharedState) + Send + 'static,
{
    runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if lock(&state).destroyed {
                break;
            }
            tick(&state);
        }
    })
}

/// Reads the resource listing outside the lock, then analyzes it
fn scan_resources(
    state: &SharedState,
    source: Option<&Arc<dyn ResourceTimingSource>>,
) -> ResourceScanSummary {
    let entries = source
        .and_then(|source| guarded("resources", || source.resource_entries()))
        .unwrap_or_default();

    let mut state = lock(state);
    if state.destroyed {
        return ResourceScanSummary::default();
    }
    resources::analyze(&mut state, entries)
}

/// Reads the heap size outside the lock, then records it
fn poll_memory(state: &SharedState, source: Option<&Arc<dyn MemorySource>>) -> Option<u64> {
    let used = source.and_then(|source| guarded("memory", || source.used_heap_size()).flatten())?;

    let mut state = lock(state);
    if state.destroyed {
        return None;
    }
    state.record_memory(used);
    Some(used)
}
