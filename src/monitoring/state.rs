//! 観測コールバックと定期タスクが共有するエンジン状態

use super::alerts::{sanitize_route, AlertDetails, AlertEngine, AlertKind, AlertLedger, Severity};
use super::latency::ApiLatencyMap;
use super::sample::{PerformanceSample, SampleStore};
use super::scorer::calculate_performance_score;
use crate::clock::Clock;
use crate::config::{MonitorConfig, OptimizationFlags, Thresholds};
use crate::host::{elapsed, ResourceEntry};
use chrono::Duration;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub(crate) type SharedState = Arc<Mutex<TelemetryState>>;

/// 共有状態をロックする（以前の保持者がパニックしてもデータを回収）
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, TelemetryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// エンジンが所有する全ストアと、評価に使う設定
pub(crate) struct TelemetryState {
    pub(crate) samples: SampleStore,
    pub(crate) alerts: AlertLedger,
    pub(crate) api_timings: ApiLatencyMap,
    /// 直近のリソーススキャン結果
    pub(crate) resource_timings: Vec<ResourceEntry>,
    pub(crate) thresholds: Thresholds,
    pub(crate) optimizations: OptimizationFlags,
    pub(crate) alert_engine: AlertEngine,
    pub(crate) clock: Arc<dyn Clock>,
    /// `destroy` で立つフラグ。以降のコールバックは何もしない
    pub(crate) destroyed: bool,
}

impl TelemetryState {
    pub(crate) fn new(config: &MonitorConfig, alert_engine: AlertEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            samples: SampleStore::new(),
            alerts: AlertLedger::new(config.max_alerts),
            api_timings: ApiLatencyMap::new(config.max_tracked_endpoints),
            resource_timings: Vec::new(),
            thresholds: config.thresholds.clone(),
            optimizations: config.optimizations.clone(),
            alert_engine,
            clock,
            destroyed: false,
        }
    }

    pub(crate) fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// 共有アラートエンジン経由でアラートを発行
    pub(crate) fn raise(
        &mut self,
        kind: AlertKind,
        severity: Severity,
        message: impl Into<String>,
        details: AlertDetails,
    ) {
        self.alert_engine
            .raise(&mut self.alerts, kind, severity, message, details);
    }

    /// API呼び出しのレイテンシを記録し、遅ければアラートを発行
    pub(crate) fn track_api_call(&mut self, endpoint: &str, start_ms: f64, end_ms: f64) {
        let response_time = elapsed(start_ms, end_ms);
        if let Some(evicted) = self.api_timings.record(endpoint, response_time) {
            debug!(endpoint = %evicted, "Latency map full; evicted endpoint");
        }

        if response_time > self.thresholds.api_response_time {
            let url = sanitize_route(endpoint);
            self.raise(
                AlertKind::SlowApi,
                Severity::Medium,
                format!("API response is slow: {url} took {response_time:.0}ms"),
                AlertDetails::SlowApi { url, response_time },
            );
        }
    }

    /// ヒープ使用量を記録し、閾値超過ならアラートを発行
    pub(crate) fn record_memory(&mut self, used_bytes: u64) {
        if let Some(current) = self.samples.current_mut() {
            current.memory_usage = used_bytes;
        }

        let threshold = self.thresholds.memory_usage;
        if used_bytes > threshold {
            self.raise(
                AlertKind::MemoryLeak,
                Severity::High,
                format!(
                    "Memory usage is high: {:.1}MB",
                    used_bytes as f64 / (1024.0 * 1024.0)
                ),
                AlertDetails::Memory {
                    used_bytes,
                    threshold,
                },
            );
        }
    }

    /// 保持期間を過ぎたサンプルとアラートを削除
    pub(crate) fn cleanup(&mut self, retention: Duration) -> (usize, usize) {
        let cutoff = self.clock.now() - retention;
        let samples = self.samples.evict_older_than(cutoff);
        let alerts = self.alerts.evict_older_than(cutoff);
        (samples, alerts)
    }

    /// 最新サンプルに現在のレイテンシとヒープ値を重ねたもの
    pub(crate) fn current_snapshot(&self, live_memory: Option<u64>) -> PerformanceSample {
        let mut snapshot = self
            .samples
            .current()
            .cloned()
            .unwrap_or_else(|| PerformanceSample::new(self.clock.now()));
        snapshot.api_response_times = self.api_timings.snapshot();
        if let Some(used) = live_memory {
            snapshot.memory_usage = used;
        }
        snapshot
    }

    pub(crate) fn current_score(&self, live_memory: Option<u64>) -> f64 {
        calculate_performance_score(&self.current_snapshot(live_memory), &self.thresholds)
    }

    /// 全ストアを空にする
    pub(crate) fn clear(&mut self) {
        self.samples.clear();
        self.alerts.clear();
        self.api_timings.clear();
        self.resource_timings.clear();
    }
}
