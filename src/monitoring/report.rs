//! Performance report and recommendation generation

use super::alerts::Alert;
use super::sample::PerformanceSample;
use super::scorer::score_grade;
use crate::config::{OptimizationFlags, Thresholds};
use crate::optimization::{CacheStats, PreloaderMetrics};
use serde::{Deserialize, Serialize};

/// Cache hit rate (percent) under which caching is recommended
const LOW_CACHE_HIT_RATE: f64 = 70.0;

/// Point-in-time summary for external consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Health score of the current state (0 to 100)
    pub current_score: f64,
    /// Score band label
    pub grade: String,
    /// Mean page load time over retained samples, 0 when none
    pub average_load_time: f64,
    pub cache_performance: Option<CacheStats>,
    pub predictive_performance: Option<PreloaderMetrics>,
    /// Most recent alerts, oldest first
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
}

impl PerformanceReport {
    pub fn new(current_score: f64, average_load_time: f64) -> Self {
        Self {
            current_score,
            grade: score_grade(current_score).to_string(),
            average_load_time,
            cache_performance: None,
            predictive_performance: None,
            alerts: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_cache_performance(mut self, stats: Option<CacheStats>) -> Self {
        self.cache_performance = stats;
        self
    }

    pub fn with_predictive_performance(mut self, metrics: Option<PreloaderMetrics>) -> Self {
        self.predictive_performance = metrics;
        self
    }

    pub fn with_alerts(mut self, alerts: Vec<Alert>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }
}

/// Derives recommendations from the current state
pub(crate) fn recommendations(
    current: &PerformanceSample,
    thresholds: &Thresholds,
    flags: &OptimizationFlags,
    cache: Option<&CacheStats>,
) -> Vec<String> {
    let mut out = Vec::new();

    if current.page_load_time > thresholds.page_load_time {
        out.push(format!(
            "Page load takes {:.0}ms; defer non-critical scripts and preload critical resources",
            current.page_load_time
        ));
    }
    if current.first_contentful_paint > thresholds.first_contentful_paint {
        out.push(format!(
            "First contentful paint is {:.0}ms; inline critical CSS and reduce render-blocking resources",
            current.first_contentful_paint
        ));
    }
    if current.cumulative_layout_shift > thresholds.layout_shift {
        out.push(
            "Layout is unstable; reserve space for images and dynamic content".to_string(),
        );
    }

    let slow_apis = current
        .api_response_times
        .values()
        .filter(|&&ms| ms > thresholds.api_response_time)
        .count();
    if slow_apis > 0 {
        out.push(format!(
            "{} API endpoint(s) exceed {:.0}ms; add caching or pagination",
            slow_apis, thresholds.api_response_time
        ));
    }

    if current.memory_usage > thresholds.memory_usage {
        out.push(format!(
            "Heap usage is {:.1}MB; check for detached listeners and unbounded caches",
            current.memory_usage as f64 / (1024.0 * 1024.0)
        ));
    }
    if current.bundle_size > thresholds.bundle_size {
        if flags.enable_code_splitting {
            out.push("Script bundles are large; split routes into lazily loaded chunks".to_string());
        } else {
            out.push("Script bundles are large; enable code splitting".to_string());
        }
    }
    if let Some(stats) = cache {
        if stats.hit_rate < LOW_CACHE_HIT_RATE {
            out.push(format!(
                "Cache hit rate is {:.1}%; review cache keys and TTLs",
                stats.hit_rate
            ));
        }
    }
    if !flags.enable_image_lazy_loading {
        out.push("Enable image lazy loading to reduce initial transfer".to_string());
    }

    out
}
