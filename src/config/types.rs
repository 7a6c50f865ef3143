use serde::{Deserialize, Serialize};
use std::time::Duration;

const MB: u64 = 1024 * 1024;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Alerting and scoring thresholds
    pub thresholds: Thresholds,

    /// Runtime optimization switches
    pub optimizations: OptimizationFlags,

    /// Periodic task intervals
    pub intervals: IntervalConfig,

    /// Samples and alerts older than this are evicted by the cleanup task
    pub retention_secs: u64,

    /// Upper bound on retained alerts; the oldest are dropped first
    pub max_alerts: usize,

    /// Number of most recent alerts included in a report
    pub report_alert_limit: usize,

    /// Routes pre-warmed by the optimizer
    pub critical_routes: Vec<String>,

    /// Resources probed and hinted for preloading at startup
    pub critical_resources: Vec<String>,

    /// Stylesheet inlined at startup when critical CSS inlining is on
    pub critical_css: Option<String>,

    /// Bounded wait for each delegated optimization step
    pub optimization_step_timeout_ms: u64,

    /// Optional cap on the number of endpoints in the latency map
    pub max_tracked_endpoints: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            optimizations: OptimizationFlags::default(),
            intervals: IntervalConfig::default(),
            retention_secs: 30 * 60,
            max_alerts: 1000,
            report_alert_limit: 10,
            critical_routes: vec![
                "/dashboard".to_string(),
                "/students".to_string(),
                "/classes".to_string(),
            ],
            critical_resources: vec![
                "/fonts/main.woff2".to_string(),
                "/css/critical.css".to_string(),
                "/js/vendor.js".to_string(),
            ],
            critical_css: None,
            optimization_step_timeout_ms: 10_000,
            max_tracked_endpoints: None,
        }
    }
}

impl MonitorConfig {
    /// Retention window for samples and alerts
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs.min(i64::MAX as u64) as i64)
    }

    /// Per-step optimization timeout
    pub fn optimization_step_timeout(&self) -> Duration {
        Duration::from_millis(self.optimization_step_timeout_ms)
    }

    /// Sets the thresholds
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the optimization switches
    pub fn with_optimizations(mut self, optimizations: OptimizationFlags) -> Self {
        self.optimizations = optimizations;
        self
    }

    /// Caps the latency map
    pub fn with_max_tracked_endpoints(mut self, max: usize) -> Self {
        self.max_tracked_endpoints = Some(max);
        self
    }
}

/// Numeric boundaries used to decide whether to alert
///
/// Values are accepted as-is; nonsensical thresholds are not rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Page load time in milliseconds
    pub page_load_time: f64,
    /// First contentful paint in milliseconds
    pub first_contentful_paint: f64,
    /// API response time in milliseconds
    pub api_response_time: f64,
    /// Cumulative layout shift score
    pub layout_shift: f64,
    /// Long task duration in milliseconds
    pub long_task_duration: f64,
    /// JS heap usage in bytes
    pub memory_usage: u64,
    /// Single resource transfer size in bytes
    pub bundle_size: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            page_load_time: 1500.0,
            first_contentful_paint: 1000.0,
            api_response_time: 500.0,
            layout_shift: 0.1,
            long_task_duration: 50.0,
            memory_usage: 100 * MB,
            bundle_size: MB,
        }
    }
}

impl Thresholds {
    /// Applies a partial update; unset fields keep their value
    pub fn apply(&mut self, update: &ThresholdsUpdate) {
        if let Some(v) = update.page_load_time {
            self.page_load_time = v;
        }
        if let Some(v) = update.first_contentful_paint {
            self.first_contentful_paint = v;
        }
        if let Some(v) = update.api_response_time {
            self.api_response_time = v;
        }
        if let Some(v) = update.layout_shift {
            self.layout_shift = v;
        }
        if let Some(v) = update.long_task_duration {
            self.long_task_duration = v;
        }
        if let Some(v) = update.memory_usage {
            self.memory_usage = v;
        }
        if let Some(v) = update.bundle_size {
            self.bundle_size = v;
        }
    }
}

/// Partial threshold update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsUpdate {
    pub page_load_time: Option<f64>,
    pub first_contentful_paint: Option<f64>,
    pub api_response_time: Option<f64>,
    pub layout_shift: Option<f64>,
    pub long_task_duration: Option<f64>,
    pub memory_usage: Option<u64>,
    pub bundle_size: Option<u64>,
}

/// Runtime optimization switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationFlags {
    /// Swap deferred image sources in when images scroll into view
    pub enable_image_lazy_loading: bool,
    /// Recommend code splitting when bundles are large
    pub enable_code_splitting: bool,
    /// Probe and hint critical resources at startup
    pub enable_resource_preloading: bool,
    /// Inline the configured critical stylesheet at startup
    pub enable_critical_css_inline: bool,
}

impl Default for OptimizationFlags {
    fn default() -> Self {
        Self {
            enable_image_lazy_loading: true,
            enable_code_splitting: true,
            enable_resource_preloading: true,
            enable_critical_css_inline: true,
        }
    }
}

impl OptimizationFlags {
    /// Applies a partial update; unset fields keep their value
    pub fn apply(&mut self, update: &OptimizationFlagsUpdate) {
        if let Some(v) = update.enable_image_lazy_loading {
            self.enable_image_lazy_loading = v;
        }
        if let Some(v) = update.enable_code_splitting {
            self.enable_code_splitting = v;
        }
        if let Some(v) = update.enable_resource_preloading {
            self.enable_resource_preloading = v;
        }
        if let Some(v) = update.enable_critical_css_inline {
            self.enable_critical_css_inline = v;
        }
    }
}

/// Partial optimization switch update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationFlagsUpdate {
    pub enable_image_lazy_loading: Option<bool>,
    pub enable_code_splitting: Option<bool>,
    pub enable_resource_preloading: Option<bool>,
    pub enable_critical_css_inline: Option<bool>,
}

/// Periodic task intervals in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Resource analyzer period
    pub resource_scan_secs: u64,
    /// Memory poll period
    pub memory_poll_secs: u64,
    /// Cleanup period
    pub cleanup_secs: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            resource_scan_secs: 60,
            memory_poll_secs: 30,
            cleanup_secs: 5 * 60,
        }
    }
}

impl IntervalConfig {
    pub fn resource_scan(&self) -> Duration {
        Duration::from_secs(self.resource_scan_secs.max(1))
    }

    pub fn memory_poll(&self) -> Duration {
        Duration::from_secs(self.memory_poll_secs.max(1))
    }

    pub fn cleanup(&self) -> Duration {
        Duration::from_secs(self.cleanup_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.page_load_time, 1500.0);
        assert_eq!(t.first_contentful_paint, 1000.0);
        assert_eq!(t.api_response_time, 500.0);
        assert_eq!(t.layout_shift, 0.1);
        assert_eq!(t.long_task_duration, 50.0);
        assert_eq!(t.memory_usage, 100 * 1024 * 1024);
        assert_eq!(t.bundle_size, 1024 * 1024);
    }

    #[test]
    fn test_partial_threshold_update() {
        let mut t = Thresholds::default();
        t.apply(&ThresholdsUpdate {
            page_load_time: Some(2000.0),
            first_contentful_paint: Some(1500.0),
            api_response_time: Some(1000.0),
            ..Default::default()
        });

        assert_eq!(t.page_load_time, 2000.0);
        assert_eq!(t.first_contentful_paint, 1500.0);
        assert_eq!(t.api_response_time, 1000.0);
        assert_eq!(t.layout_shift, 0.1);
    }

    #[test]
    fn test_nonsensical_thresholds_are_accepted() {
        let mut t = Thresholds::default();
        t.apply(&ThresholdsUpdate {
            page_load_time: Some(-5.0),
            layout_shift: Some(0.0),
            ..Default::default()
        });
        assert_eq!(t.page_load_time, -5.0);
        assert_eq!(t.layout_shift, 0.0);
    }

    #[test]
    fn test_partial_flag_update() {
        let mut flags = OptimizationFlags::default();
        flags.apply(&OptimizationFlagsUpdate {
            enable_image_lazy_loading: Some(false),
            enable_code_splitting: Some(false),
            enable_resource_preloading: Some(false),
            ..Default::default()
        });

        assert!(!flags.enable_image_lazy_loading);
        assert!(!flags.enable_code_splitting);
        assert!(!flags.enable_resource_preloading);
        assert!(flags.enable_critical_css_inline);
    }

    #[test]
    fn test_default_intervals() {
        let intervals = IntervalConfig::default();
        assert_eq!(intervals.resource_scan(), Duration::from_secs(60));
        assert_eq!(intervals.memory_poll(), Duration::from_secs(30));
        assert_eq!(intervals.cleanup(), Duration::from_secs(300));
    }

    #[test]
    fn test_default_monitor_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.retention(), chrono::Duration::minutes(30));
        assert_eq!(config.critical_routes.len(), 3);
        assert!(config.max_tracked_endpoints.is_none());
    }
}
