//! # webperf-monitor
//!
//! Client-side performance telemetry engine.
//!
//! The engine observes host performance signals (navigation timing, paint,
//! layout shift, long tasks, resource loads, heap size), tracks outbound API
//! latency, scores overall health on a 0 to 100 scale, raises threshold alerts
//! and drives on-demand optimizations through an external cache layer and a
//! predictive preloader.
//!
//! Every host capability is optional and every failure is contained: the
//! engine degrades to fewer signals instead of failing its caller.

pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod monitoring;
pub mod optimization;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MonitorConfig, OptimizationFlagsUpdate, ThresholdsUpdate};
pub use error::{Error, Result};
pub use host::HostEnvironment;
pub use monitoring::{
    calculate_performance_score, Alert, AlertKind, MonitorBuilder, PerformanceMonitor,
    PerformanceReport, PerformanceSample, Severity,
};
pub use optimization::{Collaborators, OptimizationResult};
