//! Engine configuration: thresholds, optimization switches, task intervals.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    IntervalConfig, MonitorConfig, OptimizationFlags, OptimizationFlagsUpdate, Thresholds,
    ThresholdsUpdate,
};
