//! パフォーマンス監視システム
//!
//! ホストから届くシグナルは [`adapters`] を経由して共有状態に集約されます。
//! [`PerformanceMonitor`] がその状態、定期タスク、ホスト購読をすべて所有します。

pub(crate) mod adapters;
pub mod alerts;
pub mod latency;
pub mod monitor;
pub mod report;
pub mod resources;
pub mod sample;
pub mod scorer;
pub(crate) mod state;

pub use alerts::{Alert, AlertDetails, AlertKind, AlertLedger, Severity};
pub use latency::ApiLatencyMap;
pub use monitor::{MonitorBuilder, PerformanceMonitor};
pub use report::PerformanceReport;
pub use resources::ResourceScanSummary;
pub use sample::{PerformanceSample, SampleStore};
pub use scorer::{calculate_performance_score, score_grade};
