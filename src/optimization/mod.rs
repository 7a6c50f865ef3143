//! Optimization Module
//!
//! On-demand runtime optimizations delegated to the cache layer and the
//! predictive preloader, plus the startup optimizations that touch the
//! host document.

pub mod collaborators;
pub mod optimizer;
pub(crate) mod startup;

pub use collaborators::{CacheCollaborator, CacheStats, Collaborators, Preloader, PreloaderMetrics};
pub use optimizer::{OptimizationResult, OptimizationStep, Optimizer, StepOutcome};
pub use startup::PreloadSummary;
