//! External collaborators the optimizer delegates to

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cache layer statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Hit rate in percent (0 to 100)
    pub hit_rate: f64,
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Predictive preloader statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreloaderMetrics {
    /// Share of correct predictions (0.0 to 1.0)
    pub prediction_accuracy: f64,
    /// Share of preloaded routes served from cache (0.0 to 1.0)
    pub cache_hit_rate: f64,
    /// Average route load time in milliseconds
    pub average_load_time: f64,
}

/// Cache layer contract
#[async_trait]
pub trait CacheCollaborator: Send + Sync {
    /// Current statistics
    fn get_stats(&self) -> CacheStats;

    /// Refreshes cache health (expired entry sweep, stats recalculation)
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }
}

/// Predictive preloader contract
#[async_trait]
pub trait Preloader: Send + Sync {
    /// Pre-warms a route
    async fn warmup(&self, route: &str) -> Result<()>;

    /// Current statistics
    fn get_performance_metrics(&self) -> PreloaderMetrics;
}

/// Collaborators handed to the engine; both are optional
#[derive(Clone, Default)]
pub struct Collaborators {
    pub cache: Option<Arc<dyn CacheCollaborator>>,
    pub preloader: Option<Arc<dyn Preloader>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheCollaborator>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_preloader(mut self, preloader: Arc<dyn Preloader>) -> Self {
        self.preloader = Some(preloader);
        self
    }
}
