//! Sequential, failure-isolated optimization steps

use super::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::host::ResourceEntry;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Resources above this transfer size are compression candidates
const COMPRESSION_CANDIDATE_BYTES: u64 = 100 * 1024;
/// Cache hit rate (percent) under which a tuning note is emitted
const LOW_CACHE_HIT_RATE: f64 = 80.0;

/// One delegated optimization action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStep {
    /// Cache-health refresh through the cache layer
    CacheOptimization,
    /// Pre-warming the critical routes through the preloader
    CriticalResourcePreload,
    /// Compression pass over the last resource scan
    ResourceCompression,
}

impl OptimizationStep {
    /// Steps in execution order
    pub const ALL: [OptimizationStep; 3] = [
        OptimizationStep::CacheOptimization,
        OptimizationStep::CriticalResourcePreload,
        OptimizationStep::ResourceCompression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptimizationStep::CacheOptimization => "cache_optimization",
            OptimizationStep::CriticalResourcePreload => "critical_resource_preload",
            OptimizationStep::ResourceCompression => "resource_compression",
        }
    }
}

/// Result of one optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub before: f64,
    pub after: f64,
    /// Names of the steps that completed, in order
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
    /// Same as `after`
    pub score: f64,
}

impl OptimizationResult {
    pub fn new(before: f64, after: f64, outcome: StepOutcome) -> Self {
        Self {
            before,
            after,
            improvements: outcome.improvements,
            recommendations: outcome.recommendations,
            score: after,
        }
    }

    /// Score change caused by the run
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// Accumulated output of the step sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Runs the optimization steps against the collaborators
pub struct Optimizer {
    collaborators: Collaborators,
    critical_routes: Vec<String>,
    step_timeout: Duration,
}

impl Optimizer {
    pub fn new(collaborators: Collaborators, critical_routes: Vec<String>, step_timeout: Duration) -> Self {
        Self {
            collaborators,
            critical_routes,
            step_timeout,
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Runs every step in order; a failed step never stops the next one
    pub async fn run_all(&self, resources: &[ResourceEntry]) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        for step in OptimizationStep::ALL {
            let result = match step {
                OptimizationStep::CacheOptimization => self.guarded(step, self.optimize_cache()).await,
                OptimizationStep::CriticalResourcePreload => {
                    self.guarded(step, self.preload_critical_routes()).await
                }
                OptimizationStep::ResourceCompression => {
                    self.guarded(step, async { Ok(compress_resources(resources)) }).await
                }
            };

            match result {
                Ok(notes) => {
                    info!(step = step.name(), "Optimization step applied");
                    outcome.improvements.push(step.name().to_string());
                    outcome.recommendations.extend(notes);
                }
                Err(e) => {
                    if e.is_capability_error() {
                        info!(step = step.name(), reason = %e, "Optimization step skipped");
                    } else {
                        warn!(step = step.name(), error = %e, "Optimization step failed");
                    }
                    outcome
                        .recommendations
                        .push(format!("{} did not complete: {}", step.name(), e));
                }
            }
        }

        outcome
    }

    /// Bounds a step by the timeout and turns a panic into an error
    ///
    /// The timeout needs a Tokio timer; when the caller drives the run from
    /// another executor the step runs unbounded.
    async fn guarded<F>(&self, step: OptimizationStep, fut: F) -> Result<Vec<String>>
    where
        F: Future<Output = Result<Vec<String>>>,
    {
        let fut = AssertUnwindSafe(fut).catch_unwind();
        let completed = if Handle::try_current().is_ok() {
            match tokio::time::timeout(self.step_timeout, fut).await {
                Ok(completed) => completed,
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "{} exceeded {}ms",
                        step.name(),
                        self.step_timeout.as_millis()
                    )))
                }
            }
        } else {
            debug!(step = step.name(), "No Tokio runtime; step runs without a timeout");
            fut.await
        };

        completed.unwrap_or_else(|_| Err(Error::Collaborator(format!("{} panicked", step.name()))))
    }

    async fn optimize_cache(&self) -> Result<Vec<String>> {
        let cache = self
            .collaborators
            .cache
            .as_ref()
            .ok_or_else(|| Error::CapabilityUnavailable("cache collaborator".to_string()))?;

        cache.refresh().await?;
        let stats = cache.get_stats();

        let mut notes = Vec::new();
        if stats.hit_rate < LOW_CACHE_HIT_RATE {
            notes.push(format!(
                "Cache hit rate is {:.1}%; extend TTLs for frequently requested data",
                stats.hit_rate
            ));
        }
        Ok(notes)
    }

    async fn preload_critical_routes(&self) -> Result<Vec<String>> {
        let preloader = self
            .collaborators
            .preloader
            .as_ref()
            .ok_or_else(|| Error::CapabilityUnavailable("preloader collaborator".to_string()))?;

        let mut failed = Vec::new();
        let mut last_error = None;
        for route in &self.critical_routes {
            if let Err(e) = preloader.warmup(route).await {
                warn!(route = %route, error = %e, "Route warmup failed");
                failed.push(route.clone());
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) if failed.len() == self.critical_routes.len() => Err(e),
            _ if failed.is_empty() => Ok(Vec::new()),
            _ => Ok(vec![format!(
                "Critical routes could not be pre-warmed: {}",
                failed.join(", ")
            )]),
        }
    }
}

/// Lists text resources worth serving compressed
fn compress_resources(resources: &[ResourceEntry]) -> Vec<String> {
    resources
        .iter()
        .filter(|r| r.transfer_size() > COMPRESSION_CANDIDATE_BYTES && is_compressible(&r.name))
        .map(|r| {
            format!(
                "Serve {} compressed (gzip/brotli); transfer is {:.1}KB",
                r.name,
                r.transfer_size() as f64 / 1024.0
            )
        })
        .collect()
}

fn is_compressible(name: &str) -> bool {
    let path = name.split(['?', '#']).next().unwrap_or_default();
    [".js", ".mjs", ".css", ".html", ".json", ".svg", ".txt"]
        .iter()
        .any(|ext| path.ends_with(ext))
}
