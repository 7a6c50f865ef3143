//! Error types for the performance telemetry engine.

use thiserror::Error;

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised inside the engine.
///
/// None of these escape the engine's outbound operations: they are logged and
/// swallowed at the boundary so the host application never sees a failure.
/// They do cross the boundary from construction helpers such as
/// [`MonitorConfig::load`](crate::config::MonitorConfig::load).
#[derive(Debug, Error)]
pub enum Error {
    /// The host environment lacks an observation capability
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Subscribing to a host signal failed
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// An external collaborator (cache layer, preloader) failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// A delegated operation did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Returns true when the error only disables a feature rather than
    /// signalling a misbehaving collaborator
    pub fn is_capability_error(&self) -> bool {
        matches!(
            self,
            Error::CapabilityUnavailable(_) | Error::Subscription(_)
        )
    }
}
