//! Startup optimizations applied to the host document

use crate::host::{DocumentHost, PreloadKind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of the critical-resource preload pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    /// Resources that exist and got a preload hint
    pub hinted: Vec<String>,
    /// Resources that are missing or could not be probed
    pub skipped: Vec<String>,
}

/// Probes each critical resource and hints only those that exist
pub(crate) async fn preload_critical_resources(
    document: Arc<dyn DocumentHost>,
    resources: Vec<String>,
) -> PreloadSummary {
    let mut summary = PreloadSummary::default();

    for url in resources {
        match document.probe(&url).await {
            Ok(true) => {
                document.add_preload_hint(&url, PreloadKind::for_resource(&url));
                summary.hinted.push(url);
            }
            Ok(false) => {
                debug!(url = %url, "Critical resource missing; not preloaded");
                summary.skipped.push(url);
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Critical resource probe failed");
                summary.skipped.push(url);
            }
        }
    }

    summary
}

/// Injects the critical stylesheet; empty stylesheets are ignored
pub(crate) fn inline_critical_css(document: &dyn DocumentHost, css: &str) -> bool {
    if css.trim().is_empty() {
        return false;
    }
    document.inline_style(css);
    true
}
