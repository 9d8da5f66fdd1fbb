//! Abnormality detectors.
//!
//! Each detector maps one snapshot (plus whatever it keeps in the
//! [`BaselineStore`]) to at most one event per cycle. Detectors are
//! independent: they never read each other's output, and the dispatcher
//! may run them in any order.

use anyhow::Result;
use async_trait::async_trait;

use crate::baseline::BaselineStore;
use crate::config::Config;
use crate::types::{Category, Event, MetricsSnapshot, Tier};

pub mod connectivity;
pub mod drift;
pub mod orchestration;
mod probe;
pub mod saturation;
pub mod stagnation;

pub use connectivity::ConnectivityDetector;
pub use drift::DriftDetector;
pub use orchestration::OrchestrationDetector;
pub use saturation::SaturationDetector;
pub use stagnation::StagnationDetector;

#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    /// Classify one snapshot. `Ok(None)` means nothing abnormal; `Err` is
    /// a detector-internal failure the dispatcher logs and skips.
    async fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        baseline: &mut BaselineStore,
    ) -> Result<Option<Event>>;
}

/// Map an intensity onto a two-tier threshold pair. Below `elevated`
/// nothing fires.
pub(crate) fn tier_for(intensity: f64, elevated: f64, critical: f64) -> Option<Tier> {
    if intensity >= critical {
        Some(Tier::Critical)
    } else if intensity >= elevated {
        Some(Tier::Elevated)
    } else {
        None
    }
}

/// All five built-in detectors, configured from `cfg`.
pub fn default_registry(cfg: &Config) -> Result<Vec<Box<dyn Detector>>> {
    let client = probe::build_client(cfg.probe_timeout_secs)?;
    Ok(vec![
        Box::new(SaturationDetector::new()),
        Box::new(StagnationDetector::new(cfg.connection_baseline)),
        Box::new(DriftDetector::new(cfg.watch_files.clone())),
        Box::new(ConnectivityDetector::new(
            cfg.health_endpoints.clone(),
            client.clone(),
        )),
        Box::new(OrchestrationDetector::new(
            cfg.expected_services.clone(),
            cfg.health_endpoints.clone(),
            cfg.latency_budget_ms,
            client,
        )),
    ])
}
