//! Resource saturation: CPU, memory, or run-queue pressure.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Detector, tier_for};
use crate::baseline::BaselineStore;
use crate::types::{Category, Event, MetricsSnapshot, Tier};

const ELEVATED: f64 = 0.6;
const CRITICAL: f64 = 0.8;

pub struct SaturationDetector;

impl Default for SaturationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SaturationDetector {
    pub fn new() -> Self {
        Self
    }
}

/// Worst of CPU utilization, memory utilization, and 1-minute load
/// normalized by core count.
fn indicator(snapshot: &MetricsSnapshot) -> f64 {
    let cpu = snapshot.cpu_percent / 100.0;
    let mem = snapshot.memory_percent / 100.0;
    let load = snapshot.load_avg[0] / snapshot.core_count.max(1) as f64;
    cpu.max(mem).max(load).clamp(0.0, 1.0)
}

#[async_trait]
impl Detector for SaturationDetector {
    fn name(&self) -> &'static str {
        "saturation"
    }

    fn category(&self) -> Category {
        Category::Saturation
    }

    async fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        _baseline: &mut BaselineStore,
    ) -> Result<Option<Event>> {
        let intensity = indicator(snapshot);
        let Some(tier) = tier_for(intensity, ELEVATED, CRITICAL) else {
            return Ok(None);
        };

        let (pattern, recommended_action) = match tier {
            Tier::Critical => (
                "overload",
                "identify the dominant consumer and shed load or restart it",
            ),
            Tier::Elevated => (
                "strain",
                "watch for sustained growth before intervening",
            ),
        };

        let detail_metrics = BTreeMap::from([
            ("cpu_percent".to_string(), snapshot.cpu_percent),
            ("memory_percent".to_string(), snapshot.memory_percent),
            ("load_1m".to_string(), snapshot.load_avg[0]),
            ("core_count".to_string(), snapshot.core_count as f64),
        ]);

        Ok(Some(Event {
            timestamp: snapshot.timestamp,
            category: Category::Saturation,
            tier,
            intensity,
            pattern: pattern.to_string(),
            detail_metrics,
            message: format!(
                "resource saturation at {:.0}%: cpu {:.1}%, mem {:.1}%, load {:.2} on {} cores",
                intensity * 100.0,
                snapshot.cpu_percent,
                snapshot.memory_percent,
                snapshot.load_avg[0],
                snapshot.core_count
            ),
            recommended_action: recommended_action.to_string(),
        }))
    }
}
