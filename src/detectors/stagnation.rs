//! Process stagnation: long-lived processes that burned a lot of CPU but
//! have gone quiet, plus connection counts well past the host's normal.
//!
//! Quiet here means near-zero *current* CPU against a large cumulative
//! total, the shape of a worker that wedged after doing real work.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Detector, tier_for};
use crate::baseline::BaselineStore;
use crate::types::{Category, Event, MetricsSnapshot, Tier};

const ELEVATED: f64 = 0.6;
const CRITICAL: f64 = 0.8;

/// Cumulative CPU seconds a process must have consumed to qualify.
const STALL_MIN_CPU_SECS: u64 = 600;
/// Current CPU below this counts as quiet.
const STALL_MAX_CPU_PERCENT: f64 = 0.5;
const STALL_WEIGHT: f64 = 0.25;
/// Connections at double the baseline contribute the full 0.5.
const CONN_WEIGHT_CAP: f64 = 0.5;

pub struct StagnationDetector {
    connection_baseline: usize,
}

impl StagnationDetector {
    pub fn new(connection_baseline: usize) -> Self {
        Self {
            connection_baseline: connection_baseline.max(1),
        }
    }

    fn score(&self, snapshot: &MetricsSnapshot) -> (f64, usize, usize) {
        let stalled = snapshot
            .processes
            .values()
            .filter(|p| {
                p.cpu_time_secs >= STALL_MIN_CPU_SECS && p.cpu_percent < STALL_MAX_CPU_PERCENT
            })
            .count();

        let excess = snapshot
            .connection_count
            .saturating_sub(self.connection_baseline);
        let conn_component =
            (excess as f64 / self.connection_baseline as f64 * CONN_WEIGHT_CAP).min(CONN_WEIGHT_CAP);

        let intensity = (stalled as f64 * STALL_WEIGHT + conn_component).min(1.0);
        (intensity, stalled, excess)
    }
}

#[async_trait]
impl Detector for StagnationDetector {
    fn name(&self) -> &'static str {
        "stagnation"
    }

    fn category(&self) -> Category {
        Category::Stagnation
    }

    async fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        _baseline: &mut BaselineStore,
    ) -> Result<Option<Event>> {
        let (intensity, stalled, excess) = self.score(snapshot);
        let Some(tier) = tier_for(intensity, ELEVATED, CRITICAL) else {
            return Ok(None);
        };

        let (pattern, recommended_action) = match tier {
            Tier::Critical => (
                "deadweight",
                "inspect the stalled processes; restart or reap what is wedged",
            ),
            Tier::Elevated => (
                "drag",
                "list high-cpu-time idle processes and confirm they are still needed",
            ),
        };

        let detail_metrics = BTreeMap::from([
            ("stalled_processes".to_string(), stalled as f64),
            ("connection_count".to_string(), snapshot.connection_count as f64),
            (
                "connection_baseline".to_string(),
                self.connection_baseline as f64,
            ),
        ]);

        Ok(Some(Event {
            timestamp: snapshot.timestamp,
            category: Category::Stagnation,
            tier,
            intensity,
            pattern: pattern.to_string(),
            detail_metrics,
            message: format!(
                "{} stalled process(es), {} connection(s) over baseline",
                stalled, excess
            ),
            recommended_action: recommended_action.to_string(),
        }))
    }
}
