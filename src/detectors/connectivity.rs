//! Connectivity: reachability of the configured health-check endpoints.
//!
//! Memoryless by design: an endpoint that stays down fires every cycle.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;

use super::Detector;
use super::probe::{ProbeResult, probe_endpoint};
use crate::baseline::BaselineStore;
use crate::types::{Category, Event, MetricsSnapshot, Tier};

const CRITICAL: f64 = 0.8;

pub struct ConnectivityDetector {
    endpoints: Vec<String>,
    client: Client,
}

impl ConnectivityDetector {
    pub fn new(endpoints: Vec<String>, client: Client) -> Self {
        Self { endpoints, client }
    }
}

/// Failure ratio plus a short description of what failed.
fn evaluate(results: &[(String, ProbeResult)]) -> (f64, Vec<String>) {
    let failures: Vec<String> = results
        .iter()
        .filter_map(|(url, result)| match result {
            ProbeResult::Failed { reason } => Some(format!("{url} ({reason})")),
            ProbeResult::Ok { .. } => None,
        })
        .collect();
    let intensity = if results.is_empty() {
        0.0
    } else {
        failures.len() as f64 / results.len() as f64
    };
    (intensity, failures)
}

#[async_trait]
impl Detector for ConnectivityDetector {
    fn name(&self) -> &'static str {
        "connectivity"
    }

    fn category(&self) -> Category {
        Category::Connectivity
    }

    async fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        _baseline: &mut BaselineStore,
    ) -> Result<Option<Event>> {
        if self.endpoints.is_empty() {
            return Ok(None);
        }

        let mut results = Vec::with_capacity(self.endpoints.len());
        for url in &self.endpoints {
            let result = probe_endpoint(&self.client, url).await;
            results.push((url.clone(), result));
        }

        let (intensity, failures) = evaluate(&results);
        if failures.is_empty() {
            return Ok(None);
        }

        let tier = if intensity >= CRITICAL {
            Tier::Critical
        } else {
            Tier::Elevated
        };
        let (pattern, recommended_action) = match tier {
            Tier::Critical => (
                "unreachable",
                "most endpoints are down; check the network path and upstream services",
            ),
            Tier::Elevated => (
                "degraded",
                "check the failing endpoints and their service logs",
            ),
        };

        let detail_metrics = BTreeMap::from([
            ("failed_endpoints".to_string(), failures.len() as f64),
            ("total_endpoints".to_string(), results.len() as f64),
        ]);

        Ok(Some(Event {
            timestamp: snapshot.timestamp,
            category: Category::Connectivity,
            tier,
            intensity,
            pattern: pattern.to_string(),
            detail_metrics,
            message: format!(
                "{}/{} health checks failing: {}",
                failures.len(),
                results.len(),
                failures.join(", ")
            ),
            recommended_action: recommended_action.to_string(),
        }))
    }
}
