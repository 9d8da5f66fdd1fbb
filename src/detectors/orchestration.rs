//! Orchestration faults: expected services missing from the process table,
//! and health probes that answer but blow the latency budget.
//!
//! Probe *failures* belong to the connectivity detector; this one only
//! counts slow successes, so the two never report the same endpoint twice.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;

use super::Detector;
use super::probe::{ProbeResult, probe_endpoint};
use crate::baseline::BaselineStore;
use crate::types::{Category, Event, MetricsSnapshot, Tier};

const CRITICAL: f64 = 0.8;
const MISSING_WEIGHT: f64 = 0.4;
const SLOW_WEIGHT: f64 = 0.3;

pub struct OrchestrationDetector {
    expected_services: Vec<String>,
    endpoints: Vec<String>,
    latency_budget_ms: u64,
    client: Client,
}

impl OrchestrationDetector {
    pub fn new(
        expected_services: Vec<String>,
        endpoints: Vec<String>,
        latency_budget_ms: u64,
        client: Client,
    ) -> Self {
        Self {
            expected_services,
            endpoints,
            latency_budget_ms,
            client,
        }
    }
}

/// Kernel comm names are truncated to 15 bytes, so match on prefix in
/// either direction, case-insensitively.
fn service_running(snapshot: &MetricsSnapshot, service: &str) -> bool {
    let wanted = service.to_ascii_lowercase();
    snapshot.processes.values().any(|p| {
        let name = p.name.to_ascii_lowercase();
        name.starts_with(&wanted) || wanted.starts_with(&name)
    })
}

fn score(missing: usize, slow: usize) -> f64 {
    (missing as f64 * MISSING_WEIGHT + slow as f64 * SLOW_WEIGHT).min(1.0)
}

#[async_trait]
impl Detector for OrchestrationDetector {
    fn name(&self) -> &'static str {
        "orchestration"
    }

    fn category(&self) -> Category {
        Category::Orchestration
    }

    async fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        _baseline: &mut BaselineStore,
    ) -> Result<Option<Event>> {
        if self.expected_services.is_empty() && self.endpoints.is_empty() {
            return Ok(None);
        }

        let missing: Vec<&String> = self
            .expected_services
            .iter()
            .filter(|svc| !service_running(snapshot, svc))
            .collect();

        let mut slow: Vec<String> = Vec::new();
        for url in &self.endpoints {
            if let ProbeResult::Ok { latency_ms } = probe_endpoint(&self.client, url).await
                && latency_ms > self.latency_budget_ms
            {
                slow.push(format!("{url} ({latency_ms}ms)"));
            }
        }

        if missing.is_empty() && slow.is_empty() {
            return Ok(None);
        }

        let intensity = score(missing.len(), slow.len());
        let tier = if intensity >= CRITICAL {
            Tier::Critical
        } else {
            Tier::Elevated
        };
        let (pattern, recommended_action) = if missing.is_empty() {
            (
                "latency_breach",
                "profile the slow endpoints; they respond but exceed the latency budget",
            )
        } else {
            (
                "service_down",
                "restart the missing services and check their supervisor logs",
            )
        };

        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!(
                "services not running: {}",
                missing
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !slow.is_empty() {
            parts.push(format!("slow probes: {}", slow.join(", ")));
        }

        let detail_metrics = BTreeMap::from([
            ("missing_services".to_string(), missing.len() as f64),
            ("slow_probes".to_string(), slow.len() as f64),
            (
                "latency_budget_ms".to_string(),
                self.latency_budget_ms as f64,
            ),
        ]);

        Ok(Some(Event {
            timestamp: snapshot.timestamp,
            category: Category::Orchestration,
            tier,
            intensity,
            pattern: pattern.to_string(),
            detail_metrics,
            message: parts.join("; "),
            recommended_action: recommended_action.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessSample;
    use std::collections::HashMap;

    fn snapshot_with_processes(names: &[&str]) -> MetricsSnapshot {
        let processes: HashMap<u32, ProcessSample> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (
                    i as u32 + 1,
                    ProcessSample {
                        name: name.to_string(),
                        cpu_percent: 1.0,
                        cpu_time_secs: 100,
                    },
                )
            })
            .collect();
        MetricsSnapshot {
            timestamp: 1756400000,
            cpu_percent: 5.0,
            memory_percent: 20.0,
            disk_percent: 30.0,
            load_avg: [0.1, 0.1, 0.1],
            connection_count: 10,
            core_count: 4,
            processes,
        }
    }

    #[test]
    fn matches_truncated_comm_names() {
        let snap = snapshot_with_processes(&["postgres", "systemd-resolve"]);
        assert!(service_running(&snap, "postgres"));
        // asked for the full name, comm is truncated
        assert!(service_running(&snap, "systemd-resolved"));
        assert!(!service_running(&snap, "redis-server"));
    }

    #[test]
    fn score_weights_and_caps() {
        assert_eq!(score(0, 0), 0.0);
        assert_eq!(score(1, 0), 0.4);
        assert_eq!(score(0, 2), 0.6);
        assert_eq!(score(2, 1), 1.0);
        assert_eq!(score(5, 5), 1.0);
    }

    #[tokio::test]
    async fn all_services_present_emits_nothing() {
        let client = reqwest::Client::new();
        let detector = OrchestrationDetector::new(
            vec!["postgres".to_string()],
            Vec::new(),
            2000,
            client,
        );
        let mut baseline = BaselineStore::new();
        let snap = snapshot_with_processes(&["postgres"]);
        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_service_fires_elevated() {
        let client = reqwest::Client::new();
        let detector = OrchestrationDetector::new(
            vec!["redis-server".to_string()],
            Vec::new(),
            2000,
            client,
        );
        let mut baseline = BaselineStore::new();
        let snap = snapshot_with_processes(&["postgres"]);
        let event = detector
            .detect(&snap, &mut baseline)
            .await
            .unwrap()
            .expect("should fire");
        assert_eq!(event.category, Category::Orchestration);
        assert_eq!(event.tier, Tier::Elevated);
        assert_eq!(event.pattern, "service_down");
        assert!((event.intensity - 0.4).abs() < 1e-9);
        assert!(event.message.contains("redis-server"));
    }

    #[tokio::test]
    async fn two_missing_services_go_critical() {
        let client = reqwest::Client::new();
        let detector = OrchestrationDetector::new(
            vec!["redis-server".to_string(), "nginx".to_string()],
            Vec::new(),
            2000,
            client,
        );
        let mut baseline = BaselineStore::new();
        let snap = snapshot_with_processes(&["postgres"]);
        let event = detector
            .detect(&snap, &mut baseline)
            .await
            .unwrap()
            .expect("should fire");
        assert_eq!(event.tier, Tier::Critical);
        assert!((event.intensity - 0.8).abs() < 1e-9);
    }
}
