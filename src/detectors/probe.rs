//! Shared HTTP probe helper for the connectivity and orchestration
//! detectors. Both probe independently each cycle; they just reuse the
//! same mechanics (and the same bounded-timeout client).

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProbeResult {
    Ok { latency_ms: u64 },
    Failed { reason: String },
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .context("failed to build probe HTTP client")
}

/// Probe one endpoint. Timeouts, connect errors, and non-2xx statuses are
/// all failures, never errors: a dead endpoint is a data point.
pub(crate) async fn probe_endpoint(client: &Client, url: &str) -> ProbeResult {
    let started = Instant::now();
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => ProbeResult::Ok {
            latency_ms: started.elapsed().as_millis() as u64,
        },
        Ok(resp) => ProbeResult::Failed {
            reason: format!("status {}", resp.status()),
        },
        Err(err) if err.is_timeout() => ProbeResult::Failed {
            reason: "timeout".to_string(),
        },
        Err(err) => ProbeResult::Failed {
            reason: err.to_string(),
        },
    }
}
