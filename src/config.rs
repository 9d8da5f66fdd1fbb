//! Daemon configuration: TOML file plus environment overrides.
//!
//! Everything has a default so `vigild` runs with no config at all
//! (alerts then go to the log only). `VIGILD_WEBHOOK_URL` and
//! `VIGILD_INTERVAL_MINS` override whatever the file says.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_POLL_INTERVAL_MINS: u64 = 15;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Minutes between poll cycles.
    pub poll_interval_mins: u64,
    /// Capacity of the in-memory event history (FIFO eviction).
    pub history_capacity: usize,
    /// Listen address for the read-only status API; unset disables it.
    pub listen: Option<String>,
    /// Webhook destination for alerts; unset means log-only alerting.
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
    /// Optional JSONL file every event is appended to.
    pub journal_path: Option<PathBuf>,
    /// Optional JSON file baselines are persisted to across restarts.
    /// Unset keeps baselines in memory only, so a restart re-seeds them.
    pub baseline_path: Option<PathBuf>,
    /// Files (or directories, expanded recursively) watched for content drift.
    pub watch_files: Vec<PathBuf>,
    /// HTTP endpoints probed each cycle for reachability and latency.
    pub health_endpoints: Vec<String>,
    /// Process names expected to be running at all times.
    pub expected_services: Vec<String>,
    /// Established-connection count considered normal for this host.
    pub connection_baseline: usize,
    pub probe_timeout_secs: u64,
    /// Successful probes slower than this count as orchestration issues.
    pub latency_budget_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_mins: DEFAULT_POLL_INTERVAL_MINS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            listen: None,
            webhook_url: None,
            webhook_timeout_secs: 5,
            journal_path: None,
            baseline_path: None,
            watch_files: Vec::new(),
            health_endpoints: Vec::new(),
            expected_services: Vec::new(),
            connection_baseline: 200,
            probe_timeout_secs: 5,
            latency_budget_ms: 2000,
        }
    }
}

impl Config {
    /// Load config from `path` (defaults when `None`), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config {}", p.display()))?
            }
            None => Config::default(),
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var("VIGILD_WEBHOOK_URL")
            && !url.trim().is_empty()
        {
            self.webhook_url = Some(url);
        }
        if let Ok(mins) = env::var("VIGILD_INTERVAL_MINS")
            && let Ok(parsed) = mins.trim().parse::<u64>()
        {
            self.poll_interval_mins = parsed;
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.poll_interval_mins > 0, "poll_interval_mins must be > 0");
        anyhow::ensure!(self.history_capacity > 0, "history_capacity must be > 0");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.poll_interval_mins, 15);
        assert_eq!(cfg.history_capacity, 100);
        assert!(cfg.webhook_url.is_none());
        assert!(cfg.watch_files.is_empty());
    }

    #[test]
    fn parses_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
poll_interval_mins = 5
webhook_url = "http://localhost:9999/hook"
watch_files = ["/etc/hosts"]
health_endpoints = ["http://localhost:8080/healthz"]
expected_services = ["postgres"]
"#
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.poll_interval_mins, 5);
        assert_eq!(cfg.webhook_url.as_deref(), Some("http://localhost:9999/hook"));
        assert_eq!(cfg.watch_files.len(), 1);
        assert_eq!(cfg.expected_services, vec!["postgres".to_string()]);
        // untouched fields keep defaults
        assert_eq!(cfg.connection_baseline, 200);
    }

    #[test]
    fn rejects_zero_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_mins = 0").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pol_interval_mins = 5").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}
