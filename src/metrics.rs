//! Runtime counters surfaced on the status API.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct Metrics {
    started_at: Instant,
    cycles_run: AtomicU64,
    events_emitted: AtomicU64,
    detector_errors: AtomicU64,
    alerts_sent: AtomicU64,
    alerts_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            cycles_run: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
            detector_errors: AtomicU64::new(0),
            alerts_sent: AtomicU64::new(0),
            alerts_failed: AtomicU64::new(0),
        }
    }

    pub fn inc_cycles(&self) {
        self.cycles_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_detector_errors(&self) {
        self.detector_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_sent(&self) {
        self.alerts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_failed(&self) {
        self.alerts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_s: self.started_at.elapsed().as_secs(),
            cycles_run: self.cycles_run.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            detector_errors: self.detector_errors.load(Ordering::Relaxed),
            alerts_sent: self.alerts_sent.load(Ordering::Relaxed),
            alerts_failed: self.alerts_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub uptime_s: u64,
    pub cycles_run: u64,
    pub events_emitted: u64,
    pub detector_errors: u64,
    pub alerts_sent: u64,
    pub alerts_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.inc_cycles();
        metrics.inc_cycles();
        metrics.inc_events();
        metrics.inc_alerts_failed();

        let summary = metrics.snapshot();
        assert_eq!(summary.cycles_run, 2);
        assert_eq!(summary.events_emitted, 1);
        assert_eq!(summary.alerts_sent, 0);
        assert_eq!(summary.alerts_failed, 1);
    }
}
