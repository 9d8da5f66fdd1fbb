//! Runs every registered detector against one snapshot and routes the
//! resulting events to the sinks and the history.
//!
//! A detector failure is logged and skipped; it never stops the rest of
//! the registry. Delivery failure never stops history recording.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::alert::AlertSink;
use crate::baseline::BaselineStore;
use crate::detectors::Detector;
use crate::history::EventHistory;
use crate::metrics::Metrics;
use crate::pretty::log_line;
use crate::types::{Event, MetricsSnapshot};

pub struct Dispatcher {
    detectors: Vec<Box<dyn Detector>>,
    sinks: Vec<Box<dyn AlertSink>>,
    history: Arc<EventHistory>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(
        detectors: Vec<Box<dyn Detector>>,
        sinks: Vec<Box<dyn AlertSink>>,
        history: Arc<EventHistory>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            detectors,
            sinks,
            history,
            metrics,
        }
    }

    pub async fn run_cycle(
        &self,
        snapshot: &MetricsSnapshot,
        baseline: &mut BaselineStore,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        for detector in &self.detectors {
            match detector.detect(snapshot, baseline).await {
                Ok(Some(event)) => {
                    info!("[dispatcher] {}", log_line(&event));
                    self.metrics.inc_events();
                    self.deliver(&event).await;
                    self.history.append(event.clone());
                    events.push(event);
                }
                Ok(None) => debug!("[dispatcher] {}: nothing abnormal", detector.name()),
                Err(err) => {
                    self.metrics.inc_detector_errors();
                    warn!("[dispatcher] detector {} failed: {:#}", detector.name(), err);
                }
            }
        }

        events
    }

    async fn deliver(&self, event: &Event) {
        for sink in &self.sinks {
            if sink.send(event).await {
                self.metrics.inc_alerts_sent();
            } else {
                self.metrics.inc_alerts_failed();
            }
        }
    }

    /// Best-effort broadcast of a bare text message to every sink.
    pub async fn deliver_text(&self, text: &str) {
        for sink in &self.sinks {
            if !sink.send_text(text).await {
                warn!("[dispatcher] {} refused final message", sink.name());
            }
        }
    }
}
