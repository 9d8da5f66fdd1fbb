//! The scheduler loop: collect → detect → alert → sleep, forever, until
//! a shutdown signal interrupts the sleep. A cycle already in flight runs
//! to completion; only the sleep is cancellable.

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::time::sleep;

use crate::baseline::BaselineStore;
use crate::collectors::HostCollector;
use crate::dispatcher::Dispatcher;
use crate::types::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Collecting = 1,
    Detecting = 2,
    Alerting = 3,
    Sleeping = 4,
    Stopped = 5,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Collecting => "collecting",
            Phase::Detecting => "detecting",
            Phase::Alerting => "alerting",
            Phase::Sleeping => "sleeping",
            Phase::Stopped => "stopped",
        }
    }

    fn from_u8(v: u8) -> Phase {
        match v {
            1 => Phase::Collecting,
            2 => Phase::Detecting,
            3 => Phase::Alerting,
            4 => Phase::Sleeping,
            5 => Phase::Stopped,
            _ => Phase::Idle,
        }
    }
}

/// Lock-free cell the status API reads while the loop writes.
#[derive(Default)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn set(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Relaxed);
    }

    pub fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Relaxed))
    }
}

pub struct Daemon {
    collector: HostCollector,
    dispatcher: Dispatcher,
    baseline: BaselineStore,
    interval: Duration,
    phase: Arc<PhaseCell>,
    metrics: Arc<crate::metrics::Metrics>,
}

impl Daemon {
    pub fn new(
        collector: HostCollector,
        dispatcher: Dispatcher,
        baseline: BaselineStore,
        interval: Duration,
        phase: Arc<PhaseCell>,
        metrics: Arc<crate::metrics::Metrics>,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            baseline,
            interval,
            phase,
            metrics,
        }
    }

    /// Run exactly one collect→detect→alert cycle.
    pub async fn run_once(&mut self) -> Vec<Event> {
        self.phase.set(Phase::Collecting);
        let snapshot = self.collector.collect().await;

        self.phase.set(Phase::Detecting);
        // Alerting happens inside the dispatcher as each event surfaces;
        // the phase split is for observability, not a hard boundary.
        self.phase.set(Phase::Alerting);
        let events = self.dispatcher.run_cycle(&snapshot, &mut self.baseline).await;

        self.baseline.persist();
        self.metrics.inc_cycles();
        info!(
            "[daemon] cycle {} complete: {} event(s), cpu {:.1}%, mem {:.1}%",
            self.metrics.cycles_run(),
            events.len(),
            snapshot.cpu_percent,
            snapshot.memory_percent
        );
        events
    }

    /// Run cycles until a Ctrl-C/SIGINT arrives during the sleep phase.
    ///
    /// Cycles themselves cannot fail (collection and detection degrade
    /// instead of erroring); the only `Err` out of here is losing the
    /// shutdown signal handler, after which the daemon could no longer
    /// be stopped cleanly.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "[daemon] starting, poll interval {}s",
            self.interval.as_secs()
        );
        loop {
            self.run_once().await;

            self.phase.set(Phase::Sleeping);
            tokio::select! {
                _ = sleep(self.interval) => {}
                signal = tokio::signal::ctrl_c() => {
                    self.phase.set(Phase::Stopped);
                    signal.context("failed to listen for shutdown signal")?;
                    info!("[daemon] shutdown signal received, stopping");
                    return Ok(());
                }
            }
        }
    }

    /// Best-effort final critical alert before a fatal exit.
    pub async fn send_farewell(&self, reason: &str) {
        self.phase.set(Phase::Stopped);
        self.dispatcher
            .deliver_text(&crate::pretty::farewell_text(reason))
            .await;
    }
}
