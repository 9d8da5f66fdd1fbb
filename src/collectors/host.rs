//! Host metrics collection via sysinfo and procfs.
//!
//! `collect` is deliberately tolerant: any sub-metric that cannot be read
//! falls back to a zero/empty default so a broken /proc entry never takes
//! the daemon down. CPU sampling needs two refreshes with a real delay in
//! between, which bounds the minimum poll interval at about a second.

use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use sysinfo::{Disks, ProcessesToUpdate, System};
use tokio::time::sleep;

use crate::types::{MetricsSnapshot, ProcessSample, current_epoch_secs};

const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

pub struct HostCollector {
    sys: System,
}

impl Default for HostCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCollector {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    /// Capture one snapshot. Blocks the cycle for the CPU sampling window.
    pub async fn collect(&mut self) -> MetricsSnapshot {
        self.sys.refresh_cpu_usage();
        sleep(CPU_SAMPLE_WINDOW).await;
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        let cpu_percent = f64::from(self.sys.global_cpu_usage()).clamp(0.0, 100.0);
        let memory_percent = percent(self.sys.used_memory(), self.sys.total_memory());

        let load = System::load_average();
        let load_avg = [load.one, load.five, load.fifteen];

        let mut processes = HashMap::new();
        for (pid, proc) in self.sys.processes() {
            processes.insert(
                pid.as_u32(),
                ProcessSample {
                    name: proc.name().to_string_lossy().into_owned(),
                    cpu_percent: f64::from(proc.cpu_usage()),
                    cpu_time_secs: proc.accumulated_cpu_time() / 1000,
                },
            );
        }

        MetricsSnapshot {
            timestamp: current_epoch_secs(),
            cpu_percent,
            memory_percent,
            disk_percent: root_disk_percent(),
            load_avg,
            connection_count: established_connections(),
            core_count: self.sys.cpus().len().max(1),
            processes,
        }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Usage of the filesystem mounted at `/`, or the fullest disk when no
/// root mount is visible. 0.0 when nothing can be read.
fn root_disk_percent() -> f64 {
    let disks = Disks::new_with_refreshed_list();
    let mut fallback = 0.0f64;
    for disk in disks.list() {
        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        let pct = percent(used, total);
        if disk.mount_point() == std::path::Path::new("/") {
            return pct;
        }
        fallback = fallback.max(pct);
    }
    fallback
}

/// Count of established TCP connections from /proc. Read failures count
/// as zero rather than failing the cycle.
fn established_connections() -> usize {
    let mut count = 0;
    match procfs::net::tcp() {
        Ok(entries) => {
            count += entries
                .iter()
                .filter(|e| e.state == procfs::net::TcpState::Established)
                .count()
        }
        Err(err) => debug!("[collector] tcp table unreadable: {}", err),
    }
    match procfs::net::tcp6() {
        Ok(entries) => {
            count += entries
                .iter()
                .filter(|e| e.state == procfs::net::TcpState::Established)
                .count()
        }
        Err(err) => debug!("[collector] tcp6 table unreadable: {}", err),
    }
    count
}
