//! Bounded in-memory event history with optional JSONL journaling.

use log::warn;
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::types::Event;

pub struct EventHistory {
    inner: Mutex<VecDeque<Event>>,
    capacity: usize,
    journal_path: Option<PathBuf>,
}

impl EventHistory {
    pub fn new(capacity: usize, journal_path: Option<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            journal_path,
        }
    }

    /// Append an event, evicting the oldest when at capacity. Journaling
    /// failures are logged, never propagated.
    pub fn append(&self, event: Event) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.len() == self.capacity {
                inner.pop_front();
            }
            inner.push_back(event.clone());
        }

        if let Some(path) = &self.journal_path {
            if let Err(err) = ensure_parent(path) {
                warn!("[history] failed to create directory for {}: {}", path.display(), err);
                return;
            }
            if let Err(err) = append_line(path, &event) {
                warn!("[history] failed to journal to {}: {}", path.display(), err);
            }
        }
    }

    /// Up to `limit` events, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<Event> {
        if limit == 0 {
            return Vec::new();
        }
        let inner = self.inner.lock().unwrap();
        inner.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn append_line(path: &Path, event: &Event) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}
