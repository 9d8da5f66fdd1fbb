//! Last-known-good reference values shared across poll cycles.
//!
//! Detectors key into their own namespace (e.g. `drift:/etc/hosts`) so no
//! two detectors ever write the same key. Cycles run strictly sequentially,
//! so a plain map needs no interior locking.
//!
//! Persistence is optional: with a path configured the whole map is
//! rewritten after each cycle and reloaded at startup. Without one, a
//! restart re-seeds every baseline from scratch (first observations are
//! never reported as drift, so nothing fires spuriously either way).

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum BaselineValue {
    /// Content hash or other opaque text marker.
    Text(String),
    Count(u64),
    Gauge(f64),
}

#[derive(Debug, Default)]
pub struct BaselineStore {
    values: HashMap<String, BaselineValue>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store backed by `path`, loading any previously persisted
    /// baselines. A missing or unreadable file starts empty.
    pub fn with_path(path: PathBuf) -> Self {
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(err) => {
                    warn!("[baseline] ignoring corrupt {}: {}", path.display(), err);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            values,
            path: Some(path),
            dirty: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&BaselineValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: BaselineValue) {
        self.values.insert(key.into(), value);
        self.dirty = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<BaselineValue> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Best-effort flush to the backing file, if any. Failure is logged,
    /// never propagated.
    pub fn persist(&mut self) {
        let Some(path) = &self.path else { return };
        if !self.dirty {
            return;
        }
        match serde_json::to_string_pretty(&self.values) {
            Ok(json) => {
                if let Err(err) = write_atomically(path, &json) {
                    warn!("[baseline] failed to persist {}: {}", path.display(), err);
                } else {
                    self.dirty = false;
                }
            }
            Err(err) => warn!("[baseline] failed to serialize baselines: {}", err),
        }
    }
}

fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
