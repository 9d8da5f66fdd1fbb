//! Configuration drift: content hashes of a fixed watch list.
//!
//! First sight of a file only records its hash; drift is strictly a
//! *change* from a recorded baseline. An unreadable file that previously
//! had a baseline counts as changed (the content we relied on is gone).

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::Detector;
use crate::baseline::{BaselineStore, BaselineValue};
use crate::types::{Category, Event, MetricsSnapshot, Tier};

const CRITICAL: f64 = 0.8;
const MAX_NAMED_PATHS: usize = 3;

pub struct DriftDetector {
    watch_files: Vec<PathBuf>,
}

impl DriftDetector {
    pub fn new(watch_files: Vec<PathBuf>) -> Self {
        Self { watch_files }
    }

    /// Expand the watch list: directories become their contained files.
    fn expand(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in &self.watch_files {
            if entry.is_dir() {
                files.extend(
                    WalkDir::new(entry)
                        .into_iter()
                        .filter_map(|e| e.ok())
                        .filter(|e| e.file_type().is_file())
                        .map(|e| e.path().to_path_buf()),
                );
            } else {
                files.push(entry.clone());
            }
        }
        files.sort();
        files
    }
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    let digest = Sha256::digest(&content);
    Ok(format!("{:x}", digest))
}

#[async_trait]
impl Detector for DriftDetector {
    fn name(&self) -> &'static str {
        "drift"
    }

    fn category(&self) -> Category {
        Category::Drift
    }

    async fn detect(
        &self,
        snapshot: &MetricsSnapshot,
        baseline: &mut BaselineStore,
    ) -> Result<Option<Event>> {
        let files = self.expand();
        if files.is_empty() {
            return Ok(None);
        }

        let mut changed: Vec<PathBuf> = Vec::new();
        for path in &files {
            let key = format!("drift:{}", path.display());
            let current = hash_file(path).ok();
            match (baseline.get(&key).cloned(), current) {
                // First observation: seed the baseline, never report.
                (None, Some(hash)) => baseline.set(key, BaselineValue::Text(hash)),
                // Never seen readable: nothing to compare against.
                (None, None) => {}
                (Some(BaselineValue::Text(prev)), Some(hash)) => {
                    if prev != hash {
                        changed.push(path.clone());
                        // Re-baseline so an unchanged file stays quiet next cycle.
                        baseline.set(key, BaselineValue::Text(hash));
                    }
                }
                // Had a baseline, now unreadable: that is a change.
                // Drop the baseline so the disappearance is reported once;
                // a reappearing file re-seeds silently like any first sight.
                (Some(BaselineValue::Text(_)), None) => {
                    changed.push(path.clone());
                    baseline.remove(&key);
                }
                (Some(_), _) => {}
            }
        }

        if changed.is_empty() {
            return Ok(None);
        }

        let intensity = (changed.len() as f64 / files.len() as f64).min(1.0);
        let tier = if intensity >= CRITICAL {
            Tier::Critical
        } else {
            Tier::Elevated
        };
        let (pattern, recommended_action) = match tier {
            Tier::Critical => (
                "config_sweep",
                "most of the watch list changed at once; audit for unintended rollout or compromise",
            ),
            Tier::Elevated => (
                "config_change",
                "diff the changed files against their expected contents",
            ),
        };

        let mut named: Vec<String> = changed
            .iter()
            .take(MAX_NAMED_PATHS)
            .map(|p| p.display().to_string())
            .collect();
        if changed.len() > MAX_NAMED_PATHS {
            named.push(format!("and {} more", changed.len() - MAX_NAMED_PATHS));
        }

        let detail_metrics = BTreeMap::from([
            ("changed_files".to_string(), changed.len() as f64),
            ("watched_files".to_string(), files.len() as f64),
        ]);

        Ok(Some(Event {
            timestamp: snapshot.timestamp,
            category: Category::Drift,
            tier,
            intensity,
            pattern: pattern.to_string(),
            detail_metrics,
            message: format!(
                "{} of {} watched file(s) changed: {}",
                changed.len(),
                files.len(),
                named.join(", ")
            ),
            recommended_action: recommended_action.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn empty_snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: 1756400000,
            cpu_percent: 5.0,
            memory_percent: 20.0,
            disk_percent: 30.0,
            load_avg: [0.1, 0.1, 0.1],
            connection_count: 10,
            core_count: 4,
            processes: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn first_observation_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.toml");
        std::fs::write(&file, "key = 1").unwrap();

        let detector = DriftDetector::new(vec![file]);
        let mut baseline = BaselineStore::new();
        let result = detector
            .detect(&empty_snapshot(), &mut baseline)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(baseline.len(), 1);
    }

    #[tokio::test]
    async fn change_fires_once_then_goes_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.toml");
        std::fs::write(&file, "key = 1").unwrap();

        let detector = DriftDetector::new(vec![file.clone()]);
        let mut baseline = BaselineStore::new();
        let snap = empty_snapshot();

        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_none());

        std::fs::write(&file, "key = 2").unwrap();
        let event = detector
            .detect(&snap, &mut baseline)
            .await
            .unwrap()
            .expect("change should fire");
        assert_eq!(event.category, Category::Drift);
        assert_eq!(event.intensity, 1.0);
        assert_eq!(event.tier, Tier::Critical);

        // No further real-world change: idempotent.
        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn intensity_scales_with_changed_fraction() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.conf");
        let b = dir.path().join("b.conf");
        let c = dir.path().join("c.conf");
        for f in [&a, &b, &c] {
            std::fs::write(f, "original").unwrap();
        }

        let detector = DriftDetector::new(vec![a.clone(), b, c]);
        let mut baseline = BaselineStore::new();
        let snap = empty_snapshot();
        detector.detect(&snap, &mut baseline).await.unwrap();

        std::fs::write(&a, "modified").unwrap();
        let event = detector
            .detect(&snap, &mut baseline)
            .await
            .unwrap()
            .expect("change should fire");
        assert!((event.intensity - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(event.tier, Tier::Elevated);
        assert_eq!(event.pattern, "config_change");
    }

    #[tokio::test]
    async fn deleted_file_with_baseline_counts_as_change() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.toml");
        std::fs::write(&file, "key = 1").unwrap();

        let detector = DriftDetector::new(vec![file.clone()]);
        let mut baseline = BaselineStore::new();
        let snap = empty_snapshot();
        detector.detect(&snap, &mut baseline).await.unwrap();

        std::fs::remove_file(&file).unwrap();
        let event = detector
            .detect(&snap, &mut baseline)
            .await
            .unwrap()
            .expect("deletion should fire");
        assert_eq!(event.detail_metrics["changed_files"], 1.0);

        // Still gone: nothing new to report.
        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_none());
        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reappearing_file_reseeds_silently() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.toml");
        std::fs::write(&file, "key = 1").unwrap();

        let detector = DriftDetector::new(vec![file.clone()]);
        let mut baseline = BaselineStore::new();
        let snap = empty_snapshot();
        detector.detect(&snap, &mut baseline).await.unwrap();

        std::fs::remove_file(&file).unwrap();
        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_some());

        std::fs::write(&file, "key = 2").unwrap();
        // First sight after the deletion was reported: baseline only.
        assert!(detector.detect(&snap, &mut baseline).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn directories_expand_to_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.conf"), "1").unwrap();
        std::fs::write(dir.path().join("two.conf"), "2").unwrap();

        let detector = DriftDetector::new(vec![dir.path().to_path_buf()]);
        let mut baseline = BaselineStore::new();
        detector
            .detect(&empty_snapshot(), &mut baseline)
            .await
            .unwrap();
        assert_eq!(baseline.len(), 2);
    }
}
