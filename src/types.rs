use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Abnormality category. Closed set: one detector per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Saturation,
    Stagnation,
    Drift,
    Connectivity,
    Orchestration,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Saturation => "saturation",
            Category::Stagnation => "stagnation",
            Category::Drift => "drift",
            Category::Connectivity => "connectivity",
            Category::Orchestration => "orchestration",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tier crossed by an event's intensity.
///
/// Intensity is only comparable within a category; the tier is what sinks
/// should key display decisions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Elevated,
    Critical,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Elevated => "elevated",
            Tier::Critical => "critical",
        }
    }
}

/// One process row from the snapshot's process table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSample {
    pub name: String,
    pub cpu_percent: f64,
    /// Cumulative CPU time consumed over the process lifetime, in seconds.
    pub cpu_time_secs: u64,
}

/// Immutable point-in-time capture of host metrics.
///
/// Built once per poll cycle and dropped after detectors run; only derived
/// events outlive the cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: i64, // Unix epoch seconds
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub load_avg: [f64; 3],
    pub connection_count: usize,
    pub core_count: usize,
    pub processes: HashMap<u32, ProcessSample>,
}

/// A detected, categorized, severity-scored abnormality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: i64,
    pub category: Category,
    pub tier: Tier,
    /// Normalized [0,1] severity, meaningful only within its category.
    pub intensity: f64,
    /// Short label naming the detected shape, e.g. "overload".
    pub pattern: String,
    /// Subset of snapshot values that triggered the detector.
    pub detail_metrics: BTreeMap<String, f64>,
    pub message: String,
    pub recommended_action: String,
}

pub fn current_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::Orchestration).unwrap();
        assert_eq!(json, "\"orchestration\"");
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = Event {
            timestamp: 1756400000,
            category: Category::Saturation,
            tier: Tier::Critical,
            intensity: 0.95,
            pattern: "overload".to_string(),
            detail_metrics: BTreeMap::from([("cpu_percent".to_string(), 95.0)]),
            message: "cpu at 95%".to_string(),
            recommended_action: "find the hot process".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.category, Category::Saturation);
        assert_eq!(back.tier, Tier::Critical);
        assert_eq!(back.intensity, 0.95);
    }
}
