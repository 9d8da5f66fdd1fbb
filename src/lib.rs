pub mod alert;
pub mod baseline;
pub mod collectors;
pub mod config;
pub mod daemon;
pub mod detectors;
pub mod dispatcher;
pub mod history;
pub mod metrics;
pub mod pretty;
pub mod server;
pub mod types;

pub use baseline::BaselineStore;
pub use config::Config;
pub use history::EventHistory;
pub use metrics::Metrics;
pub use types::{Category, Event, MetricsSnapshot, Tier};
