pub mod host;

pub use host::HostCollector;
