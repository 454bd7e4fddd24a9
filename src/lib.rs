// Public modules
pub mod aggregate;
pub mod classify;
pub mod collector;
pub mod config;
pub mod policy;
pub mod provider;
pub mod report;
pub mod runner;
pub mod scan;
pub mod sinks;
pub mod slack;
pub mod snapshot;
pub mod types;

// Re-export commonly used items
pub use aggregate::{aggregate, Datapoint, MetricWindow, Statistic};
pub use collector::ResourceCollector;
pub use config::{
    load_config, load_config_with_env, EnvironmentProvider, MockEnvironment, SystemEnvironment,
};
pub use policy::ClassificationPolicy;
pub use provider::{AwsProvider, Page, ProviderError, ProviderResult, ResourceProvider};
pub use runner::scan_environments;
pub use scan::EnvironmentScanner;
pub use slack::{build_slack_payload, send_to_slack};
pub use snapshot::{load_snapshots, save_snapshot};
pub use types::*;
