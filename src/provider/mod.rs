use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::aggregate::{Datapoint, MetricWindow};
use crate::types::{
    DatabaseDescriptor, FunctionDescriptor, FunctionVersion, LogGroupDescriptor, ResourceKind,
    RoleSummary,
};

pub mod aws;

pub use aws::AwsProvider;

/// Failure taxonomy surfaced by the inventory/telemetry provider. The core
/// treats all variants identically (log, default, continue) but keeps them
/// distinguishable for the audit trail.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("throttled: {0}")]
    Throttled(String),
    #[error("{0}")]
    Other(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// One page of a paginated listing. `next` is an opaque cursor; `None` means
/// the listing is exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Abstract inventory/telemetry provider for one environment. Each resource
/// kind paginates independently; a single call may fail without poisoning the
/// provider for later calls.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Resolve the account identity for this environment. Failure here is the
    /// only error that aborts an environment scan outright.
    async fn account_id(&self) -> ProviderResult<String>;

    async fn list_functions(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<FunctionDescriptor>>;

    async fn list_function_versions(
        &self,
        function_name: &str,
        cursor: Option<String>,
    ) -> ProviderResult<Page<FunctionVersion>>;

    async fn list_databases(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<DatabaseDescriptor>>;

    /// Role names, used only as a count fallback when the summary call fails.
    async fn list_roles(&self, cursor: Option<String>) -> ProviderResult<Page<String>>;

    async fn role_summary(&self) -> ProviderResult<RoleSummary>;

    async fn list_log_groups(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<LogGroupDescriptor>>;

    /// Millisecond timestamp of the newest event in the group's newest
    /// stream, if the group has any stream with events.
    async fn last_event_time_ms(&self, log_group: &str) -> ProviderResult<Option<i64>>;

    async fn get_metric(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        window: &MetricWindow,
    ) -> ProviderResult<Vec<Datapoint>>;

    async fn get_tags(
        &self,
        kind: ResourceKind,
        arn: &str,
    ) -> ProviderResult<HashMap<String, String>>;
}
