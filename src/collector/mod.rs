use crate::aggregate::{aggregate, MetricWindow, Statistic};
use crate::classify::{DatabaseObservation, FunctionObservation};
use crate::policy::ClassificationPolicy;
use crate::provider::{ProviderError, ResourceProvider};
use crate::types::{
    DatabaseDescriptor, LogGroupDescriptor, ResourceKind, ResourceTags, RoleUsage, ScanError,
};

/// Inventory collector for one environment: drives the provider's pagination
/// cursors to exhaustion and attaches per-resource auxiliary data.
///
/// Failure handling is two-tier. A failed listing call surfaces as an error to
/// the caller (the whole kind yields nothing). A failed auxiliary lookup for a
/// single resource degrades that field to a documented default, records a
/// [`ScanError`], and enumeration continues.
pub struct ResourceCollector<'a, P: ResourceProvider> {
    provider: &'a P,
    policy: &'a ClassificationPolicy,
}

impl<'a, P: ResourceProvider> ResourceCollector<'a, P> {
    pub fn new(provider: &'a P, policy: &'a ClassificationPolicy) -> Self {
        Self { provider, policy }
    }

    async fn metric_or_zero(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        window: MetricWindow,
        errors: &mut Vec<ScanError>,
    ) -> f64 {
        match self.provider.get_metric(kind, resource_id, &window).await {
            Ok(datapoints) => aggregate(&datapoints, window.statistic),
            Err(err) => {
                errors.push(ScanError {
                    kind,
                    resource: resource_id.to_string(),
                    message: format!("{}: {err}", window.metric),
                });
                0.0
            }
        }
    }

    pub async fn collect_functions(
        &self,
    ) -> Result<(Vec<FunctionObservation>, Vec<ScanError>), ProviderError> {
        let mut descriptors = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.provider.list_functions(cursor).await?;
            descriptors.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let mut observations = Vec::with_capacity(descriptors.len());
        let mut errors = Vec::new();
        let window_days = self.policy.function_window_days;

        for descriptor in descriptors {
            let mut version_count = 0usize;
            let mut total_storage_bytes = 0i64;
            let mut version_cursor = None;
            loop {
                match self
                    .provider
                    .list_function_versions(&descriptor.name, version_cursor)
                    .await
                {
                    Ok(page) => {
                        for version in page.items {
                            version_count += 1;
                            total_storage_bytes += version.code_size;
                        }
                        match page.next {
                            Some(next) => version_cursor = Some(next),
                            None => break,
                        }
                    }
                    Err(err) => {
                        errors.push(ScanError {
                            kind: ResourceKind::Function,
                            resource: descriptor.name.clone(),
                            message: format!("versions: {err}"),
                        });
                        break;
                    }
                }
            }

            let invocations_30d = self
                .metric_or_zero(
                    ResourceKind::Function,
                    &descriptor.name,
                    MetricWindow::last_days(
                        "Invocations",
                        window_days,
                        86_400 * window_days,
                        Statistic::Sum,
                    ),
                    &mut errors,
                )
                .await;
            let invocations_7d = self
                .metric_or_zero(
                    ResourceKind::Function,
                    &descriptor.name,
                    MetricWindow::last_days("Invocations", 7, 86_400 * 7, Statistic::Sum),
                    &mut errors,
                )
                .await;

            let tags = match self
                .provider
                .get_tags(ResourceKind::Function, &descriptor.arn)
                .await
            {
                Ok(map) => ResourceTags::from_map(&map),
                Err(err) => {
                    errors.push(ScanError {
                        kind: ResourceKind::Function,
                        resource: descriptor.name.clone(),
                        message: format!("tags: {err}"),
                    });
                    ResourceTags::not_available()
                }
            };

            observations.push(FunctionObservation {
                descriptor,
                version_count,
                total_storage_bytes,
                invocations_30d,
                invocations_7d,
                tags,
            });
        }

        Ok((observations, errors))
    }

    /// Returns every database descriptor (for totals and the support check)
    /// plus usage observations for instances in `available` status.
    pub async fn collect_databases(
        &self,
    ) -> Result<
        (
            Vec<DatabaseDescriptor>,
            Vec<DatabaseObservation>,
            Vec<ScanError>,
        ),
        ProviderError,
    > {
        let mut descriptors = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.provider.list_databases(cursor).await?;
            descriptors.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let mut observations = Vec::new();
        let mut errors = Vec::new();
        let unused_days = self.policy.db_unused_window_days;
        let recent_days = self.policy.db_recent_window_days;

        for descriptor in &descriptors {
            if descriptor.status != "available" {
                continue;
            }
            let id = descriptor.identifier.as_str();

            let cpu_6mo = self
                .metric_or_zero(
                    ResourceKind::Database,
                    id,
                    MetricWindow::last_days("CPUUtilization", unused_days, 86_400, Statistic::Average),
                    &mut errors,
                )
                .await;
            let transactions_6mo = self.iops_proxy(id, unused_days, &mut errors).await;
            let transactions_1mo = self.iops_proxy(id, recent_days, &mut errors).await;

            let tags = match self
                .provider
                .get_tags(ResourceKind::Database, &descriptor.arn)
                .await
            {
                Ok(map) => ResourceTags::from_map(&map),
                Err(err) => {
                    errors.push(ScanError {
                        kind: ResourceKind::Database,
                        resource: id.to_string(),
                        message: format!("tags: {err}"),
                    });
                    ResourceTags::not_available()
                }
            };

            observations.push(DatabaseObservation {
                descriptor: descriptor.clone(),
                cpu_6mo,
                transactions_6mo,
                transactions_1mo,
                tags,
            });
        }

        Ok((descriptors, observations, errors))
    }

    // Read+write IOPS summed over the window, used as a transaction proxy.
    async fn iops_proxy(&self, id: &str, days: i64, errors: &mut Vec<ScanError>) -> f64 {
        let read = self
            .metric_or_zero(
                ResourceKind::Database,
                id,
                MetricWindow::last_days("ReadIOPS", days, 86_400, Statistic::Sum),
                errors,
            )
            .await;
        let write = self
            .metric_or_zero(
                ResourceKind::Database,
                id,
                MetricWindow::last_days("WriteIOPS", days, 86_400, Statistic::Sum),
                errors,
            )
            .await;
        read + write
    }

    pub async fn collect_role_usage(
        &self,
    ) -> Result<(RoleUsage, Vec<ScanError>), ProviderError> {
        let mut listed_count = 0i64;
        let mut cursor = None;
        loop {
            let page = self.provider.list_roles(cursor).await?;
            listed_count += page.items.len() as i64;
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let mut errors = Vec::new();
        let (total_roles, roles_quota) = match self.provider.role_summary().await {
            Ok(summary) => (summary.roles, summary.quota),
            Err(err) => {
                errors.push(ScanError {
                    kind: ResourceKind::Role,
                    resource: "account-summary".to_string(),
                    message: err.to_string(),
                });
                (listed_count, self.policy.default_roles_quota)
            }
        };
        let roles_percent = if roles_quota > 0 {
            total_roles as f64 / roles_quota as f64 * 100.0
        } else {
            0.0
        };

        Ok((
            RoleUsage {
                total_roles,
                roles_quota,
                roles_percent,
            },
            errors,
        ))
    }

    /// Each log group paired with its newest stream event time, when the
    /// stream lookup succeeds.
    pub async fn collect_log_groups(
        &self,
    ) -> Result<(Vec<(LogGroupDescriptor, Option<i64>)>, Vec<ScanError>), ProviderError> {
        let mut descriptors = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.provider.list_log_groups(cursor).await?;
            descriptors.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let mut groups = Vec::with_capacity(descriptors.len());
        let mut errors = Vec::new();
        for descriptor in descriptors {
            let last_event = match self.provider.last_event_time_ms(&descriptor.name).await {
                Ok(ts) => ts,
                Err(err) => {
                    errors.push(ScanError {
                        kind: ResourceKind::LogGroup,
                        resource: descriptor.name.clone(),
                        message: format!("streams: {err}"),
                    });
                    None
                }
            };
            groups.push((descriptor, last_event));
        }

        Ok((groups, errors))
    }
}
