use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::classify;
use crate::collector::ResourceCollector;
use crate::policy::ClassificationPolicy;
use crate::provider::ResourceProvider;
use crate::types::{
    DatabaseCategory, DatabaseReport, EnvironmentResult, FunctionCategory, FunctionReport,
    LogReport, ResourceKind, RoleUsage, ScanError,
};

/// Scans one environment end to end: inventory, metric aggregation,
/// classification, report assembly.
///
/// Only the account identity lookup is fatal. A failed listing for one
/// resource kind leaves that section empty and records the failure; the other
/// kinds still run.
pub struct EnvironmentScanner<'a, P: ResourceProvider> {
    provider: &'a P,
    policy: &'a ClassificationPolicy,
}

impl<'a, P: ResourceProvider> EnvironmentScanner<'a, P> {
    pub fn new(provider: &'a P, policy: &'a ClassificationPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn scan(&self, environment: &str) -> Result<EnvironmentResult> {
        let account_id = self
            .provider
            .account_id()
            .await
            .with_context(|| format!("Failed to resolve account identity for {}", environment))?;
        info!("Scanning environment {} (account {})", environment, account_id);

        let scanned_at = Utc::now();
        let collector = ResourceCollector::new(self.provider, self.policy);
        let mut errors = Vec::new();

        let lambda = match collector.collect_functions().await {
            Ok((observations, mut errs)) => {
                errors.append(&mut errs);
                self.build_function_report(&observations)
            }
            Err(err) => {
                errors.push(ScanError {
                    kind: ResourceKind::Function,
                    resource: "list".to_string(),
                    message: err.to_string(),
                });
                FunctionReport::empty(self.policy.storage_limit_gb)
            }
        };
        info!(
            "{}: {} functions, {:.2} GB storage",
            environment, lambda.total_functions, lambda.total_storage_gb
        );

        let (rds, support) = match collector.collect_databases().await {
            Ok((descriptors, observations, mut errs)) => {
                errors.append(&mut errs);
                let today = scanned_at.date_naive();
                let support = descriptors
                    .iter()
                    .map(|d| classify::support::classify(d, today, self.policy))
                    .collect();
                let findings: Vec<_> = observations
                    .iter()
                    .map(|o| classify::databases::classify(o, self.policy))
                    .collect();
                let report = DatabaseReport {
                    total_instances: descriptors.len(),
                    unused_count: findings
                        .iter()
                        .filter(|f| f.category == DatabaseCategory::Unused)
                        .count(),
                    underused_count: findings
                        .iter()
                        .filter(|f| f.category == DatabaseCategory::Underused)
                        .count(),
                    findings,
                };
                (report, support)
            }
            Err(err) => {
                errors.push(ScanError {
                    kind: ResourceKind::Database,
                    resource: "list".to_string(),
                    message: err.to_string(),
                });
                (DatabaseReport::default(), Vec::new())
            }
        };
        info!(
            "{}: {} database instances ({} unused, {} underused)",
            environment, rds.total_instances, rds.unused_count, rds.underused_count
        );

        let iam = match collector.collect_role_usage().await {
            Ok((usage, mut errs)) => {
                errors.append(&mut errs);
                usage
            }
            Err(err) => {
                errors.push(ScanError {
                    kind: ResourceKind::Role,
                    resource: "list".to_string(),
                    message: err.to_string(),
                });
                RoleUsage::default()
            }
        };

        let logs = match collector.collect_log_groups().await {
            Ok((groups, mut errs)) => {
                errors.append(&mut errs);
                self.build_log_report(&groups, scanned_at)
            }
            Err(err) => {
                errors.push(ScanError {
                    kind: ResourceKind::LogGroup,
                    resource: "list".to_string(),
                    message: err.to_string(),
                });
                LogReport::default()
            }
        };
        info!(
            "{}: {} log groups, {} stale",
            environment, logs.total_log_groups, logs.old_log_groups_count
        );

        Ok(EnvironmentResult {
            environment: environment.to_string(),
            account_id: Some(account_id),
            scanned_at,
            lambda,
            iam,
            rds,
            support,
            logs,
            errors,
        })
    }

    fn build_function_report(
        &self,
        observations: &[classify::FunctionObservation],
    ) -> FunctionReport {
        let findings: Vec<_> = observations
            .iter()
            .map(|o| classify::functions::classify(o, self.policy))
            .collect();
        let total_storage_gb = findings.iter().map(|f| f.total_storage_mb).sum::<f64>() / 1024.0;
        FunctionReport {
            total_functions: findings.len(),
            total_storage_gb,
            storage_limit_gb: self.policy.storage_limit_gb,
            storage_percent: total_storage_gb / self.policy.storage_limit_gb * 100.0,
            unused_count: findings
                .iter()
                .filter(|f| f.category == FunctionCategory::Unused)
                .count(),
            version_bloat_count: findings
                .iter()
                .filter(|f| f.category == FunctionCategory::VersionBloat)
                .count(),
            findings,
        }
    }

    fn build_log_report(
        &self,
        groups: &[(crate::types::LogGroupDescriptor, Option<i64>)],
        now: chrono::DateTime<Utc>,
    ) -> LogReport {
        let total_storage_gb = groups
            .iter()
            .map(|(g, _)| g.stored_bytes as f64)
            .sum::<f64>()
            / (1024.0 * 1024.0 * 1024.0);
        let old: Vec<_> = groups
            .iter()
            .filter_map(|(g, last_event)| classify::logs::classify(g, *last_event, now, self.policy))
            .collect();
        LogReport {
            total_log_groups: groups.len(),
            old_log_groups_count: old.len(),
            total_storage_gb,
            // The report carries only the first 20; the count stays complete.
            old_log_groups: old.into_iter().take(20).collect(),
        }
    }
}
