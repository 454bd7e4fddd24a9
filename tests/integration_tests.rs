use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use cloud_resource_reporter::{
    aggregate, scan_environments, ClassificationPolicy, DatabaseCategory, DatabaseDescriptor,
    Datapoint, EnvironmentScanner, EnvironmentSpec, FunctionCategory, FunctionDescriptor,
    FunctionVersion, LogGroupDescriptor, MetricWindow, Page, ProviderError, ProviderResult,
    ResourceKind, ResourceProvider, RoleSummary, Statistic, SupportStatus,
};

const MIB: i64 = 1024 * 1024;

/// In-memory provider with per-call failure injection. Listings paginate in
/// pages of two so the cursor loops are exercised.
#[derive(Default)]
struct MockProvider {
    account: Option<String>,
    functions: Vec<FunctionDescriptor>,
    versions: HashMap<String, Vec<FunctionVersion>>,
    databases: Vec<DatabaseDescriptor>,
    roles: Vec<String>,
    role_summary: Option<RoleSummary>,
    log_groups: Vec<LogGroupDescriptor>,
    last_events: HashMap<String, i64>,
    // key: "resource:metric:window-days"
    metrics: HashMap<String, Vec<f64>>,
    tags: HashMap<String, HashMap<String, String>>,
    fail_databases: bool,
    fail_tags: bool,
}

const PAGE_SIZE: usize = 2;

fn page_of<T: Clone>(items: &[T], cursor: Option<String>) -> Page<T> {
    let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
    let end = (start + PAGE_SIZE).min(items.len());
    let next = if end < items.len() {
        Some(end.to_string())
    } else {
        None
    };
    Page {
        items: items[start..end].to_vec(),
        next,
    }
}

fn metric_key(resource_id: &str, window: &MetricWindow) -> String {
    let days = (window.end - window.start).num_days();
    format!("{}:{}:{}", resource_id, window.metric, days)
}

#[async_trait]
impl ResourceProvider for MockProvider {
    async fn account_id(&self) -> ProviderResult<String> {
        self.account
            .clone()
            .ok_or_else(|| ProviderError::AccessDenied("sts".to_string()))
    }

    async fn list_functions(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<FunctionDescriptor>> {
        Ok(page_of(&self.functions, cursor))
    }

    async fn list_function_versions(
        &self,
        function_name: &str,
        cursor: Option<String>,
    ) -> ProviderResult<Page<FunctionVersion>> {
        let versions = self.versions.get(function_name).cloned().unwrap_or_default();
        Ok(page_of(&versions, cursor))
    }

    async fn list_databases(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<DatabaseDescriptor>> {
        if self.fail_databases {
            return Err(ProviderError::Throttled("rds".to_string()));
        }
        Ok(page_of(&self.databases, cursor))
    }

    async fn list_roles(&self, cursor: Option<String>) -> ProviderResult<Page<String>> {
        Ok(page_of(&self.roles, cursor))
    }

    async fn role_summary(&self) -> ProviderResult<RoleSummary> {
        self.role_summary
            .ok_or_else(|| ProviderError::AccessDenied("iam:GetAccountSummary".to_string()))
    }

    async fn list_log_groups(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<LogGroupDescriptor>> {
        Ok(page_of(&self.log_groups, cursor))
    }

    async fn last_event_time_ms(&self, log_group: &str) -> ProviderResult<Option<i64>> {
        Ok(self.last_events.get(log_group).copied())
    }

    async fn get_metric(
        &self,
        _kind: ResourceKind,
        resource_id: &str,
        window: &MetricWindow,
    ) -> ProviderResult<Vec<Datapoint>> {
        let values = self
            .metrics
            .get(&metric_key(resource_id, window))
            .cloned()
            .unwrap_or_default();
        Ok(values
            .into_iter()
            .map(|value| Datapoint {
                timestamp: window.start,
                value,
            })
            .collect())
    }

    async fn get_tags(
        &self,
        _kind: ResourceKind,
        arn: &str,
    ) -> ProviderResult<HashMap<String, String>> {
        if self.fail_tags {
            return Err(ProviderError::AccessDenied("tags".to_string()));
        }
        Ok(self.tags.get(arn).cloned().unwrap_or_default())
    }
}

fn function(name: &str) -> FunctionDescriptor {
    FunctionDescriptor {
        name: name.to_string(),
        arn: format!("arn:aws:lambda:us-west-2:123:function:{}", name),
        runtime: Some("python3.12".to_string()),
        code_size: 5 * MIB,
    }
}

fn versions(count: usize, code_size: i64) -> Vec<FunctionVersion> {
    (0..count)
        .map(|i| FunctionVersion {
            version: i.to_string(),
            code_size,
        })
        .collect()
}

fn database(id: &str, engine: &str, version: &str, class: &str, status: &str) -> DatabaseDescriptor {
    DatabaseDescriptor {
        identifier: id.to_string(),
        arn: format!("arn:aws:rds:us-west-2:123:db:{}", id),
        engine: engine.to_string(),
        engine_version: version.to_string(),
        instance_class: class.to_string(),
        status: status.to_string(),
    }
}

fn fixture_provider() -> MockProvider {
    let mut provider = MockProvider {
        account: Some("123456789012".to_string()),
        ..MockProvider::default()
    };

    provider.functions = vec![
        function("fn-unused"),
        function("fn-active"),
        function("fn-bloated"),
    ];
    provider
        .versions
        .insert("fn-unused".to_string(), versions(2, 5 * MIB));
    provider
        .versions
        .insert("fn-active".to_string(), versions(1, 20 * MIB));
    provider
        .versions
        .insert("fn-bloated".to_string(), versions(12, 10 * MIB));
    provider
        .metrics
        .insert("fn-active:Invocations:30".to_string(), vec![500.0]);
    provider
        .metrics
        .insert("fn-active:Invocations:7".to_string(), vec![120.0]);
    provider
        .metrics
        .insert("fn-bloated:Invocations:30".to_string(), vec![100.0]);
    provider.tags.insert(
        "arn:aws:lambda:us-west-2:123:function:fn-active".to_string(),
        HashMap::from([
            ("Owner".to_string(), "platform".to_string()),
            ("repo".to_string(), "org/app".to_string()),
        ]),
    );

    provider.databases = vec![
        database("db-idle", "postgres", "12.9", "db.r5.xlarge", "available"),
        database("db-stopped", "postgres", "16.1", "db.t3.medium", "stopped"),
    ];
    provider
        .metrics
        .insert("db-idle:CPUUtilization:180".to_string(), vec![10.0]);
    provider
        .metrics
        .insert("db-idle:ReadIOPS:180".to_string(), vec![100.0]);
    provider
        .metrics
        .insert("db-idle:WriteIOPS:180".to_string(), vec![50.0]);
    provider
        .metrics
        .insert("db-idle:ReadIOPS:30".to_string(), vec![10.0]);
    provider
        .metrics
        .insert("db-idle:WriteIOPS:30".to_string(), vec![5.0]);

    provider.roles = (0..5).map(|i| format!("role-{}", i)).collect();
    provider.role_summary = Some(RoleSummary {
        roles: 450,
        quota: 1000,
    });

    let now = Utc::now();
    provider.log_groups = vec![
        LogGroupDescriptor {
            name: "/aws/lambda/stale".to_string(),
            stored_bytes: MIB * 1024,
            creation_time_ms: (now - Duration::days(400)).timestamp_millis(),
        },
        LogGroupDescriptor {
            name: "/aws/lambda/fresh".to_string(),
            stored_bytes: MIB * 512,
            creation_time_ms: (now - Duration::days(400)).timestamp_millis(),
        },
    ];
    provider.last_events.insert(
        "/aws/lambda/stale".to_string(),
        (now - Duration::days(200)).timestamp_millis(),
    );
    provider.last_events.insert(
        "/aws/lambda/fresh".to_string(),
        (now - Duration::days(5)).timestamp_millis(),
    );

    provider
}

#[tokio::test]
async fn test_full_environment_scan() {
    let provider = fixture_provider();
    let policy = ClassificationPolicy::default();
    let scanner = EnvironmentScanner::new(&provider, &policy);

    let result = scanner.scan("dev").await.unwrap();
    assert_eq!(result.environment, "dev");
    assert_eq!(result.account_id.as_deref(), Some("123456789012"));
    assert!(result.errors.is_empty());

    // Lambda: 2 + 1 + 12 versions at 5/20/10 MiB.
    assert_eq!(result.lambda.total_functions, 3);
    assert_eq!(result.lambda.unused_count, 1);
    assert_eq!(result.lambda.version_bloat_count, 1);
    let expected_gb = (2 * 5 + 20 + 12 * 10) as f64 / 1024.0;
    assert!((result.lambda.total_storage_gb - expected_gb).abs() < 1e-9);
    assert!(
        (result.lambda.storage_percent - expected_gb / 300.0 * 100.0).abs() < 1e-9
    );
    let by_name: HashMap<_, _> = result
        .lambda
        .findings
        .iter()
        .map(|f| (f.name.as_str(), f))
        .collect();
    assert_eq!(by_name["fn-unused"].category, FunctionCategory::Unused);
    assert_eq!(by_name["fn-active"].category, FunctionCategory::Active);
    assert_eq!(by_name["fn-bloated"].category, FunctionCategory::VersionBloat);
    assert_eq!(by_name["fn-active"].tags.owner, "platform");
    assert_eq!(by_name["fn-active"].tags.repo, "org/app");
    assert_eq!(by_name["fn-unused"].tags.owner, "N/A");

    // RDS: the stopped instance counts toward totals but is not classified.
    assert_eq!(result.rds.total_instances, 2);
    assert_eq!(result.rds.findings.len(), 1);
    assert_eq!(result.rds.underused_count, 1);
    let idle = &result.rds.findings[0];
    assert_eq!(idle.category, DatabaseCategory::Underused);
    assert_eq!(idle.reason, "CPU: 10.00%; Transactions/month: 15");

    // Support runs over every instance including the stopped one.
    assert_eq!(result.support.len(), 2);
    let support: HashMap<_, _> = result
        .support
        .iter()
        .map(|s| (s.identifier.as_str(), s))
        .collect();
    assert_eq!(
        support["db-idle"].support,
        SupportStatus::InExtendedSupport
    );
    assert_eq!(support["db-idle"].vcpu_count, 4);
    assert!(support["db-idle"].below_minimum_version);
    assert_eq!(support["db-stopped"].support, SupportStatus::Supported);
    assert!(!support["db-stopped"].below_minimum_version);

    assert_eq!(result.iam.total_roles, 450);
    assert_eq!(result.iam.roles_quota, 1000);
    assert!((result.iam.roles_percent - 45.0).abs() < 1e-9);

    assert_eq!(result.logs.total_log_groups, 2);
    assert_eq!(result.logs.old_log_groups_count, 1);
    assert_eq!(result.logs.old_log_groups[0].name, "/aws/lambda/stale");
    assert_eq!(result.logs.old_log_groups[0].last_event_days, 200);
    let expected_log_gb = (1024 + 512) as f64 / 1024.0;
    assert!((result.logs.total_storage_gb - expected_log_gb).abs() < 1e-9);
}

#[tokio::test]
async fn test_role_summary_failure_falls_back_to_listing() {
    let mut provider = fixture_provider();
    provider.role_summary = None;
    let policy = ClassificationPolicy::default();
    let scanner = EnvironmentScanner::new(&provider, &policy);

    let result = scanner.scan("dev").await.unwrap();
    assert_eq!(result.iam.total_roles, 5);
    assert_eq!(result.iam.roles_quota, 1000);
    assert!((result.iam.roles_percent - 0.5).abs() < 1e-9);
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == ResourceKind::Role));
}

#[tokio::test]
async fn test_database_listing_failure_leaves_section_empty() {
    let mut provider = fixture_provider();
    provider.fail_databases = true;
    let policy = ClassificationPolicy::default();
    let scanner = EnvironmentScanner::new(&provider, &policy);

    let result = scanner.scan("dev").await.unwrap();
    assert_eq!(result.rds.total_instances, 0);
    assert!(result.rds.findings.is_empty());
    assert!(result.support.is_empty());
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == ResourceKind::Database && e.resource == "list"));
    // Other sections are unaffected.
    assert_eq!(result.lambda.total_functions, 3);
    assert_eq!(result.logs.total_log_groups, 2);
}

#[tokio::test]
async fn test_tag_lookup_failure_degrades_to_not_available() {
    let mut provider = fixture_provider();
    provider.fail_tags = true;
    let policy = ClassificationPolicy::default();
    let scanner = EnvironmentScanner::new(&provider, &policy);

    let result = scanner.scan("dev").await.unwrap();
    assert!(result
        .lambda
        .findings
        .iter()
        .all(|f| f.tags.owner == "N/A"));
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == ResourceKind::Function && e.message.contains("tags")));
}

#[tokio::test]
async fn test_account_identity_failure_aborts_scan() {
    let mut provider = fixture_provider();
    provider.account = None;
    let policy = ClassificationPolicy::default();
    let scanner = EnvironmentScanner::new(&provider, &policy);
    assert!(scanner.scan("dev").await.is_err());
}

#[tokio::test]
async fn test_runner_skips_failed_environment() {
    let specs: Vec<EnvironmentSpec> = ["dev", "bad", "prod"]
        .iter()
        .map(|name| EnvironmentSpec {
            name: name.to_string(),
            profile: None,
            region: "us-west-2".to_string(),
        })
        .collect();
    let policy = ClassificationPolicy::default();

    let report = scan_environments(&specs, &policy, |spec| {
        let name = spec.name.clone();
        async move {
            let mut provider = fixture_provider();
            if name == "bad" {
                provider.account = None;
            }
            Ok(provider)
        }
    })
    .await;

    assert_eq!(report.keys().collect::<Vec<_>>(), vec!["dev", "prod"]);
    assert_eq!(report["dev"].lambda.total_functions, 3);
}

#[tokio::test]
async fn test_pagination_collects_every_page() {
    let mut provider = fixture_provider();
    provider.functions = (0..5).map(|i| function(&format!("fn-{}", i))).collect();
    provider.versions.clear();
    let policy = ClassificationPolicy::default();
    let scanner = EnvironmentScanner::new(&provider, &policy);

    let result = scanner.scan("dev").await.unwrap();
    // Pages of two: three pages must all land in the report.
    assert_eq!(result.lambda.total_functions, 5);
}

#[test]
fn test_aggregate_window_contract() {
    // The scanner relies on absent series meaning zero usage.
    assert_eq!(aggregate(&[], Statistic::Sum), 0.0);
    let w = MetricWindow::last_days("ReadIOPS", 180, 86_400, Statistic::Sum);
    assert_eq!((w.end - w.start).num_days(), 180);
}
