use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Config {
    pub environments: Vec<EnvironmentSpec>,
    pub slack_webhook_url: Option<String>,
    pub log_age_days: i64,
    pub minimum_engine_version: u32,
    pub snapshot_path: Option<String>,
    pub consolidate_dir: Option<String>,
    pub report_dir: String,
    pub report_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub sns_topic_arn: Option<String>,
    pub skip_slack: bool,
}

/// One scannable account/profile/region combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSpec {
    pub name: String,
    pub profile: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Function,
    Database,
    Role,
    LogGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Function => "function",
            ResourceKind::Database => "database",
            ResourceKind::Role => "role",
            ResourceKind::LogGroup => "log-group",
        };
        f.write_str(s)
    }
}

// Descriptors are point-in-time snapshots handed over by the provider.
// They live only for the duration of one scan pass.

#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub arn: String,
    pub runtime: Option<String>,
    pub code_size: i64,
}

#[derive(Debug, Clone)]
pub struct FunctionVersion {
    pub version: String,
    pub code_size: i64,
}

#[derive(Debug, Clone)]
pub struct DatabaseDescriptor {
    pub identifier: String,
    pub arn: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct LogGroupDescriptor {
    pub name: String,
    pub stored_bytes: i64,
    pub creation_time_ms: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct RoleSummary {
    pub roles: i64,
    pub quota: i64,
}

/// Ownership tags extracted from the resource's tag set. Any lookup failure
/// degrades every field to "N/A" rather than aborting the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTags {
    pub owner: String,
    pub contact: String,
    pub repo: String,
    pub team: String,
    pub environment: String,
}

impl ResourceTags {
    pub fn not_available() -> Self {
        let na = "N/A".to_string();
        Self {
            owner: na.clone(),
            contact: na.clone(),
            repo: na.clone(),
            team: na.clone(),
            environment: na,
        }
    }

    pub fn from_map(tags: &HashMap<String, String>) -> Self {
        let pick = |keys: &[&str]| -> String {
            keys.iter()
                .find_map(|k| tags.get(*k).cloned())
                .unwrap_or_else(|| "N/A".to_string())
        };
        Self {
            owner: pick(&["Owner", "owner"]),
            contact: pick(&["Contact", "contact"]),
            repo: pick(&["Repo", "repo", "Repository"]),
            team: pick(&["Team", "team"]),
            environment: pick(&["Environment", "environment"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionCategory {
    Unused,
    VersionBloat,
    LargeStorage,
    LowUsage,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionFinding {
    pub name: String,
    pub runtime: Option<String>,
    pub version_count: usize,
    pub total_storage_mb: f64,
    pub invocations_30d: f64,
    pub invocations_7d: f64,
    pub category: FunctionCategory,
    pub reason: String,
    pub tags: ResourceTags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionReport {
    pub total_functions: usize,
    pub total_storage_gb: f64,
    pub storage_limit_gb: f64,
    pub storage_percent: f64,
    pub unused_count: usize,
    pub version_bloat_count: usize,
    pub findings: Vec<FunctionFinding>,
}

impl FunctionReport {
    pub fn empty(storage_limit_gb: f64) -> Self {
        Self {
            total_functions: 0,
            total_storage_gb: 0.0,
            storage_limit_gb,
            storage_percent: 0.0,
            unused_count: 0,
            version_bloat_count: 0,
            findings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseCategory {
    Unused,
    Underused,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseFinding {
    pub identifier: String,
    pub engine: String,
    pub instance_class: String,
    pub status: String,
    pub cpu_6mo: f64,
    pub transactions_6mo: f64,
    pub transactions_1mo: f64,
    pub category: DatabaseCategory,
    pub reason: String,
    pub tags: ResourceTags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseReport {
    pub total_instances: usize,
    pub unused_count: usize,
    pub underused_count: usize,
    pub findings: Vec<DatabaseFinding>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoleUsage {
    pub total_roles: i64,
    pub roles_quota: i64,
    pub roles_percent: f64,
}

impl Default for RoleUsage {
    fn default() -> Self {
        Self {
            total_roles: 0,
            roles_quota: 1000,
            roles_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogGroupFinding {
    pub name: String,
    pub storage_mb: f64,
    pub last_event_days: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogReport {
    pub total_log_groups: usize,
    pub old_log_groups_count: usize,
    pub total_storage_gb: f64,
    pub old_log_groups: Vec<LogGroupFinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportStatus {
    InExtendedSupport,
    EnteringSupportSoon,
    Supported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportFinding {
    pub identifier: String,
    pub engine: String,
    pub version: String,
    pub instance_class: String,
    pub status: String,
    pub support: SupportStatus,
    pub support_end_date: Option<String>,
    pub below_minimum_version: bool,
    pub monthly_cost: f64,
    pub vcpu_count: i32,
    pub support_year: Option<String>,
}

/// Recorded-but-swallowed collection failure. Kept on the environment result
/// so a defaulted value can be told apart from real data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanError {
    pub kind: ResourceKind,
    pub resource: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentResult {
    pub environment: String,
    pub account_id: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub lambda: FunctionReport,
    pub iam: RoleUsage,
    pub rds: DatabaseReport,
    pub support: Vec<SupportFinding>,
    pub logs: LogReport,
    pub errors: Vec<ScanError>,
}

/// Environment name -> result, with sorted keys so report ordering is stable.
pub type ConsolidatedReport = BTreeMap<String, EnvironmentResult>;

#[derive(Serialize)]
pub struct SlackPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub blocks: Vec<serde_json::Value>,
}
