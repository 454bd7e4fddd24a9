use std::collections::HashMap;

use chrono::NaiveDate;

/// Read-only classification thresholds and lookup tables, loaded once per run
/// and shared across every environment scan. The tables are injected data
/// rather than globals so tests can swap them out.
#[derive(Debug, Clone)]
pub struct ClassificationPolicy {
    pub storage_limit_gb: f64,
    pub large_storage_mb: f64,
    pub version_bloat_count: usize,
    pub low_usage_invocations: f64,
    pub function_window_days: i64,
    pub db_unused_window_days: i64,
    pub db_recent_window_days: i64,
    pub db_cpu_cutoff: f64,
    pub db_transaction_cutoff: f64,
    pub log_age_days: i64,
    pub minimum_engine_version: u32,
    pub default_roles_quota: i64,
    pub year1_rate_per_vcpu_hour: f64,
    pub year2_rate_per_vcpu_hour: f64,
    pub support_end_dates: HashMap<(String, String), NaiveDate>,
    pub upcoming_end_dates: HashMap<(String, String), NaiveDate>,
    pub vcpu_map: HashMap<String, i32>,
}

// Standard-support end dates per (engine family, major version).
const SUPPORT_END_DATES: &[(&str, &str, &str)] = &[
    ("postgres", "11", "2023-11-09"),
    ("postgres", "12", "2024-11-14"),
    ("postgres", "13", "2025-11-13"),
    ("mysql", "5.7", "2023-10-31"),
    ("mariadb", "10.3", "2023-05-25"),
    ("mariadb", "10.4", "2024-06-18"),
    ("mariadb", "10.5", "2025-06-24"),
    ("oracle", "19", "2024-04-30"),
];

// Versions whose standard support has not ended yet but will.
const UPCOMING_END_DATES: &[(&str, &str, &str)] = &[
    ("postgres", "14", "2026-11-12"),
    ("mysql", "8.0", "2026-04-30"),
    ("mariadb", "10.6", "2026-07-06"),
];

const INSTANCE_VCPUS: &[(&str, i32)] = &[
    ("db.t3.micro", 2),
    ("db.t3.small", 2),
    ("db.t3.medium", 2),
    ("db.t3.large", 2),
    ("db.t3.xlarge", 4),
    ("db.t3.2xlarge", 8),
    ("db.t4g.micro", 2),
    ("db.t4g.small", 2),
    ("db.t4g.medium", 2),
    ("db.t4g.large", 2),
    ("db.t4g.xlarge", 4),
    ("db.t4g.2xlarge", 8),
    ("db.m5.large", 2),
    ("db.m5.xlarge", 4),
    ("db.m5.2xlarge", 8),
    ("db.m5.4xlarge", 16),
    ("db.m5.8xlarge", 32),
    ("db.m5.12xlarge", 48),
    ("db.m5.16xlarge", 64),
    ("db.m5.24xlarge", 96),
    ("db.m6g.large", 2),
    ("db.m6g.xlarge", 4),
    ("db.m6g.2xlarge", 8),
    ("db.m6g.4xlarge", 16),
    ("db.m6g.8xlarge", 32),
    ("db.m6g.12xlarge", 48),
    ("db.m6g.16xlarge", 64),
    ("db.r4.large", 2),
    ("db.r4.xlarge", 4),
    ("db.r4.2xlarge", 8),
    ("db.r4.4xlarge", 16),
    ("db.r4.8xlarge", 32),
    ("db.r4.16xlarge", 64),
    ("db.r5.large", 2),
    ("db.r5.xlarge", 4),
    ("db.r5.2xlarge", 8),
    ("db.r5.4xlarge", 16),
    ("db.r5.8xlarge", 32),
    ("db.r5.12xlarge", 48),
    ("db.r5.16xlarge", 64),
    ("db.r5.24xlarge", 96),
    ("db.r7g.large", 2),
    ("db.r7g.xlarge", 4),
    ("db.r7g.2xlarge", 8),
    ("db.r7g.4xlarge", 16),
    ("db.r7g.8xlarge", 32),
    ("db.r7g.12xlarge", 48),
    ("db.r7g.16xlarge", 64),
    // Serverless estimated conservatively at 1 vCPU
    ("db.serverless", 1),
];

fn date_table(entries: &[(&str, &str, &str)]) -> HashMap<(String, String), NaiveDate> {
    entries
        .iter()
        .filter_map(|(family, major, date)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|d| ((family.to_string(), major.to_string()), d))
        })
        .collect()
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            storage_limit_gb: 300.0,
            large_storage_mb: 100.0,
            version_bloat_count: 10,
            low_usage_invocations: 10.0,
            function_window_days: 30,
            db_unused_window_days: 180,
            db_recent_window_days: 30,
            db_cpu_cutoff: 50.0,
            db_transaction_cutoff: 50.0,
            log_age_days: 90,
            minimum_engine_version: 15,
            default_roles_quota: 1000,
            year1_rate_per_vcpu_hour: 0.10,
            year2_rate_per_vcpu_hour: 0.20,
            support_end_dates: date_table(SUPPORT_END_DATES),
            upcoming_end_dates: date_table(UPCOMING_END_DATES),
            vcpu_map: INSTANCE_VCPUS
                .iter()
                .map(|(class, vcpus)| (class.to_string(), *vcpus))
                .collect(),
        }
    }
}

impl ClassificationPolicy {
    pub fn support_end_date(&self, family: &str, major: &str) -> Option<NaiveDate> {
        self.support_end_dates
            .get(&(family.to_string(), major.to_string()))
            .copied()
    }

    pub fn upcoming_end_date(&self, family: &str, major: &str) -> Option<NaiveDate> {
        self.upcoming_end_dates
            .get(&(family.to_string(), major.to_string()))
            .copied()
    }

    /// vCPU count for an instance class, defaulting to 2 for unknown classes.
    pub fn vcpu_count(&self, instance_class: &str) -> i32 {
        self.vcpu_map.get(instance_class).copied().unwrap_or(2)
    }
}
