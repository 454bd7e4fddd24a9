use chrono::{DateTime, Utc};

use crate::types::{ConsolidatedReport, DatabaseCategory, SupportStatus};

/// Timestamped artifact name for one run.
pub fn report_filename(now: DateTime<Utc>) -> String {
    format!("aws_resource_report_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

// Minimal CSV quoting: fields containing a comma, quote or newline are
// wrapped in quotes with inner quotes doubled.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

struct CsvWriter {
    out: String,
}

impl CsvWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn row<S: AsRef<str>>(&mut self, fields: &[S]) {
        let line: Vec<String> = fields.iter().map(|f| csv_field(f.as_ref())).collect();
        self.out.push_str(&line.join(","));
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

fn support_label(status: SupportStatus) -> &'static str {
    match status {
        SupportStatus::InExtendedSupport => "EXTENDED SUPPORT",
        SupportStatus::EnteringSupportSoon => "ENTERING SOON",
        SupportStatus::Supported => "Supported",
    }
}

/// Renders the multi-section CSV report over every scanned environment, in
/// environment-name order.
pub fn render_csv(report: &ConsolidatedReport, generated_at: DateTime<Utc>) -> String {
    let mut w = CsvWriter::new();
    w.row(&["AWS Resource Usage Report"]);
    w.row(&[
        "Generated:".to_string(),
        generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    w.blank();

    for (env, result) in report {
        w.row(&[format!("=== {} ENVIRONMENT ===", env.to_uppercase())]);
        w.blank();

        w.row(&["Lambda Storage"]);
        w.row(&[
            "Total Functions".to_string(),
            result.lambda.total_functions.to_string(),
        ]);
        w.row(&[
            "Storage Used (GB)".to_string(),
            format!("{:.2}", result.lambda.total_storage_gb),
        ]);
        w.row(&[
            "Storage Limit (GB)".to_string(),
            format!("{:.0}", result.lambda.storage_limit_gb),
        ]);
        w.row(&[
            "Storage Usage %".to_string(),
            format!("{:.1}", result.lambda.storage_percent),
        ]);
        w.row(&[
            "Unused Functions".to_string(),
            result.lambda.unused_count.to_string(),
        ]);
        w.row(&[
            "Functions with Version Bloat (>10 versions)".to_string(),
            result.lambda.version_bloat_count.to_string(),
        ]);
        w.blank();

        w.row(&["IAM Roles"]);
        w.row(&[
            "Total Roles".to_string(),
            result.iam.total_roles.to_string(),
        ]);
        w.row(&[
            "Roles Quota".to_string(),
            result.iam.roles_quota.to_string(),
        ]);
        w.row(&[
            "Usage %".to_string(),
            format!("{:.1}", result.iam.roles_percent),
        ]);
        w.blank();

        w.row(&["RDS Instances"]);
        w.row(&[
            "Total Instances".to_string(),
            result.rds.total_instances.to_string(),
        ]);
        w.row(&[
            "Underused Instances".to_string(),
            result.rds.underused_count.to_string(),
        ]);
        let underused: Vec<_> = result
            .rds
            .findings
            .iter()
            .filter(|f| f.category == DatabaseCategory::Underused)
            .collect();
        if !underused.is_empty() {
            w.row(&["Instance Name", "Avg CPU %", "Engine", "Instance Class"]);
            for db in underused {
                w.row(&[
                    db.identifier.clone(),
                    format!("{:.2}", db.cpu_6mo),
                    db.engine.clone(),
                    db.instance_class.clone(),
                ]);
            }
        }
        w.blank();

        let flagged: Vec<_> = result
            .support
            .iter()
            .filter(|s| s.support != SupportStatus::Supported || s.below_minimum_version)
            .collect();
        if !flagged.is_empty() {
            w.row(&["RDS Support Status"]);
            w.row(&[
                "Instance ID",
                "Engine",
                "Version",
                "Instance Class",
                "vCPUs",
                "Status",
                "Support",
                "Support End Date",
                "Support Year",
                "Monthly Cost (USD)",
                "Below Minimum Version",
            ]);
            for s in flagged {
                w.row(&[
                    s.identifier.clone(),
                    s.engine.clone(),
                    s.version.clone(),
                    s.instance_class.clone(),
                    if s.vcpu_count > 0 {
                        s.vcpu_count.to_string()
                    } else {
                        String::new()
                    },
                    s.status.clone(),
                    support_label(s.support).to_string(),
                    s.support_end_date.clone().unwrap_or_default(),
                    s.support_year.clone().unwrap_or_default(),
                    if s.monthly_cost > 0.0 {
                        format!("{:.2}", s.monthly_cost)
                    } else {
                        String::new()
                    },
                    if s.below_minimum_version { "yes" } else { "no" }.to_string(),
                ]);
            }
            w.blank();
        }

        w.row(&["CloudWatch Log Groups"]);
        w.row(&[
            "Total Log Groups".to_string(),
            result.logs.total_log_groups.to_string(),
        ]);
        w.row(&[
            "Old Log Groups (>90 days)".to_string(),
            result.logs.old_log_groups_count.to_string(),
        ]);
        w.row(&[
            "Total Storage (GB)".to_string(),
            format!("{:.2}", result.logs.total_storage_gb),
        ]);
        w.blank();
        w.blank();
    }

    w.out
}
