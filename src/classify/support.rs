use chrono::NaiveDate;

use crate::policy::ClassificationPolicy;
use crate::types::{DatabaseDescriptor, SupportFinding, SupportStatus};

/// Normalize an engine name to its family: everything after the first hyphen
/// is dropped (oracle-ee -> oracle), and aurora-postgresql maps to postgres
/// so Aurora instances share the PostgreSQL version tables.
pub fn engine_family(engine: &str) -> &str {
    if engine == "aurora-postgresql" {
        return "postgres";
    }
    engine.split('-').next().unwrap_or(engine)
}

/// Major version as keyed by the support tables. Postgres, Oracle and SQL
/// Server use the first dot component; MySQL and MariaDB use the first two
/// ("5.7.44" -> "5.7"). Unknown families have no table entry to key against.
pub fn support_major_version(family: &str, version: &str) -> Option<String> {
    let mut parts = version.split('.');
    match family {
        "postgres" | "oracle" | "sqlserver" => parts.next().map(str::to_string),
        "mysql" | "mariadb" => {
            let first = parts.next()?;
            let second = parts.next()?;
            Some(format!("{first}.{second}"))
        }
        _ => None,
    }
}

/// Integer major version used by the below-minimum check. Deliberately a
/// coarser granularity than [`support_major_version`]: MySQL "8.0.32" is
/// major 8 here, but "8.0" for the support tables.
pub fn numeric_major_version(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

fn monthly_cost(
    vcpu_count: i32,
    support_end: NaiveDate,
    today: NaiveDate,
    policy: &ClassificationPolicy,
) -> (f64, String) {
    let days_since_end = (today - support_end).num_days() as f64;
    let years_since_end = days_since_end / 365.25;
    let (rate, support_year) = if years_since_end < 1.0 {
        (policy.year1_rate_per_vcpu_hour, "Year 1".to_string())
    } else {
        // Flat Year-2+ rate; the label still counts the year.
        (
            policy.year2_rate_per_vcpu_hour,
            format!("Year {}", years_since_end as i64 + 1),
        )
    };
    // 730 hours per month on average.
    (vcpu_count as f64 * rate * 730.0, support_year)
}

pub fn classify(
    descriptor: &DatabaseDescriptor,
    today: NaiveDate,
    policy: &ClassificationPolicy,
) -> SupportFinding {
    let family = engine_family(&descriptor.engine);
    let major = support_major_version(family, &descriptor.engine_version);
    let below_minimum_version = numeric_major_version(&descriptor.engine_version)
        .map(|m| m < policy.minimum_engine_version)
        .unwrap_or(false);

    let mut finding = SupportFinding {
        identifier: descriptor.identifier.clone(),
        engine: descriptor.engine.clone(),
        version: descriptor.engine_version.clone(),
        instance_class: descriptor.instance_class.clone(),
        status: descriptor.status.clone(),
        support: SupportStatus::Supported,
        support_end_date: None,
        below_minimum_version,
        monthly_cost: 0.0,
        vcpu_count: 0,
        support_year: None,
    };

    let Some(major) = major else {
        return finding;
    };

    if let Some(end) = policy.support_end_date(family, &major) {
        if end < today {
            let vcpu_count = policy.vcpu_count(&descriptor.instance_class);
            let (cost, support_year) = monthly_cost(vcpu_count, end, today, policy);
            finding.support = SupportStatus::InExtendedSupport;
            finding.support_end_date = Some(end.format("%Y-%m-%d").to_string());
            finding.monthly_cost = cost;
            finding.vcpu_count = vcpu_count;
            finding.support_year = Some(support_year);
            return finding;
        }
    }

    if let Some(end) = policy.upcoming_end_date(family, &major) {
        let days_until_end = (end - today).num_days();
        if (0..=30).contains(&days_until_end) {
            finding.support = SupportStatus::EnteringSupportSoon;
            finding.support_end_date = Some(end.format("%Y-%m-%d").to_string());
        }
    }

    finding
}
