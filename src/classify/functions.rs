use crate::policy::ClassificationPolicy;
use crate::types::{FunctionCategory, FunctionDescriptor, FunctionFinding, ResourceTags};

/// Aggregated inputs for one function: descriptor plus the window scalars the
/// collector derived for it.
#[derive(Debug, Clone)]
pub struct FunctionObservation {
    pub descriptor: FunctionDescriptor,
    pub version_count: usize,
    pub total_storage_bytes: i64,
    pub invocations_30d: f64,
    pub invocations_7d: f64,
    pub tags: ResourceTags,
}

impl FunctionObservation {
    pub fn total_storage_mb(&self) -> f64 {
        self.total_storage_bytes as f64 / (1024.0 * 1024.0)
    }
}

type Predicate = fn(&FunctionObservation, &ClassificationPolicy) -> bool;

fn is_unused(obs: &FunctionObservation, _: &ClassificationPolicy) -> bool {
    obs.invocations_30d == 0.0
}

fn has_version_bloat(obs: &FunctionObservation, policy: &ClassificationPolicy) -> bool {
    obs.version_count > policy.version_bloat_count
}

fn has_large_storage(obs: &FunctionObservation, policy: &ClassificationPolicy) -> bool {
    obs.total_storage_mb() > policy.large_storage_mb
}

fn has_low_usage(obs: &FunctionObservation, policy: &ClassificationPolicy) -> bool {
    obs.invocations_30d < policy.low_usage_invocations
}

// First match wins; the order of this list is the priority order.
static RULES: &[(Predicate, FunctionCategory)] = &[
    (is_unused, FunctionCategory::Unused),
    (has_version_bloat, FunctionCategory::VersionBloat),
    (has_large_storage, FunctionCategory::LargeStorage),
    (has_low_usage, FunctionCategory::LowUsage),
];

pub fn categorize(obs: &FunctionObservation, policy: &ClassificationPolicy) -> FunctionCategory {
    RULES
        .iter()
        .find(|(predicate, _)| predicate(obs, policy))
        .map(|(_, category)| *category)
        .unwrap_or(FunctionCategory::Active)
}

fn reason(category: FunctionCategory, obs: &FunctionObservation) -> String {
    match category {
        FunctionCategory::Unused => format!(
            "DELETE - No invocations in 30 days. Has {} versions consuming storage.",
            obs.version_count
        ),
        FunctionCategory::VersionBloat => format!(
            "CLEANUP_VERSIONS - Has {} versions. Keep only recent versions.",
            obs.version_count
        ),
        FunctionCategory::LargeStorage => {
            "OPTIMIZE - Large deployment package. Consider optimization or layers.".to_string()
        }
        FunctionCategory::LowUsage => format!(
            "REVIEW - Only {:.0} invocations in 30 days. Consider deletion.",
            obs.invocations_30d
        ),
        FunctionCategory::Active => "OK - Actively used with reasonable storage.".to_string(),
    }
}

pub fn classify(obs: &FunctionObservation, policy: &ClassificationPolicy) -> FunctionFinding {
    let category = categorize(obs, policy);
    FunctionFinding {
        name: obs.descriptor.name.clone(),
        runtime: obs.descriptor.runtime.clone(),
        version_count: obs.version_count,
        total_storage_mb: obs.total_storage_mb(),
        invocations_30d: obs.invocations_30d,
        invocations_7d: obs.invocations_7d,
        category,
        reason: reason(category, obs),
        tags: obs.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(
        version_count: usize,
        storage_mb: f64,
        invocations_30d: f64,
    ) -> FunctionObservation {
        FunctionObservation {
            descriptor: FunctionDescriptor {
                name: "fn-a".to_string(),
                arn: "arn:aws:lambda:us-west-2:123:function:fn-a".to_string(),
                runtime: Some("python3.12".to_string()),
                code_size: 0,
            },
            version_count,
            total_storage_bytes: (storage_mb * 1024.0 * 1024.0) as i64,
            invocations_30d,
            invocations_7d: 0.0,
            tags: ResourceTags::not_available(),
        }
    }

    #[test]
    fn test_unused_beats_version_bloat() {
        // Zero invocations with 25 versions must classify as Unused, never
        // VersionBloat: the rule list is a priority order.
        let obs = observation(25, 500.0, 0.0);
        let policy = ClassificationPolicy::default();
        assert_eq!(categorize(&obs, &policy), FunctionCategory::Unused);
    }

    #[test]
    fn test_version_bloat_boundary() {
        let policy = ClassificationPolicy::default();
        assert_eq!(
            categorize(&observation(10, 1.0, 100.0), &policy),
            FunctionCategory::Active
        );
        assert_eq!(
            categorize(&observation(11, 1.0, 100.0), &policy),
            FunctionCategory::VersionBloat
        );
    }

    #[test]
    fn test_large_storage_boundary() {
        let policy = ClassificationPolicy::default();
        assert_eq!(
            categorize(&observation(1, 100.0, 100.0), &policy),
            FunctionCategory::Active
        );
        assert_eq!(
            categorize(&observation(1, 100.5, 100.0), &policy),
            FunctionCategory::LargeStorage
        );
    }

    #[test]
    fn test_low_usage_boundary() {
        let policy = ClassificationPolicy::default();
        assert_eq!(
            categorize(&observation(1, 1.0, 9.0), &policy),
            FunctionCategory::LowUsage
        );
        assert_eq!(
            categorize(&observation(1, 1.0, 10.0), &policy),
            FunctionCategory::Active
        );
    }

    #[test]
    fn test_reason_mentions_version_count() {
        let policy = ClassificationPolicy::default();
        let finding = classify(&observation(12, 1.0, 0.0), &policy);
        assert_eq!(finding.category, FunctionCategory::Unused);
        assert!(finding.reason.contains("12 versions"));
    }
}
