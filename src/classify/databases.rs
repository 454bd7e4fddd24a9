use crate::policy::ClassificationPolicy;
use crate::types::{DatabaseCategory, DatabaseDescriptor, DatabaseFinding, ResourceTags};

/// Aggregated inputs for one database instance.
///
/// The "transaction" counts are really summed read+write IOPS used as an
/// activity proxy; the naming follows the reports this feeds. See DESIGN.md.
#[derive(Debug, Clone)]
pub struct DatabaseObservation {
    pub descriptor: DatabaseDescriptor,
    pub cpu_6mo: f64,
    pub transactions_6mo: f64,
    pub transactions_1mo: f64,
    pub tags: ResourceTags,
}

pub fn classify(obs: &DatabaseObservation, policy: &ClassificationPolicy) -> DatabaseFinding {
    // Ordered rules: Unused wins over Underused; Underused collects every
    // triggering sub-condition into the reason, not just the first.
    let (category, reason) = if obs.transactions_6mo == 0.0 {
        (
            DatabaseCategory::Unused,
            "Zero transactions in last 6 months".to_string(),
        )
    } else if obs.cpu_6mo < policy.db_cpu_cutoff
        || obs.transactions_1mo < policy.db_transaction_cutoff
    {
        let mut reasons = Vec::new();
        if obs.cpu_6mo < policy.db_cpu_cutoff {
            reasons.push(format!("CPU: {:.2}%", obs.cpu_6mo));
        }
        if obs.transactions_1mo < policy.db_transaction_cutoff {
            reasons.push(format!("Transactions/month: {:.0}", obs.transactions_1mo));
        }
        (DatabaseCategory::Underused, reasons.join("; "))
    } else {
        (DatabaseCategory::Active, String::new())
    };

    DatabaseFinding {
        identifier: obs.descriptor.identifier.clone(),
        engine: obs.descriptor.engine.clone(),
        instance_class: obs.descriptor.instance_class.clone(),
        status: obs.descriptor.status.clone(),
        cpu_6mo: obs.cpu_6mo,
        transactions_6mo: obs.transactions_6mo,
        transactions_1mo: obs.transactions_1mo,
        category,
        reason,
        tags: obs.tags.clone(),
    }
}
