use chrono::{DateTime, Duration, Utc};

use crate::policy::ClassificationPolicy;
use crate::types::{LogGroupDescriptor, LogGroupFinding};

/// Classify a log group as old when its last event predates the age
/// threshold. `last_event_ms` is the newest stream timestamp when available;
/// the fallback chain is stream time, then group creation time, then 0.
pub fn classify(
    descriptor: &LogGroupDescriptor,
    last_event_ms: Option<i64>,
    now: DateTime<Utc>,
    policy: &ClassificationPolicy,
) -> Option<LogGroupFinding> {
    let last_event = last_event_ms.unwrap_or(descriptor.creation_time_ms);
    let threshold_ms = (now - Duration::days(policy.log_age_days)).timestamp_millis();
    if last_event >= threshold_ms {
        return None;
    }
    let age_ms = now.timestamp_millis() - last_event;
    Some(LogGroupFinding {
        name: descriptor.name.clone(),
        storage_mb: descriptor.stored_bytes as f64 / (1024.0 * 1024.0),
        last_event_days: (age_ms as f64 / 86_400_000.0).round() as i64,
    })
}
