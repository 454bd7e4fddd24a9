use chrono::{DateTime, Duration, Utc};

/// Statistic requested from the telemetry provider for a metric window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
    Average,
}

/// One time-stamped statistic value returned by the provider.
#[derive(Debug, Clone, Copy)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A metric request over a time window. `start < end` is guaranteed by the
/// constructors; the period is not required to divide the window evenly.
#[derive(Debug, Clone)]
pub struct MetricWindow {
    pub metric: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_secs: i64,
    pub statistic: Statistic,
}

impl MetricWindow {
    /// Window covering the last `days` days ending now.
    pub fn last_days(metric: &str, days: i64, period_secs: i64, statistic: Statistic) -> Self {
        let end = Utc::now();
        let start = end - Duration::days(days.max(1));
        Self {
            metric: metric.to_string(),
            start,
            end,
            period_secs,
            statistic,
        }
    }
}

/// Collapse a datapoint series into a single scalar.
///
/// An empty series yields 0.0 for both statistics: absence of data is treated
/// as zero usage, which is what pushes never-touched resources toward the
/// Unused category. For `Average` the result is the plain mean of the
/// per-datapoint averages, not a duration-weighted mean.
pub fn aggregate(datapoints: &[Datapoint], statistic: Statistic) -> f64 {
    if datapoints.is_empty() {
        return 0.0;
    }
    let total: f64 = datapoints.iter().map(|d| d.value).sum();
    match statistic {
        Statistic::Sum => total,
        Statistic::Average => total / datapoints.len() as f64,
    }
}
