use std::future::Future;

use tracing::{error, info};

use crate::policy::ClassificationPolicy;
use crate::provider::ResourceProvider;
use crate::scan::EnvironmentScanner;
use crate::types::{ConsolidatedReport, EnvironmentSpec};

/// Scans each environment in turn with a provider built by `connect`.
///
/// An environment that fails to connect or to scan is logged and left out of
/// the result; the remaining environments still run. Callers decide what an
/// empty map means (for the CLI it fails the run).
pub async fn scan_environments<P, F, Fut>(
    environments: &[EnvironmentSpec],
    policy: &ClassificationPolicy,
    connect: F,
) -> ConsolidatedReport
where
    P: ResourceProvider,
    F: Fn(&EnvironmentSpec) -> Fut,
    Fut: Future<Output = anyhow::Result<P>>,
{
    let mut report = ConsolidatedReport::new();
    for spec in environments {
        info!(
            "Scanning environment: {} (region {})",
            spec.name, spec.region
        );
        let provider = match connect(spec).await {
            Ok(provider) => provider,
            Err(err) => {
                error!("Skipping {}: failed to connect: {:#}", spec.name, err);
                continue;
            }
        };
        let scanner = EnvironmentScanner::new(&provider, policy);
        match scanner.scan(&spec.name).await {
            Ok(result) => {
                report.insert(spec.name.clone(), result);
            }
            Err(err) => {
                error!("Skipping {}: scan failed: {:#}", spec.name, err);
            }
        }
    }
    report
}
