use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use cloud_resource_reporter::config::load_config;
use cloud_resource_reporter::policy::ClassificationPolicy;
use cloud_resource_reporter::provider::AwsProvider;
use cloud_resource_reporter::report::{render_csv, report_filename};
use cloud_resource_reporter::runner::scan_environments;
use cloud_resource_reporter::sinks::{text_summary, ArtifactSinks};
use cloud_resource_reporter::slack::{build_slack_payload, send_to_slack};
use cloud_resource_reporter::snapshot::{load_snapshots, save_snapshot};
use cloud_resource_reporter::types::{Config, ConsolidatedReport};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;

    // Consolidation mode: merge previously saved snapshots and notify.
    if let Some(dir) = &cfg.consolidate_dir {
        info!("Consolidating snapshots from {}", dir);
        let report = load_snapshots(Path::new(dir))?;
        if report.is_empty() {
            bail!("No snapshots found in {}", dir);
        }
        info!("Consolidated {} environments", report.len());
        notify_slack(&cfg, &report).await?;
        return Ok(());
    }

    let policy = ClassificationPolicy {
        log_age_days: cfg.log_age_days,
        minimum_engine_version: cfg.minimum_engine_version,
        ..ClassificationPolicy::default()
    };
    info!(
        "Scanning {} environments in region {}",
        cfg.environments.len(),
        cfg.environments
            .first()
            .map(|e| e.region.as_str())
            .unwrap_or("-")
    );
    let report = scan_environments(&cfg.environments, &policy, |spec| {
        let spec = spec.clone();
        async move { anyhow::Ok(AwsProvider::connect(&spec).await) }
    })
    .await;

    if report.is_empty() {
        bail!("No environments scanned successfully");
    }
    info!("Scanned {} environments", report.len());

    let now = Utc::now();
    let csv = render_csv(&report, now);
    let filename = report_filename(now);
    let csv_path = Path::new(&cfg.report_dir).join(&filename);
    fs::write(&csv_path, &csv)
        .with_context(|| format!("Failed to write report to {}", csv_path.display()))?;
    info!("CSV report generated: {}", csv_path.display());

    if let Some(path) = &cfg.snapshot_path {
        save_snapshot(Path::new(path), &report)?;
    }

    if cfg.s3_bucket.is_some() || cfg.sns_topic_arn.is_some() {
        let region = cfg
            .environments
            .first()
            .map(|e| e.region.clone())
            .unwrap_or_else(|| "us-west-2".to_string());
        let sinks = ArtifactSinks::connect(&region).await;
        if let Some(bucket) = &cfg.s3_bucket {
            let key = format!("resource-scans/{}", filename);
            if let Err(err) = sinks.upload_csv(bucket, &key, csv.into_bytes()).await {
                warn!("S3 upload failed: {:#}", err);
            }
        }
        if let Some(topic) = &cfg.sns_topic_arn {
            let summary = text_summary(&report);
            if let Err(err) = sinks
                .publish_summary(topic, "AWS Resource Scan Summary", &summary)
                .await
            {
                warn!("SNS publish failed: {:#}", err);
            }
        }
    }

    notify_slack(&cfg, &report).await?;
    Ok(())
}

async fn notify_slack(cfg: &Config, report: &ConsolidatedReport) -> Result<()> {
    if cfg.skip_slack {
        info!("Slack notification skipped by configuration");
        return Ok(());
    }
    match &cfg.slack_webhook_url {
        Some(url) => {
            let payload = build_slack_payload(report, cfg.report_url.as_deref(), Utc::now());
            send_to_slack(url, &payload).await?;
            info!("Slack notification sent");
        }
        None => info!("No Slack webhook configured, skipping notification"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
