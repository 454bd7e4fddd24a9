use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use tracing::error;

use crate::types::{ConsolidatedReport, SlackPayload};

// Traffic-light band for a utilization percentage.
fn band(percent: f64, red_above: f64, yellow_above: f64) -> &'static str {
    if percent > red_above {
        "\u{1F534}"
    } else if percent > yellow_above {
        "\u{1F7E1}"
    } else {
        "\u{1F7E2}"
    }
}

pub fn build_slack_payload(
    report: &ConsolidatedReport,
    report_url: Option<&str>,
    now: DateTime<Utc>,
) -> SlackPayload {
    let mut blocks: Vec<serde_json::Value> = Vec::new();
    blocks.push(serde_json::json!({
        "type": "header",
        "text": {"type": "plain_text", "text": "\u{1F4CA} Weekly AWS Resources Usage Alert", "emoji": true}
    }));
    blocks.push(serde_json::json!({
        "type": "section",
        "text": {"type": "mrkdwn", "text": format!("*Report Date:* {}", now.format("%Y-%m-%d %H:%M:%S"))}
    }));
    blocks.push(serde_json::json!({"type": "divider"}));

    for (env, result) in report {
        let env_upper = env.to_uppercase();
        let lambda_band = band(result.lambda.storage_percent, 70.0, 50.0);
        let iam_band = band(result.iam.roles_percent, 80.0, 60.0);

        blocks.push(serde_json::json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("*{} Environment*", env_upper)}
        }));
        blocks.push(serde_json::json!({
            "type": "section",
            "fields": [
                {"type": "mrkdwn", "text": format!(
                    "{} *IAM Roles in {}*\n{} / {} ({:.1}%)",
                    iam_band, env_upper,
                    result.iam.total_roles, result.iam.roles_quota, result.iam.roles_percent
                )},
                {"type": "mrkdwn", "text": format!(
                    "{} *Lambda Storage in {}*\n{:.2} / {:.0} GB ({:.1}%)",
                    lambda_band, env_upper,
                    result.lambda.total_storage_gb, result.lambda.storage_limit_gb,
                    result.lambda.storage_percent
                )},
            ]
        }));
        blocks.push(serde_json::json!({
            "type": "section",
            "fields": [
                {"type": "mrkdwn", "text": format!(
                    "*Bloated Lambdas:* {}\n*Unused Lambdas:* {}",
                    result.lambda.version_bloat_count, result.lambda.unused_count
                )},
                {"type": "mrkdwn", "text": format!(
                    "*Underused RDS:* {} / {}",
                    result.rds.underused_count, result.rds.total_instances
                )},
            ]
        }));
        blocks.push(serde_json::json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!(
                "*Old CloudWatch Logs:* {} log groups (>90 days) | Total: {:.2} GB",
                result.logs.old_log_groups_count, result.logs.total_storage_gb
            )}
        }));
        blocks.push(serde_json::json!({"type": "divider"}));
    }

    let mut footer = "\u{1F4BE} Detailed CSV report generated".to_string();
    if let Some(url) = report_url {
        footer.push_str(&format!(" | <{}|View report artifact>", url));
    }
    blocks.push(serde_json::json!({
        "type": "context",
        "elements": [{"type": "mrkdwn", "text": footer}]
    }));

    SlackPayload { text: None, blocks }
}

pub async fn send_to_slack(webhook_url: &str, payload: &SlackPayload) -> Result<()> {
    let client = reqwest::Client::new();
    let res = client
        .post(webhook_url)
        .json(payload)
        .send()
        .await
        .context("Failed to send Slack request")?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        error!("Slack webhook failed: {} - {}", status, body);
        return Err(anyhow!("Slack webhook returned non-success status"));
    }
    Ok(())
}
