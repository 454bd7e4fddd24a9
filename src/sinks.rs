use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::types::ConsolidatedReport;

/// Optional delivery targets for the generated artifacts. Both are best
/// effort: the caller logs a failure and continues, since the report on disk
/// is the primary output.
pub struct ArtifactSinks {
    s3: aws_sdk_s3::Client,
    sns: aws_sdk_sns::Client,
}

impl ArtifactSinks {
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            s3: aws_sdk_s3::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
        }
    }

    pub async fn upload_csv(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("Failed to upload report to s3://{}/{}", bucket, key))?;
        info!("Report uploaded to s3://{}/{}", bucket, key);
        Ok(())
    }

    pub async fn publish_summary(&self, topic_arn: &str, subject: &str, message: &str) -> Result<()> {
        self.sns
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .with_context(|| format!("Failed to publish summary to {}", topic_arn))?;
        info!("Summary published to {}", topic_arn);
        Ok(())
    }
}

/// Plain-text run summary for the SNS notification.
pub fn text_summary(report: &ConsolidatedReport) -> String {
    let mut lines = vec!["AWS Resource Scan Summary".to_string(), String::new()];
    for (env, result) in report {
        lines.push(format!(
            "{}: {} functions ({} unused), {} databases ({} unused, {} underused), {} roles, {} old log groups",
            env.to_uppercase(),
            result.lambda.total_functions,
            result.lambda.unused_count,
            result.rds.total_instances,
            result.rds.unused_count,
            result.rds.underused_count,
            result.iam.total_roles,
            result.logs.old_log_groups_count,
        ));
    }
    lines.join("\n")
}
