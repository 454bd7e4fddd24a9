use std::collections::HashMap;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Statistic as CwStatistic};
use aws_sdk_cloudwatchlogs::types::OrderBy;
use aws_sdk_iam::types::SummaryKeyType;
use aws_sdk_lambda::error::ProvideErrorMetadata;
use chrono::{DateTime, Utc};

use async_trait::async_trait;

use crate::aggregate::{Datapoint, MetricWindow, Statistic};
use crate::provider::{Page, ProviderError, ProviderResult, ResourceProvider};
use crate::types::{
    DatabaseDescriptor, EnvironmentSpec, FunctionDescriptor, FunctionVersion, LogGroupDescriptor,
    ResourceKind, RoleSummary,
};

/// AWS adapter behind the [`ResourceProvider`] contract. All SDK specifics
/// stay in this module; the rest of the crate never sees an AWS type.
pub struct AwsProvider {
    lambda: aws_sdk_lambda::Client,
    rds: aws_sdk_rds::Client,
    iam: aws_sdk_iam::Client,
    cloudwatch: aws_sdk_cloudwatch::Client,
    logs: aws_sdk_cloudwatchlogs::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsProvider {
    pub async fn connect(env: &EnvironmentSpec) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(env.region.clone()));
        // Empty/whitespace profile means "use the default credential chain".
        if let Some(profile) = env.profile.as_deref() {
            if !profile.trim().is_empty() {
                loader = loader.profile_name(profile);
            }
        }
        let config = loader.load().await;
        Self {
            lambda: aws_sdk_lambda::Client::new(&config),
            rds: aws_sdk_rds::Client::new(&config),
            iam: aws_sdk_iam::Client::new(&config),
            cloudwatch: aws_sdk_cloudwatch::Client::new(&config),
            logs: aws_sdk_cloudwatchlogs::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
        }
    }
}

fn classify(code: Option<&str>, message: String) -> ProviderError {
    match code {
        Some(c) if c.contains("Throttl") || c.contains("TooManyRequests") => {
            ProviderError::Throttled(message)
        }
        Some(c) if c.contains("AccessDenied") || c.contains("UnauthorizedOperation") => {
            ProviderError::AccessDenied(message)
        }
        Some(c) if c.contains("NotFound") || c.contains("NoSuchEntity") => {
            ProviderError::NotFound(message)
        }
        _ => ProviderError::Other(message),
    }
}

fn sdk_err<E>(err: E) -> ProviderError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let code = err.code().map(str::to_string);
    classify(code.as_deref(), err.to_string())
}

fn to_chrono(ts: Option<&AwsDateTime>) -> DateTime<Utc> {
    ts.and_then(|t| DateTime::from_timestamp(t.secs(), 0))
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl ResourceProvider for AwsProvider {
    async fn account_id(&self) -> ProviderResult<String> {
        let out = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(sdk_err)?;
        out.account()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Other("caller identity without account id".to_string()))
    }

    async fn list_functions(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<FunctionDescriptor>> {
        let mut req = self.lambda.list_functions();
        if let Some(marker) = cursor {
            req = req.marker(marker);
        }
        let out = req.send().await.map_err(sdk_err)?;
        let items = out
            .functions()
            .iter()
            .map(|f| FunctionDescriptor {
                name: f.function_name().unwrap_or_default().to_string(),
                arn: f.function_arn().unwrap_or_default().to_string(),
                runtime: f.runtime().map(|r| r.as_str().to_string()),
                code_size: f.code_size(),
            })
            .collect();
        Ok(Page {
            items,
            next: out.next_marker().map(str::to_string),
        })
    }

    async fn list_function_versions(
        &self,
        function_name: &str,
        cursor: Option<String>,
    ) -> ProviderResult<Page<FunctionVersion>> {
        let mut req = self
            .lambda
            .list_versions_by_function()
            .function_name(function_name);
        if let Some(marker) = cursor {
            req = req.marker(marker);
        }
        let out = req.send().await.map_err(sdk_err)?;
        let items = out
            .versions()
            .iter()
            .map(|v| FunctionVersion {
                version: v.version().unwrap_or_default().to_string(),
                code_size: v.code_size(),
            })
            .collect();
        Ok(Page {
            items,
            next: out.next_marker().map(str::to_string),
        })
    }

    async fn list_databases(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<DatabaseDescriptor>> {
        let mut req = self.rds.describe_db_instances();
        if let Some(marker) = cursor {
            req = req.marker(marker);
        }
        let out = req.send().await.map_err(sdk_err)?;
        let items = out
            .db_instances()
            .iter()
            .map(|db| DatabaseDescriptor {
                identifier: db.db_instance_identifier().unwrap_or_default().to_string(),
                arn: db.db_instance_arn().unwrap_or_default().to_string(),
                engine: db.engine().unwrap_or_default().to_string(),
                engine_version: db.engine_version().unwrap_or_default().to_string(),
                instance_class: db.db_instance_class().unwrap_or_default().to_string(),
                status: db.db_instance_status().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Page {
            items,
            next: out.marker().map(str::to_string),
        })
    }

    async fn list_roles(&self, cursor: Option<String>) -> ProviderResult<Page<String>> {
        let mut req = self.iam.list_roles();
        if let Some(marker) = cursor {
            req = req.marker(marker);
        }
        let out = req.send().await.map_err(sdk_err)?;
        let items = out
            .roles()
            .iter()
            .map(|r| r.role_name().to_string())
            .collect();
        let next = if out.is_truncated() {
            out.marker().map(str::to_string)
        } else {
            None
        };
        Ok(Page { items, next })
    }

    async fn role_summary(&self) -> ProviderResult<RoleSummary> {
        let out = self
            .iam
            .get_account_summary()
            .send()
            .await
            .map_err(sdk_err)?;
        let map = out
            .summary_map()
            .ok_or_else(|| ProviderError::Other("account summary missing".to_string()))?;
        let roles = map
            .get(&SummaryKeyType::Roles)
            .copied()
            .ok_or_else(|| ProviderError::Other("account summary missing Roles".to_string()))?;
        let quota = map
            .get(&SummaryKeyType::RolesQuota)
            .copied()
            .ok_or_else(|| ProviderError::Other("account summary missing RolesQuota".to_string()))?;
        Ok(RoleSummary {
            roles: roles as i64,
            quota: quota as i64,
        })
    }

    async fn list_log_groups(
        &self,
        cursor: Option<String>,
    ) -> ProviderResult<Page<LogGroupDescriptor>> {
        let mut req = self.logs.describe_log_groups();
        if let Some(token) = cursor {
            req = req.next_token(token);
        }
        let out = req.send().await.map_err(sdk_err)?;
        let items = out
            .log_groups()
            .iter()
            .map(|lg| LogGroupDescriptor {
                name: lg.log_group_name().unwrap_or_default().to_string(),
                stored_bytes: lg.stored_bytes().unwrap_or(0),
                creation_time_ms: lg.creation_time().unwrap_or(0),
            })
            .collect();
        Ok(Page {
            items,
            next: out.next_token().map(str::to_string),
        })
    }

    async fn last_event_time_ms(&self, log_group: &str) -> ProviderResult<Option<i64>> {
        let out = self
            .logs
            .describe_log_streams()
            .log_group_name(log_group)
            .order_by(OrderBy::LastEventTime)
            .descending(true)
            .limit(1)
            .send()
            .await
            .map_err(sdk_err)?;
        Ok(out
            .log_streams()
            .first()
            .and_then(|s| s.last_event_timestamp()))
    }

    async fn get_metric(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        window: &MetricWindow,
    ) -> ProviderResult<Vec<Datapoint>> {
        let (namespace, dimension) = match kind {
            ResourceKind::Function => ("AWS/Lambda", "FunctionName"),
            ResourceKind::Database => ("AWS/RDS", "DBInstanceIdentifier"),
            other => {
                return Err(ProviderError::Other(format!(
                    "no metric namespace for {other}"
                )))
            }
        };
        let dim = Dimension::builder()
            .name(dimension)
            .value(resource_id)
            .build();
        let statistic = match window.statistic {
            Statistic::Sum => CwStatistic::Sum,
            Statistic::Average => CwStatistic::Average,
        };
        let out = self
            .cloudwatch
            .get_metric_statistics()
            .namespace(namespace)
            .metric_name(&window.metric)
            .dimensions(dim)
            .start_time(AwsDateTime::from_secs(window.start.timestamp()))
            .end_time(AwsDateTime::from_secs(window.end.timestamp()))
            .period(window.period_secs as i32)
            .statistics(statistic)
            .send()
            .await
            .map_err(sdk_err)?;
        let datapoints = out
            .datapoints()
            .iter()
            .map(|dp| {
                let value = match window.statistic {
                    Statistic::Sum => dp.sum().unwrap_or(0.0),
                    Statistic::Average => dp.average().unwrap_or(0.0),
                };
                Datapoint {
                    timestamp: to_chrono(dp.timestamp()),
                    value,
                }
            })
            .collect();
        Ok(datapoints)
    }

    async fn get_tags(
        &self,
        kind: ResourceKind,
        arn: &str,
    ) -> ProviderResult<HashMap<String, String>> {
        match kind {
            ResourceKind::Function => {
                let out = self
                    .lambda
                    .list_tags()
                    .resource(arn)
                    .send()
                    .await
                    .map_err(sdk_err)?;
                Ok(out.tags().cloned().unwrap_or_default())
            }
            ResourceKind::Database => {
                let out = self
                    .rds
                    .list_tags_for_resource()
                    .resource_name(arn)
                    .send()
                    .await
                    .map_err(sdk_err)?;
                Ok(out
                    .tag_list()
                    .iter()
                    .filter_map(|t| match (t.key(), t.value()) {
                        (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
                        _ => None,
                    })
                    .collect())
            }
            other => Err(ProviderError::Other(format!("no tag source for {other}"))),
        }
    }
}
