use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

use crate::types::{Config, EnvironmentSpec};

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

// ENVIRONMENTS entries are "name" or "name=profile"; every environment shares
// the single configured region.
fn parse_environments(raw: &str, region: &str) -> Vec<EnvironmentSpec> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (name, profile) = match entry.split_once('=') {
                Some((name, profile)) => (name.trim(), Some(profile.trim().to_string())),
                None => (entry, None),
            };
            EnvironmentSpec {
                name: name.to_string(),
                profile: profile.filter(|p| !p.is_empty()),
                region: region.to_string(),
            }
        })
        .collect()
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let consolidate_dir = env.get_var("CONSOLIDATE_DIR").filter(|v| !v.is_empty());

    let region = env
        .get_var("REGION")
        .unwrap_or_else(|| "us-west-2".to_string());
    let environments = parse_environments(
        &env.get_var("ENVIRONMENTS").unwrap_or_default(),
        &region,
    );
    // Scan mode needs at least one environment; consolidation mode reads
    // snapshots instead of scanning.
    if environments.is_empty() && consolidate_dir.is_none() {
        return Err(anyhow!(
            "ENVIRONMENTS env var must be set (comma-separated name or name=profile entries)"
        ));
    }

    let slack_webhook_url = env.get_var("SLACK_WEBHOOK_URL").filter(|v| !v.is_empty());

    let log_age_days: i64 = env
        .get_var("LOG_AGE_DAYS")
        .unwrap_or_else(|| "90".to_string())
        .parse()
        .context("Invalid LOG_AGE_DAYS")?;

    let minimum_engine_version: u32 = env
        .get_var("MINIMUM_ENGINE_VERSION")
        .unwrap_or_else(|| "15".to_string())
        .parse()
        .context("Invalid MINIMUM_ENGINE_VERSION")?;

    let skip_slack = env
        .get_var("SKIP_SLACK")
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false);

    Ok(Config {
        environments,
        slack_webhook_url,
        log_age_days,
        minimum_engine_version,
        snapshot_path: env.get_var("SNAPSHOT_JSON").filter(|v| !v.is_empty()),
        consolidate_dir,
        report_dir: env
            .get_var("REPORT_DIR")
            .unwrap_or_else(|| ".".to_string()),
        report_url: env.get_var("REPORT_URL").filter(|v| !v.is_empty()),
        s3_bucket: env.get_var("S3_BUCKET").filter(|v| !v.is_empty()),
        sns_topic_arn: env.get_var("SNS_TOPIC_ARN").filter(|v| !v.is_empty()),
        skip_slack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading_with_env() {
        let env = MockEnvironment::new()
            .with_var("ENVIRONMENTS", "dev=guild-dev, stage=guild-stage, prod")
            .with_var("REGION", "eu-central-1")
            .with_var("SLACK_WEBHOOK_URL", "https://hooks.slack.com/test")
            .with_var("LOG_AGE_DAYS", "120")
            .with_var("MINIMUM_ENGINE_VERSION", "14")
            .with_var("SNAPSHOT_JSON", "/tmp/dev.json")
            .with_var("REPORT_DIR", "/tmp/reports")
            .with_var("S3_BUCKET", "reports-bucket")
            .with_var("SKIP_SLACK", "true");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.environments.len(), 3);
        assert_eq!(config.environments[0].name, "dev");
        assert_eq!(
            config.environments[0].profile,
            Some("guild-dev".to_string())
        );
        assert_eq!(config.environments[0].region, "eu-central-1");
        assert_eq!(config.environments[2].name, "prod");
        assert_eq!(config.environments[2].profile, None);
        assert_eq!(
            config.slack_webhook_url,
            Some("https://hooks.slack.com/test".to_string())
        );
        assert_eq!(config.log_age_days, 120);
        assert_eq!(config.minimum_engine_version, 14);
        assert_eq!(config.snapshot_path, Some("/tmp/dev.json".to_string()));
        assert_eq!(config.report_dir, "/tmp/reports");
        assert_eq!(config.s3_bucket, Some("reports-bucket".to_string()));
        assert!(config.skip_slack);
    }

    #[test]
    fn test_config_loading_defaults() {
        let env = MockEnvironment::new().with_var("ENVIRONMENTS", "dev");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.environments[0].region, "us-west-2"); // default
        assert_eq!(config.log_age_days, 90); // default
        assert_eq!(config.minimum_engine_version, 15); // default
        assert_eq!(config.report_dir, "."); // default
        assert_eq!(config.slack_webhook_url, None);
        assert_eq!(config.snapshot_path, None);
        assert_eq!(config.consolidate_dir, None);
        assert!(!config.skip_slack);
    }

    #[test]
    fn test_environments_required_unless_consolidating() {
        let env = MockEnvironment::new();
        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ENVIRONMENTS"));

        let env = MockEnvironment::new().with_var("CONSOLIDATE_DIR", "/tmp/snapshots");
        let config = load_config_with_env(&env).unwrap();
        assert!(config.environments.is_empty());
        assert_eq!(config.consolidate_dir, Some("/tmp/snapshots".to_string()));
    }

    #[test]
    fn test_environment_parsing_trims_entries() {
        let env = MockEnvironment::new().with_var("ENVIRONMENTS", " dev = profile-a , , stage ,");
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.environments[0].name, "dev");
        assert_eq!(
            config.environments[0].profile,
            Some("profile-a".to_string())
        );
        assert_eq!(config.environments[1].name, "stage");
    }

    #[test]
    fn test_invalid_numeric_values_fail() {
        let env = MockEnvironment::new()
            .with_var("ENVIRONMENTS", "dev")
            .with_var("LOG_AGE_DAYS", "ninety");
        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("LOG_AGE_DAYS"));
    }

    #[test]
    fn test_empty_optional_vars_become_none() {
        let env = MockEnvironment::new()
            .with_var("ENVIRONMENTS", "dev")
            .with_var("SLACK_WEBHOOK_URL", "")
            .with_var("S3_BUCKET", "");
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.slack_webhook_url, None);
        assert_eq!(config.s3_bucket, None);
    }
}
