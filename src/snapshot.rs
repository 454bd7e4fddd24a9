use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::types::ConsolidatedReport;

/// Persists one run's results as a JSON snapshot for later consolidation.
pub fn save_snapshot(path: &Path, report: &ConsolidatedReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize snapshot")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
    info!("Snapshot written to {}", path.display());
    Ok(())
}

/// Loads every `*.json` snapshot in `dir` and merges them into one report.
///
/// Files are loaded in sorted path order and merged last-write-wins: when two
/// snapshots carry the same environment, the later file's entry replaces the
/// earlier one and a warning is logged. A directory with no snapshots yields
/// an empty report; the caller decides whether that fails the run.
pub fn load_snapshots(dir: &Path) -> Result<ConsolidatedReport> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read snapshot directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut merged = ConsolidatedReport::new();
    for path in paths {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: ConsolidatedReport = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        info!(
            "Loaded snapshot {} ({} environments)",
            path.display(),
            snapshot.len()
        );
        for (env, result) in snapshot {
            if merged.contains_key(&env) {
                warn!(
                    "Environment {} appears in multiple snapshots; keeping the entry from {}",
                    env,
                    path.display()
                );
            }
            merged.insert(env, result);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DatabaseReport, EnvironmentResult, FunctionReport, LogReport, RoleUsage,
    };
    use chrono::Utc;

    fn environment(name: &str, total_roles: i64) -> EnvironmentResult {
        EnvironmentResult {
            environment: name.to_string(),
            account_id: None,
            scanned_at: Utc::now(),
            lambda: FunctionReport::empty(300.0),
            iam: RoleUsage {
                total_roles,
                roles_quota: 1000,
                roles_percent: total_roles as f64 / 10.0,
            },
            rds: DatabaseReport::default(),
            support: vec![],
            logs: LogReport::default(),
            errors: vec![],
        }
    }

    fn write_snapshot(dir: &Path, file: &str, envs: &[(&str, i64)]) {
        let mut report = ConsolidatedReport::new();
        for (name, roles) in envs {
            report.insert(name.to_string(), environment(name, *roles));
        }
        save_snapshot(&dir.join(file), &report).unwrap();
    }

    #[test]
    fn test_round_trip_single_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "dev.json", &[("dev", 100)]);
        let merged = load_snapshots(dir.path()).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["dev"].iam.total_roles, 100);
    }

    #[test]
    fn test_disjoint_snapshots_union() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "dev.json", &[("dev", 100)]);
        write_snapshot(dir.path(), "stage.json", &[("stage", 200)]);
        let merged = load_snapshots(dir.path()).unwrap();
        assert_eq!(
            merged.keys().collect::<Vec<_>>(),
            vec!["dev", "stage"]
        );
    }

    #[test]
    fn test_duplicate_environment_last_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        // Sorted path order: a.json loads before b.json.
        write_snapshot(dir.path(), "a.json", &[("dev", 100)]);
        write_snapshot(dir.path(), "b.json", &[("dev", 999)]);
        let merged = load_snapshots(dir.path()).unwrap();
        assert_eq!(merged["dev"].iam.total_roles, 999);
    }

    #[test]
    fn test_non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "dev.json", &[("dev", 100)]);
        fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
        let merged = load_snapshots(dir.path()).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_empty_directory_yields_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let merged = load_snapshots(dir.path()).unwrap();
        assert!(merged.is_empty());
    }
}
