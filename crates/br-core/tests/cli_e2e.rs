//! End-to-end CLI tests for the burnrate binary.
//!
//! Every test runs against its own temp data directory with the config and
//! logging environment cleared, so the host's files never leak in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const T0: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

/// Get an isolated Command for the burnrate binary.
fn burnrate(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("burnrate").expect("burnrate binary should exist");
    cmd.env_remove("BURNRATE_CONFIG")
        .env_remove("BURNRATE_CONFIG_DIR")
        .env_remove("BURNRATE_DATA_DIR")
        .env_remove("BURNRATE_LOG")
        .env_remove("BURNRATE_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .arg("--data-dir")
        .arg(home.path().join("store"));
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const REGISTRY: &str = r#"[
  {"entity_id": "a", "group": "alpha", "proxy_reference": "p1", "proxy_kind": "status"},
  {"entity_id": "b", "group": "alpha", "proxy_reference": "p1", "proxy_kind": "status"},
  {"entity_id": "solo", "proxy_reference": "p2", "proxy_kind": "summary"}
]"#;

fn import_registry(home: &TempDir) {
    let file = write(home, "registry-import.json", REGISTRY);
    burnrate(home)
        .args(["registry", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""affected": 3"#));
}

fn collect_at(home: &TempDir, now: i64, balances: &str) {
    let file = write(home, &format!("balances-{}.json", now), balances);
    burnrate(home)
        .args(["collect", "--now", &now.to_string(), "--balances"])
        .arg(&file)
        .assert()
        .success();
}

/// Registry plus two hourly snapshots: a burns 5e12/h, b burns 1e12/h,
/// solo is only seen once.
fn populated() -> TempDir {
    let home = TempDir::new().unwrap();
    import_registry(&home);
    collect_at(
        &home,
        T0,
        r#"{"a": "100000000000000", "b": "20000000000000"}"#,
    );
    collect_at(
        &home,
        T0 + HOUR,
        r#"{"a": "95000000000000", "b": "19000000000000", "solo": "7"}"#,
    );
    home
}

fn snapshots_file(home: &TempDir) -> std::path::PathBuf {
    Path::new(home.path()).join("store").join("snapshots.json")
}

// ============================================================================
// Collection and storage
// ============================================================================

mod collection {
    use super::*;

    #[test]
    fn collect_writes_snapshot_log() {
        let home = populated();
        let content = std::fs::read_to_string(snapshots_file(&home)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        let snapshots = json.as_array().unwrap();
        assert_eq!(snapshots.len(), 2);
        // Newest first.
        assert_eq!(snapshots[0]["timestamp"], T0 + HOUR);
        assert_eq!(snapshots[0]["balances"]["a"], "95000000000000");
    }

    #[test]
    fn collect_reports_fallbacks() {
        let home = populated();
        let file = write(&home, "partial.json", r#"{"a": "90000000000000"}"#);
        burnrate(&home)
            .args(["collect", "--now", &(T0 + 2 * HOUR).to_string(), "--balances"])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""failed": 2"#))
            .stdout(predicate::str::contains(r#""fallback": 2"#));
    }

    #[test]
    fn collect_every_runs_bounded_cycles() {
        let home = TempDir::new().unwrap();
        import_registry(&home);
        let file = write(&home, "balances.json", r#"{"a": "100", "b": "50"}"#);
        burnrate(&home)
            .args(["collect", "--now", &T0.to_string(), "--every", "10ms", "--cycles", "3"])
            .arg("--balances")
            .arg(&file)
            .assert()
            .success();

        let content = std::fs::read_to_string(snapshots_file(&home)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        let stamps: Vec<i64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["timestamp"].as_i64().unwrap())
            .collect();
        assert_eq!(stamps, vec![T0 + 20, T0 + 10, T0]);
    }

    #[test]
    fn collect_cycles_requires_every() {
        let home = TempDir::new().unwrap();
        burnrate(&home)
            .args(["collect", "--cycles", "2", "--balances", "b.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--every"));
    }

    #[test]
    fn collect_every_fails_fast_on_missing_file() {
        let home = TempDir::new().unwrap();
        import_registry(&home);
        burnrate(&home)
            .args(["collect", "--every", "1h", "--balances", "/nonexistent/balances.json"])
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .code(20);
    }

    #[test]
    fn collect_with_missing_balances_file_fails() {
        let home = TempDir::new().unwrap();
        import_registry(&home);
        burnrate(&home)
            .args(["collect", "--balances", "/nonexistent/balances.json"])
            .assert()
            .code(20)
            .stderr(predicate::str::contains("balance"));
    }
}

// ============================================================================
// Queries
// ============================================================================

mod queries {
    use super::*;

    #[test]
    fn rate_reports_exact_amount() {
        let home = populated();
        burnrate(&home)
            .args(["rate", "a"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""rate": "5000000000000""#));
    }

    #[test]
    fn rate_summary_format() {
        let home = populated();
        burnrate(&home)
            .args(["-f", "summary", "rate", "a", "--window", "7d"])
            .assert()
            .success()
            .stdout(predicate::str::contains("a: 5.00T/h"));
    }

    #[test]
    fn rate_with_one_point_is_no_data() {
        let home = populated();
        burnrate(&home)
            .args(["rate", "solo"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""estimate": null"#));
    }

    #[test]
    fn rate_of_unknown_entity_is_args_error() {
        let home = populated();
        burnrate(&home)
            .args(["rate", "ghost"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains(r#""code":21"#));
    }

    #[test]
    fn invalid_window_is_rejected_by_parser() {
        let home = populated();
        burnrate(&home)
            .args(["rate", "a", "--window", "soon"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid window"));
    }

    #[test]
    fn group_rate_sums_members() {
        let home = populated();
        burnrate(&home)
            .args(["group", "alpha"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""rate": "6000000000000""#))
            .stdout(predicate::str::contains(r#""entities_with_data": 2"#));
    }

    #[test]
    fn unknown_group_is_args_error() {
        let home = populated();
        burnrate(&home).args(["group", "nobody"]).assert().code(10);
    }

    #[test]
    fn leaderboard_ranks_by_day_rate() {
        let home = populated();
        let output = burnrate(&home).args(["leaderboard"]).output().unwrap();
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let ids: Vec<&str> = json["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["entity_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "solo"]);
        assert_eq!(json["total"], 3);
    }

    #[test]
    fn leaderboard_pages() {
        let home = populated();
        let output = burnrate(&home)
            .args(["leaderboard", "--offset", "1", "--limit", "1"])
            .output()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);
        assert_eq!(json["entries"][0]["entity_id"], "b");
    }

    #[test]
    fn as_of_now_hides_later_snapshots() {
        let home = populated();
        burnrate(&home)
            .args(["--now", &T0.to_string(), "rate", "a"])
            .assert()
            .code(1);
    }

    #[test]
    fn markdown_detail() {
        let home = populated();
        burnrate(&home)
            .args(["-f", "md", "detail", "a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Entity a"));
    }

    #[test]
    fn stats_counts() {
        let home = populated();
        burnrate(&home)
            .arg("stats")
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""snapshot_count": 2"#))
            .stdout(predicate::str::contains(r#""entity_count": 3"#));
    }
}

// ============================================================================
// Registry administration
// ============================================================================

mod registry {
    use super::*;

    #[test]
    fn export_round_trips_import() {
        let home = populated();
        burnrate(&home)
            .args(["registry", "export"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""entity_id": "solo""#));
    }

    #[test]
    fn set_valid_hides_entity_from_leaderboard() {
        let home = populated();
        burnrate(&home)
            .args(["registry", "set-valid", "a", "false"])
            .assert()
            .success();
        let output = burnrate(&home).arg("leaderboard").output().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["total"], 2);
    }

    #[test]
    fn remove_strips_snapshots() {
        let home = populated();
        burnrate(&home)
            .args(["registry", "remove", "a"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""affected": 1"#));
        let content = std::fs::read_to_string(snapshots_file(&home)).unwrap();
        assert!(!content.contains(r#""a""#));
    }

    #[test]
    fn clear_requires_confirmation() {
        let home = populated();
        burnrate(&home)
            .args(["registry", "clear"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--yes"));
        burnrate(&home)
            .args(["registry", "clear", "--yes"])
            .assert()
            .success();
        burnrate(&home)
            .arg("stats")
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""snapshot_count": 0"#));
    }

    #[test]
    fn remove_logs_each_entity() {
        let home = populated();
        burnrate(&home)
            .args(["--log-format", "jsonl", "registry", "remove", "a", "ghost"])
            .assert()
            .success()
            .stderr(predicate::str::contains(r#""event":"registry.removed""#))
            .stderr(predicate::str::contains(r#""entity_id":"a""#))
            .stderr(predicate::str::contains(r#""entity_id":"ghost""#).not());
    }

    #[test]
    fn update_unknown_entity_fails() {
        let home = populated();
        burnrate(&home)
            .args(["registry", "update", "ghost", "--group", "x"])
            .assert()
            .code(10);
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn show_defaults() {
        let home = TempDir::new().unwrap();
        burnrate(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""source": "builtin default""#));
    }

    #[test]
    fn builtin_defaults_are_logged() {
        let home = TempDir::new().unwrap();
        burnrate(&home)
            .args(["-v", "--log-format", "jsonl", "stats"])
            .assert()
            .success()
            .stderr(predicate::str::contains(r#""event":"config.default_used""#));
    }

    #[test]
    fn config_file_suppresses_default_notice() {
        let home = TempDir::new().unwrap();
        let path = write(&home, "burnrate.json", "{}");
        burnrate(&home)
            .args(["-v", "--log-format", "jsonl", "--config"])
            .arg(&path)
            .arg("stats")
            .assert()
            .success()
            .stderr(predicate::str::contains(r#""event":"config.loaded""#))
            .stderr(predicate::str::contains("config.default_used").not());
    }

    #[test]
    fn explicit_missing_config_is_config_error() {
        let home = TempDir::new().unwrap();
        burnrate(&home)
            .args(["--config", "/nonexistent/burnrate.json", "stats"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("ERR_CONFIG"));
    }

    #[test]
    fn validate_rejects_bad_windows() {
        let home = TempDir::new().unwrap();
        let path = write(
            &home,
            "bad.json",
            r#"{"schema_version": "1.0.0", "windows": {"short_ms": 0}}"#,
        );
        burnrate(&home)
            .args(["config", "validate"])
            .arg(&path)
            .assert()
            .code(11);
    }

    #[test]
    fn validate_accepts_empty_object() {
        let home = TempDir::new().unwrap();
        let path = write(&home, "ok.json", "{}");
        burnrate(&home)
            .args(["-f", "summary", "config", "validate"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("OK"));
    }
}
