use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rh_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rh"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/reports.sqlite"

[query]
default_limit = 20

[log]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("reports.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_rh(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rh_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rh binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn write_json(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

/// Run init and register source `src-42` with canonical id `S1`.
fn init_with_source(config_path: &Path) {
    let (stdout, stderr, success) = run_rh(config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    let (stdout, stderr, success) = run_rh(config_path, &["source", "add", "src-42", "--id", "S1"]);
    assert!(success, "source add failed: stdout={}, stderr={}", stdout, stderr);
}

fn query_json(config_path: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["query", "--json"];
    full.extend_from_slice(args);
    let (stdout, stderr, success) = run_rh(config_path, &full);
    assert!(success, "query failed: stdout={}, stderr={}", stdout, stderr);
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_rh(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_rh(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_rh(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_source_add_and_list() {
    let (_tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let (stdout, _, success) = run_rh(&config_path, &["source", "list"]);
    assert!(success);
    assert!(stdout.contains("S1"));
    assert!(stdout.contains("src-42"));

    let (_, _, dup) = run_rh(&config_path, &["source", "add", "src-42"]);
    assert!(!dup, "duplicate source name should fail");
}

#[test]
fn test_save_resolves_source_and_emits_created() {
    let (tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let input = write_json(
        tmp.path(),
        "report.json",
        r#"{"id": "r1", "content": "flood warning", "source": "src-42"}"#,
    );
    let (stdout, stderr, success) = run_rh(&config_path, &["save", input.to_str().unwrap()]);
    assert!(success, "save failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("saved r1 (source: S1)"));
    assert!(stdout.contains("saved reports: 1"));
    assert_eq!(stdout.matches("event report-created").count(), 1);
    assert!(!stdout.contains("report-status-changed"));

    let (stdout, _, success) = run_rh(&config_path, &["get", "r1"]);
    assert!(success);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["source"], "S1");
    assert!(report["stored_at"].is_string());
}

#[test]
fn test_save_unknown_source_fails() {
    let (tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let input = write_json(
        tmp.path(),
        "orphan.json",
        r#"{"id": "orphan", "content": "no home", "source": "src-404"}"#,
    );
    let (stdout, stderr, success) = run_rh(&config_path, &["save", input.to_str().unwrap()]);
    assert!(!success, "save should fail: stdout={}", stdout);
    assert!(stderr.contains("src-404"), "stderr={}", stderr);
    assert!(!stdout.contains("event"));

    let (_, _, found) = run_rh(&config_path, &["get", "orphan"]);
    assert!(!found, "unresolved report must not be committed");
}

#[test]
fn test_status_change_emits_single_event() {
    let (tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let input = write_json(
        tmp.path(),
        "report.json",
        r#"{"id": "r1", "content": "bridge closed", "status": "new"}"#,
    );
    run_rh(&config_path, &["save", input.to_str().unwrap()]);

    let (stdout, stderr, success) = run_rh(&config_path, &["status", "r1", "verified"]);
    assert!(success, "status failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("updated r1 (status: verified)"));
    assert_eq!(stdout.matches("event report-status-changed").count(), 1);
    assert!(!stdout.contains("report-created"));

    // Same status again: nothing to announce.
    let (stdout, _, success) = run_rh(&config_path, &["status", "r1", "verified"]);
    assert!(success);
    assert!(!stdout.contains("event"));
}

#[test]
fn test_status_unknown_report_fails() {
    let (_tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let (_, stderr, success) = run_rh(&config_path, &["status", "missing", "closed"]);
    assert!(!success);
    assert!(stderr.contains("missing"));
}

#[test]
fn test_query_default_limit_and_watermark() {
    let (tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let reports: Vec<String> = (0..25)
        .map(|i| format!(r#"{{"content": "report number {}"}}"#, i))
        .collect();
    let input = write_json(tmp.path(), "batch.json", &format!("[{}]", reports.join(",")));
    let (stdout, _, success) = run_rh(&config_path, &["save", input.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("saved reports: 25"));

    let all = query_json(&config_path, &[]);
    assert_eq!(all["reports"].as_array().unwrap().len(), 20);
    let since = all["since"].as_str().unwrap().to_string();

    let limited = query_json(&config_path, &["--limit", "3"]);
    assert_eq!(limited["reports"].as_array().unwrap().len(), 3);

    // Nothing stored since the first query's watermark.
    let newer = query_json(&config_path, &["--since", &since]);
    assert!(newer["reports"].as_array().unwrap().is_empty());
    let parse = |s: &str| chrono::DateTime::parse_from_rfc3339(s).unwrap();
    assert!(parse(newer["since"].as_str().unwrap()) > parse(&since));

    let late = write_json(tmp.path(), "late.json", r#"{"id": "late", "content": "late flood report"}"#);
    run_rh(&config_path, &["save", late.to_str().unwrap()]);

    let newer = query_json(&config_path, &["--since", &since]);
    let ids: Vec<&str> = newer["reports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["late"]);
}

#[test]
fn test_query_keywords_returns_plain_reports() {
    let (tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let input = write_json(
        tmp.path(),
        "batch.json",
        r#"[
            {"id": "a", "content": "river flood near the bridge"},
            {"id": "b", "content": "sunny weekend ahead"},
            {"id": "c", "content": "flood warning issued for the valley"}
        ]"#,
    );
    run_rh(&config_path, &["save", input.to_str().unwrap()]);

    let result = query_json(&config_path, &["flood warning"]);
    let reports = result["reports"].as_array().unwrap();
    let ids: Vec<&str> = reports.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["c", "a"]);
    assert!(reports[0].get("score").is_none());

    let (stdout, _, success) = run_rh(&config_path, &["query", "tornado"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_watch_runs_requested_rounds() {
    let (tmp, config_path) = setup_test_env();
    init_with_source(&config_path);

    let input = write_json(tmp.path(), "r.json", r#"{"id": "w1", "content": "ice on roads"}"#);
    run_rh(&config_path, &["save", input.to_str().unwrap()]);

    let (stdout, stderr, success) = run_rh(
        &config_path,
        &["watch", "--interval", "0", "--rounds", "2"],
    );
    assert!(success, "watch failed: stdout={}, stderr={}", stdout, stderr);
    // Only the first round sees the report; the second starts at the new watermark.
    assert_eq!(stdout.matches("w1").count(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bad.toml");
    fs::write(&config_path, "[db]\npath = \"x.sqlite\"\n[query]\ndefault_limit = 0\n").unwrap();

    let (_, stderr, success) = run_rh(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("default_limit"));
}
