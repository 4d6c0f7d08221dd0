use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lakedrop_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lakedrop");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Drop a few files into the watch directory
    let inbox = root.join("inbox");
    fs::create_dir_all(&inbox).unwrap();
    fs::write(
        inbox.join("alpha.md"),
        "# Alpha Report\n\nQuarterly figures and commentary.",
    )
    .unwrap();
    fs::write(
        inbox.join("beta.txt"),
        "Beta notes.\n\nOperational checklist for the deployment.",
    )
    .unwrap();
    fs::write(
        inbox.join("gamma.json"),
        r#"{"dataset": "gamma", "rows": 42}"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/lakedrop.sqlite"

[blobs]
backend = "fs"
root = "{root}/data/blobs"

[detector]
strategy = "hash-confirmed"
poll_interval_secs = 5

[connectors.file_drop.inbox]
root = "{root}/inbox"
extensions = [".md", ".txt", ".json"]
"#,
        root = root.display()
    );

    let config_path = config_dir.join("lakedrop.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lakedrop(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lakedrop_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lakedrop binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_catalog() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lakedrop(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/lakedrop.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lakedrop(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lakedrop(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_scan_lists_pending_files() {
    let (_tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    let (stdout, stderr, success) = run_lakedrop(&config_path, &["scan", "inbox"]);
    assert!(success, "scan failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("items needing ingestion: 3"));
    assert!(stdout.contains("alpha.md"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_run_ingests_dropped_files() {
    let (tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    let (stdout, stderr, success) = run_lakedrop(&config_path, &["run", "inbox"]);
    assert!(success, "run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("discovered: 3"));
    assert!(stdout.contains("ingested:   3"));
    assert!(stdout.contains("errors:     0"));
    assert!(stdout.contains("ok"));

    // Blobs landed under the raw/ prefix
    assert!(tmp.path().join("data/blobs/raw").exists());
}

#[test]
fn test_second_run_is_no_work() {
    let (_tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    run_lakedrop(&config_path, &["run", "inbox"]);

    let (stdout, _, success) = run_lakedrop(&config_path, &["run", "inbox"]);
    assert!(success);
    assert!(
        stdout.contains("no new work"),
        "Expected no-work on second run, got: {}",
        stdout
    );
}

#[test]
fn test_new_file_triggers_incremental_run() {
    let (tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    run_lakedrop(&config_path, &["run", "inbox"]);

    fs::write(
        tmp.path().join("inbox/delta.md"),
        "# Delta\n\nA late arrival.",
    )
    .unwrap();

    let (stdout, _, success) = run_lakedrop(&config_path, &["run", "inbox"]);
    assert!(success);
    assert!(
        stdout.contains("ingested:   1"),
        "Expected 1 ingested after new drop, got: {}",
        stdout
    );
}

#[test]
fn test_duplicate_content_is_skipped() {
    let (tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    run_lakedrop(&config_path, &["run", "inbox"]);

    // Same bytes as an already-ingested file, under a new name
    let alpha = fs::read(tmp.path().join("inbox/alpha.md")).unwrap();
    fs::write(tmp.path().join("inbox/alpha-copy.md"), alpha).unwrap();

    let (stdout, _, success) = run_lakedrop(&config_path, &["run", "inbox"]);
    assert!(success);
    assert!(
        stdout.contains("skipped:    1"),
        "Expected duplicate to be skipped, got: {}",
        stdout
    );
    assert!(stdout.contains("ingested:   0"));
}

#[test]
fn test_hidden_and_disallowed_files_ignored() {
    let (tmp, config_path) = setup_test_env();

    fs::write(tmp.path().join("inbox/.partial"), "in flight").unwrap();
    fs::write(tmp.path().join("inbox/blob.bin"), "binary").unwrap();

    run_lakedrop(&config_path, &["init"]);
    let (stdout, _, success) = run_lakedrop(&config_path, &["scan", "inbox"]);
    assert!(success);
    assert!(
        stdout.contains("items needing ingestion: 3"),
        "Hidden/disallowed files should not be scanned, got: {}",
        stdout
    );
}

#[test]
fn test_stats_reflects_ingestion() {
    let (_tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    run_lakedrop(&config_path, &["run", "inbox"]);

    let (stdout, _, success) = run_lakedrop(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:       3"));
    assert!(stdout.contains("Versions:        3"));
    assert!(stdout.contains("1 completed"));
}

#[test]
fn test_sources() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_lakedrop(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("inbox"));
    assert!(stdout.contains("OK"));
}

#[test]
fn test_unknown_connector() {
    let (_tmp, config_path) = setup_test_env();

    run_lakedrop(&config_path, &["init"]);
    let (_, stderr, success) = run_lakedrop(&config_path, &["run", "nonexistent"]);
    assert!(!success, "Unknown connector should fail");
    assert!(stderr.contains("Unknown connector"));
}

#[test]
fn test_invalid_strategy_rejected() {
    let (tmp, config_path) = setup_test_env();

    let bad = fs::read_to_string(&config_path)
        .unwrap()
        .replace("hash-confirmed", "mtime");
    let bad_path = tmp.path().join("config/bad.toml");
    fs::write(&bad_path, bad).unwrap();

    let (_, stderr, success) = run_lakedrop(&bad_path, &["init"]);
    assert!(!success, "Invalid strategy should fail config validation");
    assert!(stderr.contains("strategy"));
}
