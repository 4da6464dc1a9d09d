use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// main -> two lazy routes sharing a small `chart` chunk and a larger
/// `table` chunk; `admin` is only loaded by one route
const GRAPH: &str = r#"{
    "modules": [
        { "identifier": "src/main.js", "size": 800 },
        { "identifier": "src/chart.js", "size": 10 },
        { "identifier": "src/table.js", "size": 90 },
        { "identifier": "src/grid.js", "size": 95 },
        { "identifier": "src/admin.js", "size": 5 }
    ],
    "chunks": [
        { "id": 0, "name": "main", "modules": ["src/main.js"], "entryModule": "src/main.js", "runtime": true },
        { "id": 1, "name": "chart", "modules": ["src/chart.js"] },
        { "id": 2, "name": "table", "modules": ["src/table.js"] },
        { "id": 3, "name": "grid", "modules": ["src/grid.js"] },
        { "id": 4, "name": "admin", "modules": ["src/admin.js"] }
    ],
    "groups": [
        { "name": "main", "entry": true, "chunks": [0] },
        { "name": "reports", "chunks": [1, 2], "parents": ["main"] },
        { "name": "dashboard", "chunks": [1, 3], "parents": ["main"] },
        { "name": "tables", "chunks": [2, 3, 4], "parents": ["main"] }
    ]
}"#;

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("graph.json"), GRAPH).unwrap();
    dir
}

fn coalesce(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("coalesce").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("COALESCE_MIN_CHUNK_SIZE");
    cmd
}

fn chunk_ids(graph: &Value) -> Vec<u64> {
    graph["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect()
}

#[test]
fn optimize_merges_small_shared_chunk() {
    let dir = workspace();

    let output = coalesce(dir.path())
        .args(["optimize", "graph.json", "--min-chunk-size", "60"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let graph: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(chunk_ids(&graph), vec![0, 2, 3, 4]);

    let table = &graph["chunks"][1];
    assert_eq!(table["name"], "chart");
    assert_eq!(
        table["modules"],
        serde_json::json!(["src/chart.js", "src/table.js"])
    );
    assert_eq!(graph["groups"][2]["chunks"], serde_json::json!([2, 3]));
}

#[test]
fn optimize_reads_config_file_and_writes_output() {
    let dir = workspace();
    fs::write(
        dir.path().join("coalesce.toml"),
        "[optimize]\nmin_chunk_size = 5\n\n[output]\npretty = false\n",
    )
    .unwrap();

    coalesce(dir.path())
        .args(["optimize", "graph.json", "-o", "out.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Merged 0 chunks"));

    let written = fs::read_to_string(dir.path().join("out.json")).unwrap();
    assert!(!written.contains('\n'));
    let graph: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(chunk_ids(&graph), vec![0, 1, 2, 3, 4]);
}

#[test]
fn optimize_requires_min_chunk_size() {
    let dir = workspace();

    coalesce(dir.path())
        .args(["optimize", "graph.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--min-chunk-size"));
}

#[test]
fn optimize_rejects_invalid_options() {
    let dir = workspace();

    coalesce(dir.path())
        .args([
            "optimize",
            "graph.json",
            "--min-chunk-size",
            "60",
            "--entry-chunk-multiplicator",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entry_chunk_multiplicator"));
}

#[test]
fn check_reports_invalid_graph() {
    let dir = workspace();
    fs::write(
        dir.path().join("orphan.json"),
        r#"{ "chunks": [{ "id": 7 }] }"#,
    )
    .unwrap();

    coalesce(dir.path())
        .args(["check", "graph.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("5 chunks (3 shared)"));

    coalesce(dir.path())
        .args(["check", "orphan.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not belong to any chunk group"));
}

#[test]
fn init_writes_loadable_config() {
    let dir = workspace();

    coalesce(dir.path()).arg("init").assert().success();
    coalesce(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    coalesce(dir.path())
        .args(["optimize", "graph.json"])
        .assert()
        .success();
}
