//! E2E tests for `forky layout`, `forky summary` and `forky block`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn forky_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("forky"));
    cmd.current_dir(dir);
    cmd.env("FORKY_LOG", "error");
    cmd
}

fn block(slot: u64, root: &str, parent: &str, weight: u64) -> Value {
    json!({
        "slot": slot.to_string(),
        "block_root": root,
        "parent_root": parent,
        "justified_epoch": "1",
        "finalized_epoch": "0",
        "weight": weight.to_string(),
        "validity": "VALID",
        "execution_block_hash": "0xee"
    })
}

fn write_snapshot(dir: &Path, id: &str, node: &str, blocks: Vec<Value>) -> PathBuf {
    let snapshot = json!({
        "metadata": {
            "id": id,
            "node": node,
            "fetched_at": "2023-03-01T12:00:00Z",
            "wall_clock_slot": 4,
            "wall_clock_epoch": 0
        },
        "data": {
            "finalized_checkpoint": {"epoch": "0", "root": "0xaa"},
            "justified_checkpoint": {"epoch": "0", "root": "0xaa"},
            "fork_choice_nodes": blocks
        }
    });
    let path = dir.join(format!("{node}.json"));
    std::fs::write(&path, snapshot.to_string()).expect("write snapshot");
    path
}

/// `lighthouse` follows `0xcc`, `prysm` and `teku` follow `0xdd`.
fn split_sources(dir: &Path) -> Vec<PathBuf> {
    let common = || vec![block(1, "0xaa", "", 9), block(2, "0xbb", "0xaa", 9)];
    let with = |extra: Value| {
        let mut blocks = common();
        blocks.push(extra);
        blocks
    };
    vec![
        write_snapshot(dir, "1", "lighthouse", with(block(3, "0xcc", "0xbb", 5))),
        write_snapshot(dir, "2", "prysm", with(block(3, "0xdd", "0xbb", 7))),
        write_snapshot(dir, "3", "teku", with(block(3, "0xdd", "0xbb", 4))),
    ]
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = forky_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("forky should not crash");
    assert!(
        output.status.success(),
        "forky failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

// ---------------------------------------------------------------------------
// forky layout
// ---------------------------------------------------------------------------

#[test]
fn layout_single_snapshot_is_weighted() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());

    let json = run_json(dir.path(), &["layout", files[0].to_str().expect("utf8")]);
    assert_eq!(json["attributes"]["type"], "weighted");
    assert_eq!(json["attributes"]["id"], "1");
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["edges"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["minOffset"], 0);
    assert_eq!(json["maxOffset"], 0);
}

#[test]
fn layout_many_snapshots_is_aggregated() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());
    let mut args = vec!["layout"];
    args.extend(files.iter().map(|f| f.to_str().expect("utf8")));

    let json = run_json(dir.path(), &args);
    assert_eq!(json["attributes"]["type"], "aggregated");
    assert_eq!(json["attributes"]["forks"], 1);
    assert_eq!(json["attributes"]["head"], "30xdd0xbb");
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["minOffset"], -1);
}

#[test]
fn layout_honors_spacing_from_config() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());
    std::fs::write(dir.path().join("forky.toml"), "[layout]\nspacing_x = 10.0\nspacing_y = 20.0\n")
        .expect("write config");

    let json = run_json(dir.path(), &["layout", files[0].to_str().expect("utf8")]);
    let root = json["nodes"]
        .as_array()
        .and_then(|nodes| nodes.iter().find(|n| n["attributes"]["blockRoot"] == "0xaa"))
        .expect("root node");
    assert_eq!(root["x"], 10.0);
    assert_eq!(root["y"], -20.0);
}

#[test]
fn layout_human_output_lists_blocks() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());

    forky_cmd(dir.path())
        .args(["layout", files[0].to_str().expect("utf8")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Graph 1 (Weighted)"))
        .stdout(predicate::str::contains("0xcc"));
}

#[test]
fn invalid_slot_reports_graph_error_code() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_snapshot(dir.path(), "1", "broken", vec![
        block(1, "0xaa", "", 9),
        json!({"slot": "twelve", "block_root": "0xbb", "parent_root": "0xaa", "weight": "1"}),
    ]);

    forky_cmd(dir.path())
        .args(["layout", path.to_str().expect("utf8"), "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("G1002"))
        .stderr(predicate::str::contains("0xbb"));
}

#[test]
fn missing_file_fails_with_context() {
    let dir = TempDir::new().expect("tempdir");
    forky_cmd(dir.path())
        .args(["layout", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read nope.json"));
}

#[test]
fn malformed_config_fails() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());
    std::fs::write(dir.path().join("forky.toml"), "[layout\n").expect("write config");

    forky_cmd(dir.path())
        .args(["layout", files[0].to_str().expect("utf8")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

// ---------------------------------------------------------------------------
// forky summary / forky block
// ---------------------------------------------------------------------------

#[test]
fn summary_flags_sources_on_the_consensus_head() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());
    let mut args = vec!["summary"];
    args.extend(files.iter().map(|f| f.to_str().expect("utf8")));

    let json = run_json(dir.path(), &args);
    assert_eq!(json["head"], "30xdd0xbb");
    let rows = json["sources"].as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["source"], "lighthouse");
    assert_eq!(rows[0]["is_canonical_head"], false);
    assert_eq!(rows[1]["is_canonical_head"], true);
    assert_eq!(rows[2]["head_root"], "0xdd");
}

#[test]
fn block_reports_sources_that_saw_it() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());
    let mut args = vec!["block", "0xdd"];
    args.extend(files.iter().map(|f| f.to_str().expect("utf8")));

    let json = run_json(dir.path(), &args);
    assert_eq!(json["slot"], 3);
    assert_eq!(json["seen_by"], json!(["prysm", "teku"]));
    assert_eq!(json["highest_weight"], "7");
    assert_eq!(json["has_invalid"], false);
}

#[test]
fn block_with_unknown_root_fails() {
    let dir = TempDir::new().expect("tempdir");
    let files = split_sources(dir.path());

    forky_cmd(dir.path())
        .args(["block", "0xff", files[0].to_str().expect("utf8")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0xff"));
}
