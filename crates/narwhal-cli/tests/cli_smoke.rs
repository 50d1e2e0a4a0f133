use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;

const GRAPH: &str = r#"{
  "data": {
    "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
    "edges": [{"id": "ab", "source": "a", "target": "b"}, {"id": "bc", "source": "b", "target": "c"}]
  },
  "layout": {"type": "force", "seed": 3},
  "plugins": [{"type": "minimap", "size": [240, 160]}]
}"#;

fn write_fixture() -> (tempfile::TempDir, std::path::PathBuf) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("graph.json");
    fs::write(&path, GRAPH).expect("write fixture");
    (tmp, path)
}

fn run_json(args: &[&str]) -> Value {
    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let output = Command::new(exe).args(args).assert().success().get_output().clone();
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn cli_prints_converged_positions() {
    let (_tmp, path) = write_fixture();
    let out = run_json(&["layout", path.to_string_lossy().as_ref()]);

    assert_eq!(out["layout"], "force");
    let positions = out["positions"].as_object().expect("positions object");
    assert_eq!(
        positions.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
    for p in positions.values() {
        assert!(p["x"].as_f64().is_some_and(f64::is_finite));
        assert!(p["y"].as_f64().is_some_and(f64::is_finite));
    }
}

#[test]
fn cli_render_emits_draw_ops_in_paint_order() {
    let (_tmp, path) = write_fixture();
    let out = run_json(&["render", "--rotate", "2220", path.to_string_lossy().as_ref()]);

    let degrees = out["transform"]["rotation"].as_f64().expect("rotation").to_degrees();
    assert!((degrees - 2220.0).abs() < 1e-6);

    let created: Vec<&str> = out["ops"]
        .as_array()
        .expect("ops array")
        .iter()
        .filter(|op| op["op"] == "create")
        .map(|op| op["item"]["id"].as_str().expect("id"))
        .collect();
    assert_eq!(created, vec!["ab", "bc", "a", "b", "c"]);
}

#[test]
fn cli_rejects_unknown_flags() {
    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    Command::new(exe).arg("--bogus").assert().code(2);
}

#[test]
fn cli_reports_unknown_plugins() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("graph.json");
    fs::write(&path, r#"{"plugins": ["radar"]}"#).expect("write fixture");

    let exe = assert_cmd::cargo_bin!("narwhal-cli");
    let output = Command::new(exe)
        .arg(path.to_string_lossy().as_ref())
        .assert()
        .code(1)
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown plugin type: radar"));
}
