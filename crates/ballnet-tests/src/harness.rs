//! Helpers for tests that need an external interpreter.

use std::fs;
use std::path::{Path, PathBuf};

/// Whether runner-process tests are enabled (`BALLNET_RUN_RUNTIME_TESTS=1`).
pub fn should_run_runtime_tests() -> bool {
    std::env::var("BALLNET_RUN_RUNTIME_TESTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Finds a Python interpreter on `PATH`.
pub fn find_python() -> Option<PathBuf> {
    ["python3", "python"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Writes a runner script that mimics the press model without onnxruntime:
/// every node moves by `dz` along z and `Fz = -2.5 * dz`.
///
/// The runner reads `node_count` from the model file, which holds a single
/// integer.
pub fn write_press_runner(dir: &Path) -> PathBuf {
    let path = dir.join("press_runner.py");
    fs::write(&path, PRESS_RUNNER).expect("Failed to write runner");
    path
}

/// Writes the press runner with a prelude that writes `stderr_bytes` bytes of
/// warnings to stderr before answering.
pub fn write_noisy_press_runner(dir: &Path, stderr_bytes: usize) -> PathBuf {
    let path = dir.join("noisy_press_runner.py");
    let script = format!(
        "import sys\nsys.stderr.write(\"w\" * {})\nsys.stderr.flush()\n{}",
        stderr_bytes, PRESS_RUNNER
    );
    fs::write(&path, script).expect("Failed to write runner");
    path
}

/// Writes a runner script that always reports the given error.
pub fn write_failing_runner(dir: &Path, message: &str) -> PathBuf {
    let path = dir.join("failing_runner.py");
    let script = format!(
        r#"import argparse, json
p = argparse.ArgumentParser()
p.add_argument("--request")
p.add_argument("--response")
a = p.parse_args()
with open(a.response, "w") as f:
    json.dump({{"ok": False, "error": {:?}}}, f)
"#,
        message
    );
    fs::write(&path, script).expect("Failed to write runner");
    path
}

const PRESS_RUNNER: &str = r#"import argparse
import json

parser = argparse.ArgumentParser()
parser.add_argument("--request", required=True)
parser.add_argument("--response", required=True)
args = parser.parse_args()

with open(args.request) as f:
    request = json.load(f)
with open(request["model"]) as f:
    node_count = int(f.read().strip())

dz = request["motion"][2]
force = [0.0, 0.0, -2.5 * dz, 0.0, 0.0, request["motion"][5]]
nodes = []
for _ in range(node_count):
    nodes.extend([0.0, 0.0, dz])

with open(args.response, "w") as f:
    json.dump({"ok": True, "force": force, "nodes": nodes}, f)
"#;
