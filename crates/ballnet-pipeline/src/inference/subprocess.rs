//! External model runner.
//!
//! The model is evaluated by a separate process. Communication happens via
//! JSON files in a per-call temp directory:
//!
//! - `request.json`: `{"model": ..., "input_name": ..., "motion": [6 floats]}`
//! - `response.json`: `{"ok": true, "force": [...], "nodes": [...]}` or
//!   `{"ok": false, "error": "..."}`
//!
//! The default runner is a bundled Python script that evaluates an ONNX graph
//! with onnxruntime.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use ballnet_core::ModelInput;
use serde::{Deserialize, Serialize};

use super::{InferenceAdapter, InferenceOutput, RawOutput};
use crate::error::{InferenceError, InferenceResult};

const EMBEDDED_RUNNER_PY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/runner/onnx_runner.py"
));

/// Default timeout for one model evaluation.
pub const DEFAULT_TIMEOUT_SECS: u64 = ballnet_core::config::DEFAULT_MODEL_TIMEOUT_SECS;

/// Environment variable naming the interpreter for the runner.
pub const PYTHON_ENV_VAR: &str = "BALLNET_PYTHON";

/// Configuration for a subprocess model.
#[derive(Debug, Clone)]
pub struct SubprocessConfig {
    /// Model file handed to the runner.
    pub model: PathBuf,
    /// Interpreter executable.
    pub interpreter: Option<PathBuf>,
    /// Runner script; the bundled script is used when `None`.
    pub runner: Option<PathBuf>,
    /// Name of the model's motion input.
    pub input_name: String,
    /// Timeout for one evaluation.
    pub timeout: Duration,
}

impl SubprocessConfig {
    /// Creates a config for the given model file.
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            interpreter: None,
            runner: None,
            input_name: "motion".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the interpreter path.
    pub fn interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(path.into());
        self
    }

    /// Sets the runner script path.
    pub fn runner(mut self, path: impl Into<PathBuf>) -> Self {
        self.runner = Some(path.into());
        self
    }

    /// Sets the model input name.
    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }

    /// Sets the timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Debug, Serialize)]
struct RunnerRequest<'a> {
    model: &'a Path,
    input_name: &'a str,
    motion: [f32; 6],
}

#[derive(Debug, Deserialize)]
struct RunnerResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    force: Vec<f64>,
    #[serde(default)]
    nodes: Vec<f32>,
}

/// A model evaluated by an external runner process.
///
/// The interpreter and runner script are resolved once, at construction, so a
/// missing runtime disables the variant instead of failing every request.
pub struct SubprocessModel {
    name: String,
    config: SubprocessConfig,
    interpreter: PathBuf,
    runner: PathBuf,
    _embedded_runner: Option<tempfile::NamedTempFile>,
}

impl std::fmt::Debug for SubprocessModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubprocessModel")
            .field("name", &self.name)
            .field("interpreter", &self.interpreter)
            .field("runner", &self.runner)
            .finish()
    }
}

impl SubprocessModel {
    /// Resolves the interpreter and runner and checks the model file exists.
    pub fn new(config: SubprocessConfig) -> InferenceResult<Self> {
        if !config.model.exists() {
            return Err(InferenceError::ModelNotFound {
                path: config.model.clone(),
            });
        }
        let interpreter = find_interpreter(config.interpreter.as_deref())?;
        let (runner, embedded) = resolve_runner(config.runner.as_deref())?;
        let name = config
            .model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "subprocess".to_string());

        log::info!(
            "model {} will run via {} {}",
            name,
            interpreter.display(),
            runner.display()
        );

        Ok(Self {
            name,
            config,
            interpreter,
            runner,
            _embedded_runner: embedded,
        })
    }

    pub fn config(&self) -> &SubprocessConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Runs the runner with request and response files in `dir`.
    fn run_in(&self, dir: &Path, input: &ModelInput) -> InferenceResult<RawOutput> {
        let request_path = dir.join("request.json");
        let response_path = dir.join("response.json");

        let request = RunnerRequest {
            model: &self.config.model,
            input_name: &self.config.input_name,
            motion: input.0,
        };
        let request_json = serde_json::to_vec(&request)
            .map_err(|e| InferenceError::WriteRequestFailed(std::io::Error::other(e)))?;
        std::fs::write(&request_path, request_json).map_err(InferenceError::WriteRequestFailed)?;

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.runner)
            .arg("--request")
            .arg(&request_path)
            .arg("--response")
            .arg(&response_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(InferenceError::SpawnFailed)?;
        let (status, stderr) = wait_with_timeout(child, self.config.timeout)?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            return Err(InferenceError::process_failed(exit_code, stderr.trim_end()));
        }

        let content = std::fs::read_to_string(&response_path).map_err(|source| {
            InferenceError::ReadResponseFailed {
                path: response_path.clone(),
                source,
            }
        })?;
        let response: RunnerResponse =
            serde_json::from_str(&content).map_err(InferenceError::ParseResponseFailed)?;

        if !response.ok {
            return Err(InferenceError::evaluation_failed(
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(RawOutput {
            force: response.force,
            nodes: response.nodes,
        })
    }
}

impl InferenceAdapter for SubprocessModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&self, input: &ModelInput) -> InferenceResult<InferenceOutput> {
        let temp_dir = tempfile::tempdir()?;
        let start = Instant::now();
        let raw = self.run_in(temp_dir.path(), input)?;
        log::debug!(
            "model {} evaluated in {:.1} ms",
            self.name,
            start.elapsed().as_secs_f64() * 1000.0
        );
        raw.into_output()
    }
}

/// Finds the interpreter: explicit path, then `BALLNET_PYTHON`, then
/// `python3` or `python` on `PATH`.
pub fn find_interpreter(explicit: Option<&Path>) -> InferenceResult<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if let Ok(found) = which::which(path) {
            return Ok(found);
        }
    }

    if let Ok(path) = std::env::var(PYTHON_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    let names = if cfg!(windows) {
        vec!["python.exe", "python3", "python"]
    } else {
        vec!["python3", "python"]
    };
    for name in names {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }

    Err(InferenceError::InterpreterNotFound)
}

fn resolve_runner(
    explicit: Option<&Path>,
) -> InferenceResult<(PathBuf, Option<tempfile::NamedTempFile>)> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok((path.to_path_buf(), None));
        }
        return Err(InferenceError::RunnerNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = tempfile::Builder::new()
        .prefix("ballnet_onnx_runner_")
        .suffix(".py")
        .tempfile()?;
    file.write_all(EMBEDDED_RUNNER_PY.as_bytes())?;
    file.flush()?;

    Ok((file.path().to_path_buf(), Some(file)))
}

/// Waits for `child`, killing it after `timeout`. Stderr is drained on a
/// helper thread while waiting, so a runner that writes more than the pipe
/// buffer holds can still exit.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> InferenceResult<(ExitStatus, String)> {
    let drain = child.stderr.take().map(|mut err| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });
    let start = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(InferenceError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InferenceError::SpawnFailed(e));
            }
        }
    };

    let stderr = drain
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    Ok((status, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SubprocessConfig::new("model.onnx")
            .input_name("x")
            .timeout_secs(3)
            .runner("runner.py");
        assert_eq!(config.input_name, "x");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.runner, Some(PathBuf::from("runner.py")));
        assert!(config.interpreter.is_none());
    }

    #[test]
    fn test_missing_model_is_rejected() {
        let err = SubprocessModel::new(SubprocessConfig::new("/nonexistent/model.onnx")).unwrap_err();
        assert!(matches!(err, InferenceError::ModelNotFound { .. }));
    }

    #[test]
    fn test_missing_runner_is_rejected() {
        let err = resolve_runner(Some(Path::new("/nonexistent/runner.py"))).unwrap_err();
        assert!(matches!(err, InferenceError::RunnerNotFound { .. }));
    }

    #[test]
    fn test_embedded_runner_written() {
        let (path, file) = resolve_runner(None).unwrap();
        assert!(file.is_some());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("onnxruntime"));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stderr_does_not_block_exit() {
        let child = Command::new("sh")
            .args(["-c", "head -c 200000 /dev/zero | tr '\\0' w >&2; exit 3"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let (status, stderr) = wait_with_timeout(child, Duration::from_secs(10)).unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(stderr.len(), 200000);
        assert!(stderr.chars().all(|c| c == 'w'));
    }

    #[test]
    fn test_request_shape() {
        let request = RunnerRequest {
            model: Path::new("m.onnx"),
            input_name: "motion",
            motion: [0.0, 1.0, 0.0, 0.0, 0.0, 0.5],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input_name"], "motion");
        assert_eq!(json["motion"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_response_error_parsing() {
        let response: RunnerResponse =
            serde_json::from_str(r#"{"ok": false, "error": "no session"}"#).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("no session"));
        assert!(response.force.is_empty());
    }
}
