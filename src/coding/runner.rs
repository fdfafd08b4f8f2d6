// file: src/coding/runner.rs
// description: runs generated Python in a temporary directory with a timeout

use crate::coding::policy;
use crate::config::CodingConfig;
use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub const SAFE_NOTE: &str = "Execution policy: temporary working directory, time-limited, \
and blocks some risky imports/calls. This is NOT a hardened sandbox.";

const EXIT_BLOCKED: i32 = -1;
const EXIT_TIMED_OUT: i32 = -2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PythonRunResult {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub note: String,
}

impl PythonRunResult {
    fn blocked(reason: String) -> Self {
        Self {
            ok: false,
            stdout: String::new(),
            stderr: reason,
            exit_code: EXIT_BLOCKED,
            note: SAFE_NOTE.to_string(),
        }
    }

    fn timed_out(timeout: Duration) -> Self {
        Self {
            ok: false,
            stdout: String::new(),
            stderr: format!("\nTimed out after {}s.", timeout.as_secs()),
            exit_code: EXIT_TIMED_OUT,
            note: SAFE_NOTE.to_string(),
        }
    }
}

pub struct PythonRunner {
    python: String,
    timeout: Duration,
}

impl PythonRunner {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    pub fn from_config(config: &CodingConfig) -> Self {
        Self::new(&config.python, Duration::from_secs(config.timeout_secs))
    }

    pub async fn run(&self, code: &str) -> Result<PythonRunResult> {
        if let Some(reason) = policy::deny_reason(code) {
            warn!("Generated code rejected: {}", reason);
            return Ok(PythonRunResult::blocked(reason));
        }

        let workdir = tempfile::Builder::new().prefix("agent_exec_").tempdir()?;
        tokio::fs::write(workdir.path().join("main.py"), code).await?;
        debug!("Running {} in {}", self.python, workdir.path().display());

        let child = Command::new(&self.python)
            .args(["-I", "main.py"])
            .current_dir(workdir.path())
            .env_clear()
            .env("PYTHONUNBUFFERED", "1")
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(output) => output.map_err(|e| {
                AgentError::Execution(format!("failed to start {}: {}", self.python, e))
            })?,
            Err(_) => {
                warn!("Python run timed out after {}s", self.timeout.as_secs());
                return Ok(PythonRunResult::timed_out(self.timeout));
            }
        };

        // killed by a signal
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(PythonRunResult {
            ok: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            note: SAFE_NOTE.to_string(),
        })
    }
}
