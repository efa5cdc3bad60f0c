//! strace-backed tracer
//!
//! Runs `<shell> -c <command>` under `strace -f`, capturing file-related
//! syscalls and `exit_group` into a temporary file that is removed once
//! read back.

use super::{RawTrace, Tracer};
use crate::error::{MemoizeError, MemoizeResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Syscall classes recorded by strace
const TRACE_EXPR: &str = "trace=file,exit_group";

/// Tracer that shells out to strace
#[derive(Debug, Clone)]
pub struct StraceTracer {
    program: String,
    shell: String,
}

impl StraceTracer {
    /// Create a tracer using `program` as strace and `shell` to interpret commands
    pub fn new(program: impl Into<String>, shell: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            shell: shell.into(),
        }
    }

    fn tracer_args(&self, capture: &Path, command: &str) -> Vec<String> {
        vec![
            "-f".to_string(),
            "-x".to_string(),
            "-o".to_string(),
            capture.display().to_string(),
            "-e".to_string(),
            TRACE_EXPR.to_string(),
            "--".to_string(),
            self.shell.clone(),
            "-c".to_string(),
            command.to_string(),
        ]
    }
}

impl Default for StraceTracer {
    fn default() -> Self {
        Self::new("strace", "/bin/sh")
    }
}

#[async_trait]
impl Tracer for StraceTracer {
    async fn trace(&self, command: &str) -> MemoizeResult<RawTrace> {
        let capture = NamedTempFile::new()
            .map_err(|e| MemoizeError::io("creating trace capture file", e))?;
        let capture_path = capture.path().to_path_buf();

        info!("Running: {}", command);
        debug!("Trace output captured in {}", capture_path.display());

        let status = Command::new(&self.program)
            .args(self.tracer_args(&capture_path, command))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| MemoizeError::tracer_spawn(&self.program, e))?;

        let bytes = tokio::fs::read(&capture_path)
            .await
            .map_err(|e| MemoizeError::TracerCapture {
                path: capture_path.clone(),
                source: e,
            })?;

        if let Err(e) = capture.close() {
            warn!(
                "Failed to remove trace capture {}: {}",
                capture_path.display(),
                e
            );
        }

        // `-x` hex-escapes non-ASCII strings, so decoding never alters paths
        let lines: Vec<String> = String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect();
        debug!("Captured {} trace lines", lines.len());

        Ok(RawTrace {
            exit_code: exit_code_of(status),
            lines,
        })
    }

    fn tracer_name(&self) -> &str {
        &self.program
    }
}

/// Process exit code, mapping signal deaths to `128 + signal` like a shell
pub(crate) fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
