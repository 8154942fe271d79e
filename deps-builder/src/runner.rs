//! External tool invocations
//!
//! Every build tool is run through the `Execute` trait so the orchestrator
//! can be exercised without MSBuild, nmake or cmake on the machine.
//! Working directories are explicit per invocation; the process-wide
//! current directory and environment are never changed.

use crate::error::{BuildError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory, relative to the base passed to `Execute::run`.
    pub cwd: PathBuf,
    /// Environment overrides for this invocation only.
    pub env: Vec<(String, String)>,
    /// A non-zero exit is logged and the recipe continues.
    #[serde(default)]
    pub tolerate_failure: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: PathBuf::new(),
            env: Vec::new(),
            tolerate_failure: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn tolerate_failure(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }

    /// Human-readable command line, for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    pub fn resolve_cwd(&self, base: &Path) -> PathBuf {
        if self.cwd.as_os_str().is_empty() {
            base.to_path_buf()
        } else {
            base.join(&self.cwd)
        }
    }
}

/// Runs external tools.
#[async_trait]
pub trait Execute: Send + Sync {
    /// Run to completion. A non-zero exit status is an error.
    async fn run(&self, invocation: &Invocation, base: &Path) -> Result<()>;
}

/// Real process runner. Output is inherited, so the tool's own console
/// output shows up next to the log lines.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl Execute for ProcessRunner {
    async fn run(&self, invocation: &Invocation, base: &Path) -> Result<()> {
        let cwd = invocation.resolve_cwd(base);
        info!("Running `{}` in {}", invocation.command_line(), cwd.display());

        let mut command = tokio::process::Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&cwd);
        for (key, value) in &invocation.env {
            debug!("  env {}={}", key, value);
            command.env(key, value);
        }

        let status = command.status().await.map_err(|source| BuildError::Spawn {
            program: invocation.program.clone(),
            cwd: cwd.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::ToolFailed {
                program: invocation.program.clone(),
                cwd,
                code: status.code(),
            })
        }
    }
}
