//! Dependency orchestration
//!
//! ## Per-dependency flow
//! ```text
//! deps/<dir> present? ──yes──▶ completion check ──ok──▶ skip
//!        │                            │ stale
//!        no ◀──────── remove dir ◀────┘
//!        ▼
//! download archives → extract → recipe steps → write stamp
//! ```
//! A failure anywhere stops the run; no stamp is written for a
//! dependency whose recipe did not finish.

use crate::catalog::{Dependency, Step};
use crate::error::{BuildError, Result};
use crate::fetch::{archive_path, Acquire};
use crate::layout::Layout;
use crate::runner::Execute;
use fm_core::{patch_file, BuildMode, CompletionCheck};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// Completion marker written into a dependency directory.
pub const STAMP_FILE: &str = ".fm-build-stamp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStamp {
    pub name: String,
    pub version: String,
    pub mode: BuildMode,
}

impl BuildStamp {
    pub fn for_dependency(dep: &Dependency, mode: BuildMode) -> Self {
        Self {
            name: dep.name.clone(),
            version: dep.version.clone(),
            mode,
        }
    }

    pub fn read(dir: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(dir.join(STAMP_FILE)).ok()?;
        serde_json::from_str(&json).ok()
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(STAMP_FILE);
        let stamp_err = |message: String| BuildError::Stamp {
            path: path.clone(),
            message,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| stamp_err(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| stamp_err(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Skipped,
    Acquired,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnsureReport {
    pub acquired: Vec<String>,
    pub skipped: Vec<String>,
}

/// Drives dependency acquisition and the final project build.
pub struct Orchestrator {
    layout: Layout,
    mode: BuildMode,
    completion: CompletionCheck,
    acquire: Arc<dyn Acquire>,
    exec: Arc<dyn Execute>,
}

impl Orchestrator {
    pub fn new(
        layout: Layout,
        mode: BuildMode,
        completion: CompletionCheck,
        acquire: Arc<dyn Acquire>,
        exec: Arc<dyn Execute>,
    ) -> Self {
        Self {
            layout,
            mode,
            completion,
            acquire,
            exec,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Whether `dep` can be skipped as it stands on disk.
    pub fn is_prepared(&self, dep: &Dependency) -> bool {
        let dir = self.layout.dep(&dep.dir_name);
        if !dir.exists() {
            return false;
        }
        match self.completion {
            CompletionCheck::Directory => true,
            CompletionCheck::Stamp => {
                BuildStamp::read(&dir) == Some(BuildStamp::for_dependency(dep, self.mode))
            }
        }
    }

    /// Make sure `dep` is downloaded, unpacked and built.
    pub async fn ensure(&self, dep: &Dependency) -> Result<EnsureOutcome> {
        let dir = self.layout.dep(&dep.dir_name);

        if self.is_prepared(dep) {
            info!("{} {} already prepared, skipping", dep.name, dep.version);
            return Ok(EnsureOutcome::Skipped);
        }
        if dir.exists() {
            match BuildStamp::read(&dir) {
                Some(stamp) => warn!(
                    "{} was built as {} {} ({}), rebuilding",
                    dep.name, stamp.name, stamp.version, stamp.mode
                ),
                None => warn!("{} has no completion stamp, rebuilding", dir.display()),
            }
            tokio::fs::remove_dir_all(&dir).await?;
        }

        let span = info_span!("dependency", name = %dep.name, version = %dep.version);
        async {
            info!("Preparing {} {}", dep.name, dep.version);
            for archive in &dep.archives {
                let dest = archive_path(&self.layout.deps, &archive.file_name);
                if let Some(parent) = dest.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                self.acquire.download(&archive.url, &dest).await?;
                self.acquire
                    .extract(&dest, archive.kind, &self.layout.deps)
                    .await?;
            }

            self.run_steps(&dep.steps, &self.layout.deps).await?;

            if self.completion == CompletionCheck::Stamp {
                BuildStamp::for_dependency(dep, self.mode).write(&dir)?;
            }
            info!("{} {} ready", dep.name, dep.version);
            Ok::<_, BuildError>(EnsureOutcome::Acquired)
        }
        .instrument(span)
        .await
    }

    /// Ensure every dependency in order, stopping at the first failure.
    pub async fn ensure_all(&self, deps: &[Dependency]) -> Result<EnsureReport> {
        tokio::fs::create_dir_all(&self.layout.deps).await?;

        let mut report = EnsureReport::default();
        for dep in deps {
            match self.ensure(dep).await? {
                EnsureOutcome::Acquired => report.acquired.push(dep.name.clone()),
                EnsureOutcome::Skipped => report.skipped.push(dep.name.clone()),
            }
        }
        info!(
            "Dependencies: {} built, {} already prepared",
            report.acquired.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Regenerate and build the main project from a clean `project/`.
    pub async fn build_project(&self, steps: &[Step]) -> Result<()> {
        for stale in [&self.layout.project, &self.layout.install] {
            if stale.exists() {
                info!("Removing {}", stale.display());
                tokio::fs::remove_dir_all(stale).await?;
            }
        }
        tokio::fs::create_dir_all(&self.layout.project).await?;

        self.run_steps(steps, &self.layout.project)
            .instrument(info_span!("project", mode = %self.mode))
            .await
    }

    /// Apply recipe steps with paths and working directories under `base`.
    pub async fn run_steps(&self, steps: &[Step], base: &Path) -> Result<()> {
        for step in steps {
            match step {
                Step::Patch { file, op } => {
                    patch_file(&base.join(file), op)?;
                }
                Step::WriteFile { file, contents } => {
                    info!("Writing {}", file.display());
                    tokio::fs::write(base.join(file), contents).await?;
                }
                Step::Run(invocation) => match self.exec.run(invocation, base).await {
                    Ok(()) => {}
                    Err(BuildError::ToolFailed { program, code, .. })
                        if invocation.tolerate_failure =>
                    {
                        warn!("{} exited with {:?}, continuing", program, code);
                    }
                    Err(e) => return Err(e),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BuildStamp::read(dir.path()), None);

        let stamp = BuildStamp {
            name: "zlib".into(),
            version: "1.2.8".into(),
            mode: BuildMode::Debug,
        };
        stamp.write(dir.path()).unwrap();
        assert_eq!(BuildStamp::read(dir.path()), Some(stamp));
    }

    #[test]
    fn test_garbage_stamp_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STAMP_FILE), "not json").unwrap();
        assert_eq!(BuildStamp::read(dir.path()), None);
    }

    #[test]
    fn test_stamp_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = BuildStamp {
            name: "curl".into(),
            version: "7.34.0".into(),
            mode: BuildMode::Release,
        };
        let err = stamp.write(&dir.path().join("curl-7.34.0")).unwrap_err();
        assert!(matches!(err, BuildError::Stamp { .. }));
    }
}
