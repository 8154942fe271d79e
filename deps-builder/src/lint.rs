//! Static-analysis wrapper
//!
//! Runs a linter (cppcheck by default) over the C/C++ sources of a tree,
//! directing its report into a log file and echoing that log while the
//! linter runs.

use crate::error::{BuildError, Result};
use fm_core::{LogTail, LogWatcher};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::Duration;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extensions treated as C/C++ sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hpp"];

#[derive(Debug, Clone)]
pub struct LintConfig {
    pub source_root: PathBuf,
    pub log_file: PathBuf,
    pub linter: String,
    /// Prefix for the log-file argument (`--output-file=<log>`)
    pub log_flag: String,
    /// Prefix for a file-list argument; sources are passed directly when `None`
    pub file_list_flag: Option<String>,
    pub extra_args: Vec<String>,
    pub poll_interval: Duration,
}

impl LintConfig {
    pub fn cppcheck(source_root: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            log_file: log_file.into(),
            linter: "cppcheck".to_string(),
            log_flag: "--output-file=".to_string(),
            file_list_flag: Some("--file-list=".to_string()),
            extra_args: vec!["--enable=warning".to_string(), "--quiet".to_string()],
            poll_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSummary {
    pub files: usize,
    pub lines: usize,
    pub exit_code: Option<i32>,
}

/// Kills and reaps the linter if it is still running when dropped, so an
/// early error return never leaves it behind.
#[derive(Debug)]
struct LinterProcess(Child);

impl Drop for LinterProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            debug!("Stopping linter process {}", self.0.id());
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }
}

/// All files under `root` with one of `extensions`, sorted.
pub fn collect_sources(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Run the linter and forward every completed log line to `on_line`.
pub fn run_lint(config: &LintConfig, mut on_line: impl FnMut(&str)) -> Result<LintSummary> {
    let sources = collect_sources(&config.source_root, SOURCE_EXTENSIONS);
    info!(
        "Linting {} files under {}",
        sources.len(),
        config.source_root.display()
    );

    if config.log_file.exists() {
        std::fs::remove_file(&config.log_file)?;
    }

    let mut command = Command::new(&config.linter);
    command.args(&config.extra_args).arg(format!(
        "{}{}",
        config.log_flag,
        config.log_file.display()
    ));
    match &config.file_list_flag {
        Some(flag) => {
            let list = config.log_file.with_extension("files");
            let body: Vec<String> = sources.iter().map(|p| p.display().to_string()).collect();
            std::fs::write(&list, body.join("\n"))?;
            command.arg(format!("{}{}", flag, list.display()));
        }
        None => {
            command.args(&sources);
        }
    }

    let mut child = LinterProcess(command.spawn().map_err(|source| BuildError::Spawn {
        program: config.linter.clone(),
        cwd: std::env::current_dir().unwrap_or_default(),
        source,
    })?);

    let mut tail = LogTail::new(&config.log_file);
    let watcher = LogWatcher::new(&config.log_file, config.poll_interval);
    let mut lines = 0;

    let status = loop {
        for line in tail.poll()? {
            lines += 1;
            on_line(&line);
        }
        if let Some(status) = child.0.try_wait()? {
            break status;
        }
        watcher.wait();
    };

    for line in tail.finish()? {
        lines += 1;
        on_line(&line);
    }
    debug!("{} exited with {:?}", config.linter, status.code());

    Ok(LintSummary {
        files: sources.len(),
        lines,
        exit_code: status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_sources_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("script")).unwrap();
        for name in ["main.cpp", "map.h", "script/lua_api.cpp", "CMakeLists.txt", "README.md"] {
            std::fs::write(src.join(name), "").unwrap();
        }

        let files = collect_sources(&src, SOURCE_EXTENSIONS);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&src).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
        assert!(names.iter().all(|n| !n.ends_with(".txt") && !n.ends_with(".md")));
    }

    #[test]
    fn test_collect_sources_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_sources(&dir.path().join("nope"), SOURCE_EXTENSIONS).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_lint_echoes_log() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("a.cpp"), "int main() {}").unwrap();

        // Stand-in linter: writes two report lines into the log file it is given.
        let script = dir.path().join("fake-lint.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor a in \"$@\"; do case $a in --output-file=*) log=${a#--output-file=};; esac; done\nprintf 'a.cpp:1: warning\\nsummary' > \"$log\"\n",
        )
        .unwrap();

        let mut config = LintConfig::cppcheck(&src, dir.path().join("lint.log"));
        config.linter = "sh".to_string();
        config.extra_args = vec![script.display().to_string()];
        config.poll_interval = Duration::from_millis(20);

        let mut seen = Vec::new();
        let summary = run_lint(&config, |line| seen.push(line.to_string())).unwrap();

        assert_eq!(seen, vec!["a.cpp:1: warning", "summary"]);
        assert_eq!(summary.files, 1);
        assert_eq!(summary.lines, 2);
        assert_eq!(summary.exit_code, Some(0));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dropped_linter_process_is_reaped() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let proc_entry = PathBuf::from(format!("/proc/{}", child.id()));
        assert!(proc_entry.exists());

        drop(LinterProcess(child));
        assert!(!proc_entry.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_log_error_stops_running_linter() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("report.txt");
        std::fs::write(&not_a_dir, "").unwrap();

        // Opening the log fails with ENOTDIR while the linter keeps running
        let mut config = LintConfig::cppcheck(dir.path().join("src"), not_a_dir.join("lint.log"));
        config.linter = "sh".to_string();
        config.extra_args = vec!["-c".to_string(), "sleep 30".to_string()];
        config.file_list_flag = None;

        let started = std::time::Instant::now();
        let err = run_lint(&config, |_| {}).unwrap_err();
        assert!(matches!(err, BuildError::Io(_)));
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn test_missing_linter_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LintConfig::cppcheck(dir.path(), dir.path().join("lint.log"));
        config.linter = "definitely-not-a-linter-xyz".to_string();
        let err = run_lint(&config, |_| {}).unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }
}
