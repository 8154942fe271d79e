//! Commit history access
//!
//! `CommitSource` is the seam between scoring and git: the scorer only needs
//! the commit list of a revision range and the per-file numstat of a commit.

use crate::error::{CreditsError, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// One commit of a `git log` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Abbreviated hash
    pub hash: String,
    /// Mail-mapped `Name <email>`
    pub author: String,
}

impl CommitSummary {
    /// Parse a `%h %aN <%aE>` line.
    pub fn parse(line: &str) -> Option<Self> {
        let (hash, author) = line.trim().split_once(' ')?;
        Some(Self {
            hash: hash.to_string(),
            author: author.to_string(),
        })
    }
}

/// One line of `git show --numstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    /// `None` for binary files (`-`)
    pub added: Option<u64>,
    pub deleted: Option<u64>,
    pub path: String,
}

impl NumstatEntry {
    /// Parse `<added> <deleted> <path>`, whitespace separated; the path keeps
    /// any inner whitespace.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (added, rest) = line.split_once(char::is_whitespace)?;
        let (deleted, path) = rest.trim_start().split_once(char::is_whitespace)?;
        let path = path.trim_start();
        if path.is_empty() {
            return None;
        }
        Some(Self {
            added: added.parse().ok(),
            deleted: deleted.parse().ok(),
            path: path.to_string(),
        })
    }
}

/// Read access to a repository's history.
pub trait CommitSource {
    /// Commits in `revs`, most recent first.
    fn commits(&self, revs: &str) -> Result<Vec<CommitSummary>>;

    /// Per-file added/deleted counts of one commit.
    fn numstat(&self, hash: &str) -> Result<Vec<NumstatEntry>>;
}

/// History read through the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(CreditsError::Spawn)?;

        if !output.status.success() {
            return Err(CreditsError::Git {
                args: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommitSource for GitCli {
    fn commits(&self, revs: &str) -> Result<Vec<CommitSummary>> {
        let stdout = self.git(&["log", "--mailmap", "--pretty=format:%h %aN <%aE>", revs])?;
        stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| CommitSummary::parse(l).ok_or_else(|| CreditsError::Malformed(l.to_string())))
            .collect()
    }

    fn numstat(&self, hash: &str) -> Result<Vec<NumstatEntry>> {
        let stdout = self.git(&["show", "--numstat", "--pretty=format:", hash])?;
        stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| NumstatEntry::parse(l).ok_or_else(|| CreditsError::Malformed(l.to_string())))
            .collect()
    }
}
