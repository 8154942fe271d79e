use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Added-line counts only count for files matching this suffix pattern.
pub const CODE_FILE_PATTERN: &str =
    r"(\.[ch](pp)?|\.lua|\.md|\.cmake|\.java|\.gradle|Makefile|CMakeLists\.txt)$";

/// Automation identities never credited. Duplicate humans belong in `.mailmap`.
pub const DENYLIST: &[&str] = &[
    "updatepo.sh <script@mt>",
    "Weblate <42@minetest.ru>",
    "import <script@mt>",
    "minetest <minetest@minetest.net>",
];

/// Scorer settings; the defaults reproduce the published credits list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub repo: PathBuf,
    pub output: PathBuf,
    /// Recent window, two minor versions back
    pub active_revs: String,
    /// All-time window
    pub previous_revs: String,
    pub active_cutoff: u32,
    pub previous_cutoff: u32,
    /// All-time commit count below this means a shallow clone
    pub min_commits: usize,
    pub code_pattern: String,
    pub denylist: Vec<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            output: PathBuf::from("results.txt"),
            active_revs: "5.11.0..HEAD".to_string(),
            previous_revs: "HEAD".to_string(),
            active_cutoff: 3,
            previous_cutoff: 21,
            min_commits: 11000,
            code_pattern: CODE_FILE_PATTERN.to_string(),
            denylist: DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScorerConfig {
    /// Read a JSON settings file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
