//! Windowed scoring and ranking
//!
//! ## Flow
//! ```text
//! commits(revs) → numstat per commit → code-file lines added → tier points
//!               → per-author totals → denylist removal      = WindowScore
//! recent + all-time WindowScore → partition                  = Ranking
//! ```

use crate::config::ScorerConfig;
use crate::error::{CreditsError, Result};
use crate::history::{CommitSource, NumstatEntry};
use crate::tier::points_for;
use fm_core::TimingSpan;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Matches file names whose added lines count.
#[derive(Debug, Clone)]
pub struct CodeFileFilter {
    regex: Regex,
}

impl CodeFileFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Lines added to code files; binary entries count nothing.
pub fn lines_added(entries: &[NumstatEntry], filter: &CodeFileFilter) -> u64 {
    entries
        .iter()
        .filter(|e| filter.matches(&e.path))
        .filter_map(|e| e.added)
        .sum()
}

/// Accumulated points of one revision window.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowScore {
    pub points: HashMap<String, u32>,
    /// Every replayed commit, credited or not
    pub commits: usize,
}

/// Replay `revs` and score every author.
pub fn load(
    source: &dyn CommitSource,
    revs: &str,
    filter: &CodeFileFilter,
    denylist: &[String],
) -> Result<WindowScore> {
    let _span = TimingSpan::new(revs);
    let mut score = WindowScore::default();

    for commit in source.commits(revs)? {
        let lines = lines_added(&source.numstat(&commit.hash)?, filter);
        score.commits += 1;
        if let Some(points) = points_for(lines) {
            *score.points.entry(commit.author).or_insert(0) += points;
        }
    }
    for author in denylist {
        score.points.remove(author);
    }

    info!(
        "{}: {} commits, {} credited authors",
        revs,
        score.commits,
        score.points.len()
    );
    Ok(score)
}

/// Guard against a shallow clone.
pub fn check_history(all_time: &WindowScore, min_commits: usize) -> Result<()> {
    if all_time.commits < min_commits {
        return Err(CreditsError::ShallowHistory {
            found: all_time.commits,
            required: min_commits,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub author: String,
    pub points: u32,
}

/// Final classification; each author appears in at most one list.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Ranking {
    pub active: Vec<Contributor>,
    pub previous: Vec<Contributor>,
}

/// Descending by points, ties by author.
pub fn rank(points: &HashMap<String, u32>) -> Vec<Contributor> {
    let mut ranked: Vec<Contributor> = points
        .iter()
        .map(|(author, &points)| Contributor {
            author: author.clone(),
            points,
        })
        .collect();
    ranked.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.author.cmp(&b.author)));
    ranked
}

/// Split into active and previous contributors.
///
/// The active list stops below `active_cutoff`. Every author of the recent
/// window is dropped from the previous list, listed as active or not.
pub fn partition(recent: &WindowScore, all_time: &WindowScore, active_cutoff: u32) -> Ranking {
    let active = rank(&recent.points)
        .into_iter()
        .take_while(|c| c.points >= active_cutoff)
        .collect();

    let recent_authors: HashSet<&String> = recent.points.keys().collect();
    let previous = rank(&all_time.points)
        .into_iter()
        .filter(|c| !recent_authors.contains(&c.author))
        .collect();

    Ranking { active, previous }
}

/// Both windows, the history check and the partition.
pub fn gather(source: &dyn CommitSource, config: &ScorerConfig) -> Result<Ranking> {
    let filter = CodeFileFilter::new(&config.code_pattern)?;
    let recent = load(source, &config.active_revs, &filter, &config.denylist)?;
    let all_time = load(source, &config.previous_revs, &filter, &config.denylist)?;
    check_history(&all_time, config.min_commits)?;
    Ok(partition(&recent, &all_time, config.active_cutoff))
}
