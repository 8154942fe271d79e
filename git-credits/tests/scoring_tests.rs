//! Scoring Tests
//!
//! Scores an in-memory history through the full pipeline, plus property
//! tests for the invariants that must hold for ALL inputs:
//! - Tiering is monotonically non-decreasing in the line count
//! - No recent-window author survives in the previous list
//! - Denylisted identities never reach the output
//! - Rankings are sorted by descending points

use fm_credits::history::{CommitSource, CommitSummary, NumstatEntry};
use fm_credits::score::{load, rank};
use fm_credits::{
    gather, partition, points_for, render_text, CodeFileFilter, CreditsError, Result,
    ScorerConfig, WindowScore, CODE_FILE_PATTERN, DENYLIST,
};
use proptest::prelude::*;
use std::collections::HashMap;

// ============================================================================
// In-memory history
// ============================================================================

#[derive(Default)]
struct FakeHistory {
    ranges: HashMap<String, Vec<CommitSummary>>,
    stats: HashMap<String, Vec<NumstatEntry>>,
}

impl FakeHistory {
    /// Add a commit to every listed range.
    fn commit(&mut self, ranges: &[&str], hash: &str, author: &str, files: &[(&str, &str)]) {
        for range in ranges {
            self.ranges
                .entry(range.to_string())
                .or_default()
                .push(CommitSummary {
                    hash: hash.to_string(),
                    author: author.to_string(),
                });
        }
        let entries = files
            .iter()
            .map(|(added, path)| NumstatEntry::parse(&format!("{added}\t0\t{path}")).unwrap())
            .collect();
        self.stats.insert(hash.to_string(), entries);
    }
}

impl CommitSource for FakeHistory {
    fn commits(&self, revs: &str) -> Result<Vec<CommitSummary>> {
        Ok(self.ranges.get(revs).cloned().unwrap_or_default())
    }

    fn numstat(&self, hash: &str) -> Result<Vec<NumstatEntry>> {
        Ok(self.stats.get(hash).cloned().unwrap_or_default())
    }
}

fn filter() -> CodeFileFilter {
    CodeFileFilter::new(CODE_FILE_PATTERN).unwrap()
}

fn denylist() -> Vec<String> {
    DENYLIST.iter().map(|s| s.to_string()).collect()
}

const ALICE: &str = "Alice <alice@example.org>";
const BOB: &str = "Bob <bob@example.org>";

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_three_commits_score_eleven() {
    let mut h = FakeHistory::default();
    h.commit(&["HEAD"], "c1", ALICE, &[("50", "src/a.cpp")]);
    h.commit(&["HEAD"], "c2", ALICE, &[("150", "src/b.cpp")]);
    h.commit(&["HEAD"], "c3", ALICE, &[("1300", "src/c.cpp")]);

    let score = load(&h, "HEAD", &filter(), &denylist()).unwrap();
    assert_eq!(score.points.get(ALICE), Some(&11));
    assert_eq!(score.commits, 3);
}

#[test]
fn test_zero_line_commit_counts_but_scores_nothing() {
    let mut h = FakeHistory::default();
    h.commit(&["HEAD"], "c1", BOB, &[("0", "src/a.cpp")]);
    h.commit(&["HEAD"], "c2", BOB, &[("400", "po/de/minetest.po")]);
    h.commit(&["HEAD"], "c3", BOB, &[("-", "textures/logo.png")]);

    let score = load(&h, "HEAD", &filter(), &denylist()).unwrap();
    assert_eq!(score.commits, 3);
    assert!(!score.points.contains_key(BOB));
}

#[test]
fn test_lines_summed_per_commit_before_tiering() {
    let mut h = FakeHistory::default();
    h.commit(
        &["HEAD"],
        "c1",
        ALICE,
        &[("60", "src/a.cpp"), ("60", "src/a.h"), ("5000", "doc/world.pdf")],
    );
    let score = load(&h, "HEAD", &filter(), &denylist()).unwrap();
    // 120 code lines in one commit is tier 2, not two tier-1 commits
    assert_eq!(score.points.get(ALICE), Some(&2));
}

#[test]
fn test_denylisted_bots_are_dropped() {
    let mut h = FakeHistory::default();
    h.commit(&["HEAD"], "c1", "Weblate <42@minetest.ru>", &[("30", "README.md")]);
    h.commit(&["HEAD"], "c2", "updatepo.sh <script@mt>", &[("900", "src/a.cpp")]);
    h.commit(&["HEAD"], "c3", ALICE, &[("1", "src/a.cpp")]);

    let score = load(&h, "HEAD", &filter(), &denylist()).unwrap();
    assert_eq!(score.points.len(), 1);
    assert_eq!(score.commits, 3);
}

#[test]
fn test_gather_end_to_end() {
    let mut h = FakeHistory::default();
    // Alice is active; Bob only contributed long ago
    for i in 0..3 {
        h.commit(&["5.11.0..HEAD", "HEAD"], &format!("a{i}"), ALICE, &[("20", "src/a.cpp")]);
    }
    for i in 0..25 {
        h.commit(&["HEAD"], &format!("b{i}"), BOB, &[("10", "builtin/init.lua")]);
    }
    h.commit(&["HEAD"], "c0", "Carol <carol@example.org>", &[("800", "src/c.cpp")]);

    let config = ScorerConfig {
        min_commits: 29,
        ..ScorerConfig::default()
    };
    let ranking = gather(&h, &config).unwrap();
    assert_eq!(ranking.active.len(), 1);
    assert_eq!(ranking.active[0].author, ALICE);
    assert_eq!(ranking.active[0].points, 3);

    let text = render_text(&ranking, config.previous_cutoff);
    assert_eq!(
        text,
        "\n--- Active contributors:\n\n\
         3\tAlice <alice@example.org>\n\
         \n--- Previous contributors:\n\n\
         25\tBob <bob@example.org>\n\
         \n-- (contributors below the cutoff threshold) --\n\n\
         4\tCarol <carol@example.org>\n"
    );
}

#[test]
fn test_gather_refuses_shallow_history() {
    let mut h = FakeHistory::default();
    h.commit(&["HEAD"], "c1", ALICE, &[("1", "src/a.cpp")]);
    let err = gather(&h, &ScorerConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        CreditsError::ShallowHistory {
            found: 1,
            required: 11000
        }
    ));
}

#[test]
fn test_recent_author_below_cutoff_leaves_previous_list() {
    let mut h = FakeHistory::default();
    h.commit(&["5.11.0..HEAD", "HEAD"], "n1", BOB, &[("5", "src/a.cpp")]);
    for i in 0..30 {
        h.commit(&["HEAD"], &format!("o{i}"), BOB, &[("5", "src/a.cpp")]);
    }
    let config = ScorerConfig {
        min_commits: 1,
        ..ScorerConfig::default()
    };
    let ranking = gather(&h, &config).unwrap();
    assert!(ranking.active.is_empty());
    assert!(ranking.previous.is_empty());
}

// ============================================================================
// Properties
// ============================================================================

fn score_strategy() -> impl Strategy<Value = HashMap<String, u32>> {
    prop::collection::hash_map("[a-f]{1,3}", 1u32..60, 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_tier_monotonic(a in 0u64..5000, b in 0u64..5000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(points_for(lo).unwrap_or(0) <= points_for(hi).unwrap_or(0));
    }

    #[test]
    fn prop_tier_only_zero_is_excluded(lines in 0u64..100_000) {
        prop_assert_eq!(points_for(lines).is_none(), lines == 0);
    }

    #[test]
    fn prop_partition_disjoint(
        recent in score_strategy(),
        all_time in score_strategy(),
        cutoff in 0u32..10,
    ) {
        let recent = WindowScore { points: recent, commits: 0 };
        let all_time = WindowScore { points: all_time, commits: 0 };
        let ranking = partition(&recent, &all_time, cutoff);

        for c in &ranking.previous {
            prop_assert!(!recent.points.contains_key(&c.author));
        }
        prop_assert!(ranking.active.iter().all(|c| c.points >= cutoff));
        prop_assert!(ranking.active.len() + ranking.previous.len()
            <= recent.points.len() + all_time.points.len());
    }

    #[test]
    fn prop_rank_sorted_descending(points in score_strategy()) {
        let ranked = rank(&points);
        prop_assert_eq!(ranked.len(), points.len());
        prop_assert!(ranked.windows(2).all(|w| w[0].points >= w[1].points));
    }

    #[test]
    fn prop_denylist_never_reaches_output(bot in 0usize..4, lines in 1u32..2000) {
        let mut h = FakeHistory::default();
        let added = lines.to_string();
        h.commit(&["5.11.0..HEAD", "HEAD"], "x1", DENYLIST[bot], &[(added.as_str(), "src/a.cpp")]);
        h.commit(&["HEAD"], "x2", ALICE, &[(added.as_str(), "src/a.cpp")]);

        let config = ScorerConfig { min_commits: 0, ..ScorerConfig::default() };
        let ranking = gather(&h, &config).unwrap();
        let text = render_text(&ranking, config.previous_cutoff);
        prop_assert!(!text.contains(DENYLIST[bot]));
        prop_assert!(text.contains(ALICE));
    }
}
