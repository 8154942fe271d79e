//! Report rendering

use crate::score::{Contributor, Ranking};
use serde::Serialize;
use std::fmt::Write;

pub const ACTIVE_HEADER: &str = "\n--- Active contributors:\n\n";
pub const PREVIOUS_HEADER: &str = "\n--- Previous contributors:\n\n";
pub const CUTOFF_MARKER: &str = "\n-- (contributors below the cutoff threshold) --\n\n";

fn push_line(out: &mut String, c: &Contributor) {
    let _ = writeln!(out, "{}\t{}", c.points, c.author);
}

/// Plain-text report; the cutoff marker precedes the first previous
/// contributor scoring below `previous_cutoff`.
pub fn render_text(ranking: &Ranking, previous_cutoff: u32) -> String {
    let mut out = String::from(ACTIVE_HEADER);
    for c in &ranking.active {
        push_line(&mut out, c);
    }

    out.push_str(PREVIOUS_HEADER);
    let mut marked = false;
    for c in &ranking.previous {
        if !marked && c.points < previous_cutoff {
            out.push_str(CUTOFF_MARKER);
            marked = true;
        }
        push_line(&mut out, c);
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    active_cutoff: u32,
    previous_cutoff: u32,
    active: &'a [Contributor],
    previous: &'a [Contributor],
}

/// The same ranking as JSON.
pub fn render_json(ranking: &Ranking, active_cutoff: u32, previous_cutoff: u32) -> String {
    let report = JsonReport {
        active_cutoff,
        previous_cutoff,
        active: &ranking.active,
        previous: &ranking.previous,
    };
    serde_json::to_string_pretty(&report).unwrap_or_default()
}
