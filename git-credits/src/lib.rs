//! Freeminer Contributor Credits
//!
//! Replays git history over a recent and an all-time window and ranks
//! authors by tiered points earned from lines added to code files:
//! - `history`: commit listing and numstat through the `CommitSource` seam
//! - `tier`: line count to points
//! - `score`: window accumulation, denylist, active/previous partition
//! - `report`: plain-text and JSON rendering

pub mod config;
pub mod error;
pub mod history;
pub mod report;
pub mod score;
pub mod tier;

pub use config::{ScorerConfig, CODE_FILE_PATTERN, DENYLIST};
pub use error::{CreditsError, Result};
pub use history::{CommitSource, CommitSummary, GitCli, NumstatEntry};
pub use report::{render_json, render_text};
pub use score::{gather, partition, CodeFileFilter, Contributor, Ranking, WindowScore};
pub use tier::points_for;
