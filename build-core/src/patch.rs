//! Textual Patch Operations
//!
//! Vendored and generated build files are corrected with exact-text
//! search-and-replace:
//! - Every occurrence of the search text is replaced
//! - Absent search text is a no-op, never an error
//! - A leading byte-order mark is stripped before matching
//! - Files that are not valid UTF-8 are read as Windows-1252
//! - A changed file is written back as UTF-8; an unchanged one is left alone

use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Error type for patch operations
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One literal search-and-replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOp {
    pub search: String,
    pub replace: String,
}

impl PatchOp {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// Result of patching one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    pub replacements: usize,
}

impl PatchOutcome {
    pub fn applied(&self) -> bool {
        self.replacements > 0
    }
}

const BOM: char = '\u{feff}';
/// First byte of a UTF-8 BOM (0xEF) seen as a single decoded character.
const BOM_LEAD: char = '\u{ef}';

/// Drop a leading byte-order mark.
///
/// Handles both the properly decoded U+FEFF and the byte-wise decoding
/// `ï»¿`, where a first character with code point 239 drops three characters.
pub fn strip_bom(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix(BOM) {
        return rest;
    }
    if text.starts_with(BOM_LEAD) {
        return match text.char_indices().nth(3) {
            Some((idx, _)) => &text[idx..],
            None => "",
        };
    }
    text
}

/// Pure patch: strip the BOM, then replace every occurrence of the search
/// text. Returns the new text and the number of replacements made.
pub fn apply_patch(text: &str, op: &PatchOp) -> (String, usize) {
    let text = strip_bom(text);
    if op.search.is_empty() {
        return (text.to_string(), 0);
    }
    let count = text.matches(op.search.as_str()).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (text.replace(op.search.as_str(), &op.replace), count)
}

/// Decode file contents: UTF-8 when valid, otherwise Windows-1252, which
/// maps every byte to a character.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

/// Patch a file in place.
///
/// The file is rewritten as UTF-8 when a replacement was made or a BOM was
/// dropped. Otherwise it is not touched.
pub fn patch_file(path: &Path, op: &PatchOp) -> Result<PatchOutcome, PatchError> {
    info!("PATCHING {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(&bytes);
    let had_bom = strip_bom(&text).len() != text.len();

    let (patched, replacements) = apply_patch(&text, op);
    if replacements == 0 {
        warn!(
            "Search text not found in {}: {:?}",
            path.display(),
            truncate(&op.search, 60)
        );
        if !had_bom {
            return Ok(PatchOutcome { replacements });
        }
    }

    std::fs::write(path, patched.as_bytes()).map_err(|source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(PatchOutcome { replacements })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
