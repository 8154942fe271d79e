//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - Patch: every occurrence replaced, absent text leaves input untouched
//! - Patch: applying the same patch twice equals applying it once
//! - BOM: stripping only ever removes a prefix
//! - Build mode: only the literal `debug` selects Debug

use fm_core::{apply_patch, strip_bom, BuildMode, PatchOp};
use proptest::prelude::*;

// ============================================================
// Patch Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_patch_matches_str_replace(
        text in "[a-c]{0,40}",
        search in "[a-c]{1,3}",
        replace in "[x-z]{0,3}",
    ) {
        let op = PatchOp::new(search.clone(), replace.clone());
        let (out, _) = apply_patch(&text, &op);
        prop_assert_eq!(out, text.replace(&search, &replace));
    }

    #[test]
    fn prop_patch_idempotent_when_replacement_is_disjoint(
        text in "[a-c]{0,40}",
        search in "[a-c]{1,3}",
        replace in "[x-z]{0,3}",
    ) {
        let op = PatchOp::new(search, replace);
        let (once, _) = apply_patch(&text, &op);
        let (twice, n) = apply_patch(&once, &op);
        prop_assert_eq!(once, twice);
        prop_assert_eq!(n, 0);
    }

    #[test]
    fn prop_replacement_count_matches_occurrences(
        text in "[a-c]{0,40}",
        search in "[a-c]{1,2}",
    ) {
        let (_, n) = apply_patch(&text, &PatchOp::new(search.clone(), "Z"));
        prop_assert_eq!(n, text.matches(search.as_str()).count());
    }

    #[test]
    fn prop_strip_bom_returns_suffix(text in "\\PC{0,20}") {
        let stripped = strip_bom(&text);
        prop_assert!(text.ends_with(stripped));
    }

    #[test]
    fn prop_text_without_bom_is_unchanged(text in "[a-zA-Z0-9<>]{0,40}") {
        prop_assert_eq!(strip_bom(&text), text.as_str());
    }

    #[test]
    fn prop_only_debug_selects_debug(hint in "[a-zA-Z]{0,8}") {
        let mode = BuildMode::from_cli_hint(Some(&hint));
        prop_assert_eq!(mode == BuildMode::Debug, hint == "debug");
    }
}

#[test]
fn test_bom_prefixed_patch_scenario() {
    // Byte-wise decoded BOM in front of an MSBuild project
    let text = "\u{ef}\u{bb}\u{bf}<PlatformToolset>v110</PlatformToolset>";
    let op = PatchOp::new(
        "<PlatformToolset>v110</PlatformToolset>",
        "<PlatformToolset>v140</PlatformToolset>",
    );
    let (out, n) = apply_patch(text, &op);
    assert_eq!(out, "<PlatformToolset>v140</PlatformToolset>");
    assert_eq!(n, 1);
}
