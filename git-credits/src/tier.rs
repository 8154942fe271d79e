//! Point tiers
//!
//! A commit's added-line count maps to a fixed, non-linear point value so
//! that one huge commit cannot outweigh steady contribution.

/// Points for a commit adding `lines` lines to code files.
/// Commits that add nothing score `None` and are not credited.
pub fn points_for(lines: u64) -> Option<u32> {
    match lines {
        0 => None,
        1..=100 => Some(1),
        101..=700 => Some(2),
        701..=1200 => Some(4),
        _ => Some(8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(points_for(0), None);
        assert_eq!(points_for(1), Some(1));
        assert_eq!(points_for(100), Some(1));
        assert_eq!(points_for(101), Some(2));
        assert_eq!(points_for(700), Some(2));
        assert_eq!(points_for(701), Some(4));
        assert_eq!(points_for(1200), Some(4));
        assert_eq!(points_for(1201), Some(8));
        assert_eq!(points_for(u64::MAX), Some(8));
    }
}
