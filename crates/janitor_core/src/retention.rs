use std::collections::HashSet;

pub const DEFAULT_VERSIONS_TO_KEEP: usize = 3;

/// Parses raw version tokens into integers and orders them newest-first.
///
/// Version identifiers must be compared numerically; lexical ordering would
/// sort "9" after "10". Tokens that do not parse as version numbers (such as
/// a stray pseudo-version marker) are dropped.
pub fn order_versions_desc<S: AsRef<str>>(tokens: &[S]) -> Vec<u64> {
    let mut versions: Vec<u64> = tokens
        .iter()
        .filter_map(|token| token.as_ref().parse::<u64>().ok())
        .collect();
    versions.sort_unstable_by(|a, b| b.cmp(a));
    versions
}

/// The retention decision: everything past the `keep` most recent versions
/// is eligible, minus any version still referenced by an alias.
///
/// Pure and order-preserving relative to `versions_desc`, so repeated
/// evaluation of the same snapshot yields the same sequence.
pub fn eligible_for_deletion(
    versions_desc: &[u64],
    keep: usize,
    protected: &HashSet<u64>,
) -> Vec<u64> {
    versions_desc
        .iter()
        .skip(keep)
        .filter(|version| !protected.contains(version))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_numeric_not_lexical() {
        let ordered = order_versions_desc(&["9", "10", "100", "2"]);
        assert_eq!(ordered, vec![100, 10, 9, 2]);
    }

    #[test]
    fn ordering_drops_non_numeric_tokens() {
        let ordered = order_versions_desc(&["3", "$LATEST", "1"]);
        assert_eq!(ordered, vec![3, 1]);
    }

    #[test]
    fn eligible_set_drops_the_keep_most_recent() {
        let versions = vec![10, 9, 8, 7, 6, 5, 4];
        let eligible = eligible_for_deletion(&versions, 3, &HashSet::new());
        assert_eq!(eligible, vec![7, 6, 5, 4]);
        assert_eq!(eligible.len(), versions.len() - 3);
    }

    #[test]
    fn eligible_set_is_empty_when_keep_covers_everything() {
        let versions = vec![3, 2, 1];
        assert!(eligible_for_deletion(&versions, 3, &HashSet::new()).is_empty());
        assert!(eligible_for_deletion(&versions, 5, &HashSet::new()).is_empty());
    }

    #[test]
    fn protected_versions_are_never_eligible() {
        let versions = vec![10, 9, 8, 7, 6, 5, 4];
        let protected = HashSet::from([6, 4]);
        let eligible = eligible_for_deletion(&versions, 3, &protected);
        assert_eq!(eligible, vec![7, 5]);
    }

    #[test]
    fn keeps_recent_and_protected_versions_order_preserved() {
        // keep=3 retains 10, 9, 8; version 6 survives through alias protection.
        let versions = vec![10, 9, 8, 7, 6, 5, 4];
        let protected = HashSet::from([6]);
        let eligible = eligible_for_deletion(&versions, 3, &protected);
        assert_eq!(eligible, vec![7, 5, 4]);
    }

    #[test]
    fn evaluation_is_idempotent_on_the_same_snapshot() {
        let versions = vec![42, 17, 9, 3];
        let protected = HashSet::from([9]);
        let first = eligible_for_deletion(&versions, 1, &protected);
        let second = eligible_for_deletion(&versions, 1, &protected);
        assert_eq!(first, second);
    }
}
