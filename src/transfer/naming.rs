//! Conflict-free alternative profile names.

/// Strip a trailing `-<digits>` so `work-3` and `work` share the base `work`.
fn base_name(candidate: &str) -> &str {
    match candidate.rsplit_once('-') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => candidate,
    }
}

/// First of `base-1`, `base-2`, ... for which `exists` is false.
///
/// Deterministic for a given `exists`; terminates whenever the taken set is finite.
pub fn alternative_name<F>(candidate: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = base_name(candidate);
    let mut n: u64 = 1;
    loop {
        let name = format!("{}-{}", base, n);
        if !exists(&name) {
            return name;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_free_suffix() {
        let set = taken(&["work"]);
        assert_eq!(alternative_name("work", |n| set.contains(n)), "work-1");

        let set = taken(&["work", "work-1", "work-2"]);
        assert_eq!(alternative_name("work", |n| set.contains(n)), "work-3");
    }

    #[test]
    fn test_numeric_suffix_stripped() {
        let set = taken(&["work", "work-1", "work-2"]);
        assert_eq!(alternative_name("work-2", |n| set.contains(n)), "work-3");
    }

    #[test]
    fn test_non_numeric_suffix_kept() {
        let set = taken(&["team-work"]);
        assert_eq!(alternative_name("team-work", |n| set.contains(n)), "team-work-1");
    }

    #[test]
    fn test_edge_shapes() {
        assert_eq!(base_name("-5"), "-5");
        assert_eq!(base_name("work-"), "work-");
        assert_eq!(base_name("v-1-2"), "v-1");
        assert_eq!(base_name("12"), "12");
    }

    proptest! {
        #[test]
        fn prop_alternative_not_taken_and_deterministic(
            existing in proptest::collection::hash_set("[a-c]{1,2}(-[0-9]{1,2})?", 0..40),
            base in "[a-c]{1,2}(-[0-9]{1,2})?",
        ) {
            let first = alternative_name(&base, |n| existing.contains(n));
            let second = alternative_name(&base, |n| existing.contains(n));

            prop_assert!(!existing.contains(&first));
            prop_assert_eq!(first, second);
        }
    }
}
