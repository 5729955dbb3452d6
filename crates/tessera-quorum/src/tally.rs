//! Grouping of gathered responses by equality

/// Group results by equality, most frequent first
///
/// Ties keep first-observed order, so the outcome is deterministic for a
/// fixed completion order. Responses only guarantee `Eq`, hence the linear
/// scan; result sets are bounded by the endpoint count.
pub(crate) fn tally<R: Eq>(results: &[R]) -> Vec<(usize, &R)> {
    let mut groups: Vec<(usize, &R)> = Vec::new();
    for result in results {
        match groups.iter_mut().find(|(_, value)| *value == result) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, result)),
        }
    }
    groups.sort_by(|a, b| b.0.cmp(&a.0));
    groups
}

/// The value reported identically by at least `required` endpoints, if any
pub(crate) fn agreed<R: Clone + Eq>(results: &[R], required: u16) -> Option<R> {
    tally(results)
        .first()
        .filter(|(count, _)| *count >= usize::from(required))
        .map(|(_, value)| (*value).clone())
}

/// Size of the largest agreeing group
pub(crate) fn top_count<R: Eq>(results: &[R]) -> usize {
    tally(results).first().map(|(count, _)| *count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_equal_values() {
        let results = vec![7, 3, 7, 7, 3];
        let groups = tally(&results);
        assert_eq!(groups, vec![(3, &7), (2, &3)]);
    }

    #[test]
    fn test_tally_tie_keeps_first_observed_value_first() {
        let results = vec![1, 2, 1, 2];
        let groups = tally(&results);
        assert_eq!(groups[0], (2, &1));
        assert_eq!(groups[1], (2, &2));
    }

    #[test]
    fn test_tally_empty() {
        let results: Vec<u32> = Vec::new();
        assert!(tally(&results).is_empty());
    }

    #[test]
    fn test_agreed_requires_threshold() {
        let results = vec![5, 5, 9];
        assert_eq!(agreed(&results, 2), Some(5));
        assert_eq!(agreed(&results, 3), None);
    }

    #[test]
    fn test_agreed_on_empty_is_none() {
        let results: Vec<u32> = Vec::new();
        assert_eq!(agreed(&results, 1), None);
    }

    #[test]
    fn test_top_count() {
        assert_eq!(top_count::<u32>(&[]), 0);
        assert_eq!(top_count(&[4, 4, 4, 2]), 3);
        assert_eq!(top_count(&[1, 2, 3]), 1);
    }
}
