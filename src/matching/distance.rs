//! Edit distance scoring between normalized plates

/// Levenshtein distance with unit cost for insert, delete and substitute.
///
/// Case-sensitive; callers pass normalized plates.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows of the DP table are enough.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `distance / max(len(a), len(b))`: 0.0 for identical plates, 1.0 for
/// completely different ones.
///
/// Two empty strings are identical, so their ratio is 0.0 rather than a
/// division by zero.
pub fn distance_ratio(distance: usize, a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    distance as f64 / max_len as f64
}

/// `1 - distance / max(len(a), len(b))`, in `[0, 1]`.
///
/// Empty vs empty is a perfect match (1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    1.0 - distance_ratio(levenshtein(a, b), a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_distances() {
        assert_eq!(levenshtein("B1234XYZ", "B1234XY2"), 1);
        assert_eq!(levenshtein("KITTEN", "SITTING"), 3);
        assert_eq!(levenshtein("", "ABC"), 3);
        assert_eq!(levenshtein("ABC", ""), 3);
        assert_eq!(levenshtein("B1111AA", "B1111AX"), 1);
        assert_eq!(levenshtein("AB", "BA"), 2);
    }

    #[test]
    fn zero_iff_identical() {
        assert_eq!(levenshtein("B1234XYZ", "B1234XYZ"), 0);
        assert_eq!(levenshtein("", ""), 0);
        assert_ne!(levenshtein("B1234XYZ", "B1234XYz"), 0);
    }

    #[test]
    fn is_symmetric() {
        let samples = ["", "A", "B1234XYZ", "B1234XY2", "D9AB", "1234", "XYZB1234"];
        for a in samples {
            for b in samples {
                assert_eq!(levenshtein(a, b), levenshtein(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn similarity_ratio_bounds() {
        assert_eq!(similarity_ratio("B1234XYZ", "B1234XYZ"), 1.0);
        assert_eq!(similarity_ratio("ABCD", "WXYZ"), 0.0);
        assert_eq!(similarity_ratio("B1234XYZ", "B1234XY2"), 1.0 - 1.0 / 8.0);
        assert_eq!(similarity_ratio("ABC", ""), 0.0);
    }

    #[test]
    fn empty_vs_empty_is_a_perfect_match() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(distance_ratio(0, "", ""), 0.0);
    }
}
