//! Score normalization and category ranking.

/// Normalize log-space scores into a probability distribution in place.
///
/// The maximum is subtracted before exponentiating, so large negative
/// log-scores do not underflow to an all-zero vector. The order of the
/// scores is unchanged.
pub fn softmax(scores: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return;
    }

    let mut sum = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score;
    }
    for score in scores.iter_mut() {
        *score /= sum;
    }
}

/// Every category as `(category id, score)`, best first. Equal scores are
/// ordered by ascending category id.
pub fn rank(scores: &[f64]) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    // Stable sort: ties keep their ascending id order.
    ranked.sort_by(|x, y| y.1.total_cmp(&x.1));
    ranked
}

/// At most `n` best categories whose score is at least `min_score`.
pub fn rank_top(scores: &[f64], n: usize, min_score: f64) -> Vec<(usize, f64)> {
    let mut ranked = rank(scores);
    ranked.retain(|&(_, score)| score >= min_score);
    ranked.truncate(n);
    ranked
}

/// The best category, ties resolved to the lowest id.
pub fn best(scores: &[f64]) -> Option<(usize, f64)> {
    rank(scores).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one_and_keeps_argmax() {
        let raw = vec![-1200.5, -1190.25, -1300.0];
        let mut normalized = raw.clone();
        softmax(&mut normalized);

        let sum: f64 = normalized.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(best(&raw).unwrap().0, best(&normalized).unwrap().0);
        assert!(normalized.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_rank_ties_by_category_id() {
        let ranked = rank(&[0.25, 0.5, 0.25]);
        assert_eq!(ranked, vec![(1, 0.5), (0, 0.25), (2, 0.25)]);

        assert_eq!(best(&[-3.0, -3.0]), Some((0, -3.0)));
        assert_eq!(best(&[]), None);
    }

    #[test]
    fn test_rank_top_applies_threshold() {
        let scores = [0.6, 0.005, 0.395];
        assert_eq!(rank_top(&scores, 5, 0.01), vec![(0, 0.6), (2, 0.395)]);
        assert_eq!(rank_top(&scores, 1, 0.01), vec![(0, 0.6)]);
        assert!(rank_top(&scores, 3, 0.9).is_empty());
    }
}
