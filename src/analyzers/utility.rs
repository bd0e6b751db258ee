/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes Σ(value × weight) / Σ(weight) over `(value, weight)` pairs.
///
/// Returns `None` when the input is empty, a weight is missing, the weights
/// sum to zero, or the result is not finite.
pub fn weighted_mean(pairs: &[(f64, Option<f64>)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }

    let mut weighted_total = 0.0;
    let mut weight_sum = 0.0;
    for (value, weight) in pairs {
        let weight = (*weight)?;
        weighted_total += value * weight;
        weight_sum += weight;
    }

    if weight_sum == 0.0 {
        return None;
    }
    let avg = weighted_total / weight_sum;
    avg.is_finite().then_some(avg)
}

/// Rounds to 2 decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[10.0, 20.0]), 15.0);
    }

    #[test]
    fn test_weighted_mean() {
        let avg = weighted_mean(&[(10.0, Some(100.0)), (20.0, Some(300.0))]).unwrap();
        assert!((avg - 17.5).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean_failure_cases() {
        assert_eq!(weighted_mean(&[]), None);
        assert_eq!(weighted_mean(&[(10.0, Some(0.0)), (20.0, Some(0.0))]), None);
        assert_eq!(weighted_mean(&[(10.0, Some(5.0)), (20.0, Some(-5.0))]), None);
        assert_eq!(weighted_mean(&[(10.0, Some(1.0)), (20.0, None)]), None);
        assert_eq!(weighted_mean(&[(10.0, Some(f64::NAN))]), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(17.499), 17.5);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_round2_ties_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }
}
