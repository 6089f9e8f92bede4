//! Log-weight normalisation for posterior bookkeeping.

/// Turn unnormalized log-weights into probabilities that sum to one.
///
/// The maximum is subtracted before exponentiating. An entry whose
/// log-weight falls more than `ln(tolerance) - ln(len)` below the maximum
/// is set to exactly zero; the survivors are renormalized.
///
/// Returns `None` when there is no finite maximum (empty input, NaN, or
/// every entry is -inf), i.e. when no entry carries any probability mass.
pub fn relative_weights(log_weights: &[f64], tolerance: f64) -> Option<Vec<f64>> {
    if log_weights.is_empty() || log_weights.iter().any(|v| v.is_nan()) {
        return None;
    }
    let max = log_weights
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }

    let cutoff = tolerance.ln() - (log_weights.len() as f64).ln();
    let mut weights: Vec<f64> = log_weights
        .iter()
        .map(|lw| {
            let shifted = lw - max;
            if shifted >= cutoff {
                shifted.exp()
            } else {
                0.0
            }
        })
        .collect();

    // the maximum itself always survives with weight 1
    let total: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    Some(weights)
}

/// Index of the largest log-weight; the first one wins ties.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.is_none_or(|b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}
