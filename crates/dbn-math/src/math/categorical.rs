//! Categorical distributions stored without their last probability.
//!
//! A distribution over `k` outcomes is kept as `k - 1` explicit
//! probabilities. The probability of the last outcome is implied as
//! `1 - sum(explicit)`, so a stored vector is valid when every entry is
//! non-negative and the sum does not exceed one.

use rand::Rng;

/// Probability of the last (implicit) outcome.
///
/// Clamped at zero: explicit entries estimated from fractional weights can
/// sum a few ulps past one.
pub fn implicit_last(explicit: &[f64]) -> f64 {
    (1.0 - explicit.iter().sum::<f64>()).max(0.0)
}

/// Probability of `value`; any index past the explicit entries refers to
/// the implicit last outcome.
pub fn probability(explicit: &[f64], value: usize) -> f64 {
    match explicit.get(value) {
        Some(p) => *p,
        None => implicit_last(explicit),
    }
}

/// Expand to all `k` probabilities.
pub fn complete(explicit: &[f64]) -> Vec<f64> {
    let mut full = Vec::with_capacity(explicit.len() + 1);
    full.extend_from_slice(explicit);
    full.push(implicit_last(explicit));
    full
}

/// Draw a distribution over `k` outcomes uniformly from the simplex.
///
/// Stick-breaking: sort `k - 1` uniform draws together with 0 and take the
/// consecutive gaps. Returns the `k - 1` explicit entries.
pub fn stick_breaking<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Vec<f64> {
    match k {
        0 | 1 => Vec::new(),
        2 => vec![rng.random::<f64>()],
        _ => {
            let mut cuts = Vec::with_capacity(k);
            cuts.push(0.0);
            for _ in 0..k - 1 {
                cuts.push(rng.random::<f64>());
            }
            cuts.sort_by(f64::total_cmp);
            cuts.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }
}

/// Most probable outcome.
///
/// Explicit entries are compared with strict `>`, so the lowest index wins
/// a tie. The implicit last outcome is chosen only when its probability is
/// strictly greater than the best explicit one.
pub fn most_probable(explicit: &[f64]) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in explicit.iter().enumerate() {
        if best.is_none_or(|(_, bp)| p > bp) {
            best = Some((i, p));
        }
    }
    match best {
        Some((i, p)) if implicit_last(explicit) <= p => i,
        _ => explicit.len(),
    }
}

/// Cumulative-probability inversion of a uniform draw `u` in `[0, 1)`.
///
/// Returns the first outcome whose cumulative probability reaches `u`; if
/// the explicit mass never does, the implicit last outcome.
pub fn sample_index(explicit: &[f64], u: f64) -> usize {
    let mut accum = 0.0;
    for (i, p) in explicit.iter().enumerate() {
        accum += p;
        if u <= accum {
            return i;
        }
    }
    explicit.len()
}

/// Sample an outcome.
pub fn sample<R: Rng + ?Sized>(explicit: &[f64], rng: &mut R) -> usize {
    sample_index(explicit, rng.random::<f64>())
}

/// Check that explicit entries are non-negative and their completion sums
/// to one within `tol`.
pub fn is_normalized(explicit: &[f64], tol: f64) -> bool {
    explicit.iter().all(|p| *p >= -tol) && explicit.iter().sum::<f64>() <= 1.0 + tol
}
