//! Property-based tests for dbn-math.
//!
//! Uses proptest to verify the weight normalisation, categorical and combinatorial
//! helpers across many random inputs.

use dbn_math::categorical::{
    implicit_last, is_normalized, most_probable, probability, sample_index, stick_breaking,
};
use dbn_math::combinatorics::{
    binomial, bounded_subsets, bounded_subsets_of, k_subsets, MixedRadix,
};
use dbn_math::relative_weights;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// relative_weights properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Surviving weights always sum to one and are non-negative.
    #[test]
    fn relative_weights_sum_to_one(values in prop::collection::vec(-800.0..0.0f64, 1..64)) {
        let w = relative_weights(&values, 1e-5).expect("finite maximum");
        let sum: f64 = w.iter().sum();
        prop_assert!(approx_eq(sum, 1.0, 1e-9), "sum={}", sum);
        prop_assert!(w.iter().all(|x| *x >= 0.0));
    }

    /// A uniform shift of all log-weights leaves the result unchanged.
    #[test]
    fn relative_weights_shift_invariant(
        values in prop::collection::vec(-50.0..0.0f64, 1..16),
        shift in -500.0..500.0f64,
    ) {
        let a = relative_weights(&values, 1e-5).expect("finite");
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
        let b = relative_weights(&shifted, 1e-5).expect("finite");
        for (x, y) in a.iter().zip(&b) {
            prop_assert!(approx_eq(*x, *y, 1e-9));
        }
    }
}

// ============================================================================
// Categorical properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Stick-breaking yields k-1 non-negative entries whose completion sums to one.
    #[test]
    fn stick_breaking_is_a_distribution(k in 1usize..12, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let p = stick_breaking(k, &mut rng);
        prop_assert_eq!(p.len(), k.saturating_sub(1));
        prop_assert!(is_normalized(&p, 1e-12));
        let total: f64 = p.iter().sum::<f64>() + implicit_last(&p);
        prop_assert!(approx_eq(total, 1.0, 1e-12));
    }

    /// Cumulative inversion stays inside the outcome range.
    #[test]
    fn sample_index_in_range(k in 1usize..10, seed in any::<u64>(), u in 0.0..1.0f64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let p = stick_breaking(k, &mut rng);
        prop_assert!(sample_index(&p, u) < k);
    }

    /// Frequencies with an unobserved last outcome never imply negative mass.
    #[test]
    fn implicit_last_from_frequencies(counts in prop::collection::vec(0.1..10.0f64, 1..8)) {
        let total: f64 = counts.iter().sum();
        let p: Vec<f64> = counts.iter().map(|c| c / total).collect();
        prop_assert!(implicit_last(&p) >= 0.0);
        prop_assert!(implicit_last(&p) < 1e-12);
        prop_assert!(probability(&p, counts.len()) >= 0.0);
        prop_assert!(is_normalized(&p, 1e-12));
    }

    /// The most probable outcome has maximal probability.
    #[test]
    fn most_probable_is_maximal(k in 1usize..10, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let p = stick_breaking(k, &mut rng);
        let best = most_probable(&p);
        prop_assert!(best < k);
        for v in 0..k {
            prop_assert!(probability(&p, best) >= probability(&p, v) - 1e-12);
        }
    }
}

// ============================================================================
// Combinatorial properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// k_subsets produces C(n, k) strictly increasing, sorted subsets.
    #[test]
    fn k_subsets_count_and_order(n in 0usize..10, k in 0usize..5) {
        let subsets = k_subsets(n, k);
        prop_assert_eq!(subsets.len() as u64, binomial(n as u64, k as u64));
        for s in &subsets {
            prop_assert!(s.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(s.iter().all(|x| *x < n));
        }
        prop_assert!(subsets.windows(2).all(|w| w[0] < w[1]));
    }

    /// bounded_subsets respects the size bound and starts with the empty set.
    #[test]
    fn bounded_subsets_sizes(n in 0usize..8, max_size in 0usize..4) {
        let subsets = bounded_subsets(n, max_size);
        prop_assert!(subsets[0].is_empty());
        prop_assert!(subsets.iter().all(|s| s.len() <= max_size));
        let expected: u64 = (0..=max_size.min(n)).map(|k| binomial(n as u64, k as u64)).sum();
        prop_assert_eq!(subsets.len() as u64, expected);
    }

    #[test]
    fn bounded_subsets_of_sizes(items in prop::collection::vec(0u32..100, 0..80), max_size in 0usize..3) {
        let subsets = bounded_subsets_of(&items, max_size);
        prop_assert!(subsets[0].is_empty());
        prop_assert!(subsets.windows(2).all(|w| w[0].len() <= w[1].len()));
        prop_assert!(subsets.iter().all(|s| s.len() <= max_size));
        let n = items.len() as u64;
        let expected: u64 = (0..=max_size.min(items.len())).map(|k| binomial(n, k as u64)).sum();
        prop_assert_eq!(subsets.len() as u64, expected);
    }

    /// The odometer visits exactly the product of its radices.
    #[test]
    fn mixed_radix_cardinality(radices in prop::collection::vec(1usize..4, 0..5)) {
        let expected: usize = radices.iter().product();
        let mut odo = MixedRadix::new(radices);
        let mut count = 0;
        while odo.advance().is_some() {
            count += 1;
        }
        prop_assert_eq!(count, expected);
    }
}
