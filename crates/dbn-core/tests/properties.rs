//! Property-based tests for structure search, estimation and completion.

use dbn_config::EmConfig;
use dbn_core::{
    fill_missing_values, AttributeDomain, AttributeKind, BayesNet, Dataset, DynamicBayesNet, Edge,
    OptimumBranching, RandomScore, ScoreSearch, ScoringFunction,
};
use dbn_math::categorical;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-9;

fn domains(n: usize, size: usize) -> Vec<AttributeDomain> {
    (0..n)
        .map(|i| {
            let tokens: Vec<String> = (0..size).map(|v| v.to_string()).collect();
            AttributeDomain::with_values(format!("X{}", i), AttributeKind::Nominal, tokens).unwrap()
        })
        .collect()
}

/// Subjects of independent uniform noise, one transition, lag 1.
fn noise(n: usize, size: usize, subjects: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<i64>> = (0..subjects)
        .map(|_| (0..2 * n).map(|_| rng.random_range(0..size as i64)).collect())
        .collect();
    Dataset::from_coded(domains(n, size), 1, &[rows]).unwrap()
}

/// Every acyclic parent assignment over `n` nodes, `None` meaning no parent.
fn assignments(n: usize) -> Vec<Vec<Option<usize>>> {
    let mut out = Vec::new();
    let total = (n + 1).pow(n as u32);
    for mut code in 0..total {
        let mut parent = Vec::with_capacity(n);
        for head in 0..n {
            let choice = code % (n + 1);
            code /= n + 1;
            parent.push(if choice == n || choice == head { None } else { Some(choice) });
        }
        let acyclic = (0..n).all(|start| {
            let mut cur = start;
            for _ in 0..=n {
                match parent[cur] {
                    Some(p) => cur = p,
                    None => return true,
                }
            }
            false
        });
        if acyclic {
            out.push(parent);
        }
    }
    out
}

fn weight_of(matrix: &[Vec<f64>], parent: &[Option<usize>]) -> f64 {
    parent
        .iter()
        .enumerate()
        .filter_map(|(head, p)| p.map(|tail| matrix[head][tail]))
        .sum()
}

fn matrix_strategy(n: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-10.0..10.0f64, n), n)
}

// ============================================================================
// Scoring
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Random scores depend only on the seed and the family.
    #[test]
    fn random_scores_are_repeatable(seed in any::<u64>(), child in 0usize..3, past in 0usize..3) {
        let data = noise(3, 2, 5, 1);
        let a = RandomScore::new(seed);
        let b = RandomScore::new(seed);
        let x = a.evaluate(&data, None, &[past], &[], child);
        prop_assert_eq!(x, b.evaluate(&data, None, &[past], &[], child));
        prop_assert!((-100.0..0.0).contains(&x));
    }
}

// ============================================================================
// Branching optimality (brute force over 4 nodes)
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn forest_branching_is_optimal(matrix in matrix_strategy(4)) {
        let branching = OptimumBranching::new(&matrix, None, false).unwrap();
        let best = assignments(4)
            .iter()
            .map(|p| weight_of(&matrix, p))
            .fold(f64::NEG_INFINITY, f64::max);
        prop_assert!((branching.total_weight() - best).abs() < 1e-6,
            "got {}, best {}", branching.total_weight(), best);
    }

    #[test]
    fn spanning_branching_is_optimal(matrix in matrix_strategy(4)) {
        let branching = OptimumBranching::new(&matrix, None, true).unwrap();
        prop_assert_eq!(branching.edges().len(), 3);
        prop_assert_eq!(branching.roots().len(), 1);
        let best = assignments(4)
            .iter()
            .filter(|p| p.iter().filter(|x| x.is_none()).count() == 1)
            .map(|p| weight_of(&matrix, p))
            .fold(f64::NEG_INFINITY, f64::max);
        prop_assert!((branching.total_weight() - best).abs() < 1e-6,
            "got {}, best {}", branching.total_weight(), best);
    }

    #[test]
    fn forced_root_stays_parentless(matrix in matrix_strategy(4), root in 0usize..4) {
        let branching = OptimumBranching::new(&matrix, Some(root), true).unwrap();
        prop_assert_eq!(branching.parent_of(root), None);
        prop_assert_eq!(branching.roots(), vec![root]);
    }
}

// ============================================================================
// Learned structures
// ============================================================================

fn assert_topological(net: &BayesNet) -> Result<(), TestCaseError> {
    let order = net.topological_order();
    let mut position = vec![usize::MAX; net.num_nodes()];
    for (i, &node) in order.iter().enumerate() {
        position[node] = i;
    }
    prop_assert!(position.iter().all(|&p| p != usize::MAX));
    for node in 0..net.num_nodes() {
        for parent in net.present_parents(node) {
            prop_assert!(position[parent] < position[node]);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn structures_are_acyclic_and_bounded(seed in any::<u64>(), k in 0usize..=3) {
        let data = noise(4, 2, 20, seed);
        let sf = RandomScore::new(seed);
        let mut search = ScoreSearch::new(&data, 1, true);
        search.evaluate(&sf).unwrap();

        let tree = search.to_dbn(None, true, false).unwrap();
        assert_topological(&tree.transitions()[0])?;
        for node in 0..4 {
            prop_assert!(tree.transitions()[0].present_parents(node).len() <= 1);
            prop_assert!(tree.transitions()[0].past_parents(node).len() <= 1);
        }

        for dbn in [
            search.to_bcdbn(&sf, k, None, true, false).unwrap(),
            search.to_cdbn(&sf, k, None, true, false).unwrap(),
        ] {
            let net = &dbn.transitions()[0];
            assert_topological(net)?;
            for node in 0..4 {
                prop_assert!(net.present_parents(node).len() <= k);
            }
        }
    }

    #[test]
    fn learned_cpts_are_normalized(
        seed in any::<u64>(),
        size in 2usize..5,
        weights in prop::collection::vec(0.1..10.0f64, 30),
    ) {
        let unit = noise(3, size, 30, seed);
        let data = Dataset::with_weights(
            unit.attributes().to_vec(),
            1,
            vec![unit.rows(0).to_vec()],
            vec![weights],
        )
        .unwrap();
        let net = BayesNet::new(
            data.attributes(),
            1,
            &[Edge::new(0, 1, 0.0), Edge::new(1, 2, 0.0)],
            &[Edge::new(0, 0, 0.0), Edge::new(2, 1, 0.0)],
        )
        .unwrap();
        let mut dbn = DynamicBayesNet::new(data.attributes().to_vec(), 1, None, vec![net]).unwrap();
        dbn.learn_parameters(&data, true).unwrap();
        for node in 0..3 {
            let cpt = dbn.transitions()[0].cpt(node);
            prop_assert!(!cpt.is_empty());
            for row in cpt.values() {
                prop_assert_eq!(row.len(), size - 1);
                prop_assert!(row.iter().all(|&p| p >= 0.0));
                prop_assert!(row.iter().sum::<f64>() <= 1.0 + TOL);
                prop_assert!(categorical::implicit_last(row) >= 0.0);
                prop_assert!(categorical::complete(row).iter().all(|p| p.is_finite() && *p >= 0.0));
            }
        }
    }

    #[test]
    fn parameter_em_improves_until_it_stops(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = noise(2, 2, 12, seed)
            .generate_missing_values(50.0, 25.0, &mut rng)
            .unwrap();
        let net = BayesNet::new(data.attributes(), 1, &[Edge::new(0, 1, 0.0)], &[Edge::new(1, 1, 0.0)])
            .unwrap();
        let mut dbn = DynamicBayesNet::new(data.attributes().to_vec(), 1, None, vec![net]).unwrap();
        let summary = dbn.parameter_em(&data, true, &EmConfig::default(), &mut rng).unwrap();
        prop_assert!(summary.iterations() >= 1);
        let scores = &summary.scores;
        for pair in scores[..scores.len() - 1].windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn soft_completion_covers_every_assignment(seed in any::<u64>(), gaps in 1usize..=4) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut row: Vec<i64> = (0..4).map(|_| rng.random_range(0..2)).collect();
        for cell in row.iter_mut().take(gaps) {
            *cell = -1;
        }
        let data = Dataset::from_coded(domains(2, 2), 1, &[vec![row]]).unwrap();
        let net = BayesNet::new(data.attributes(), 1, &[Edge::new(1, 0, 0.0)], &[Edge::new(0, 0, 0.0)])
            .unwrap();
        let mut dbn = DynamicBayesNet::new(data.attributes().to_vec(), 1, None, vec![net]).unwrap();
        dbn.generate_parameters(&mut rng);

        let filled = fill_missing_values(&data, &dbn, true, &EmConfig::default()).unwrap();
        prop_assert_eq!(filled.num_subjects(0), 1 << gaps);
        prop_assert!(!filled.has_missing());
        prop_assert!((filled.total_weight(None) - 1.0).abs() < TOL);
    }
}
