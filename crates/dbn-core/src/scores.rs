//! Exhaustive parent-set search and conversion of the resulting score
//! matrices into network structures.
//!
//! For every child `i` the search keeps the best past parent set on its
//! own and the best one given each same-slice parent `j`. The matrix row of
//! `i` holds the marginal gains: `m[i][i] = -best(i)` and
//! `m[i][j] = best(i | j) - best(i)`, which is what the branching step
//! maximizes.

use std::time::Instant;

use dbn_config::{LearnConfig, StructureMode};
use dbn_math::combinatorics::{bounded_subsets, bounded_subsets_of};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::branching::{Edge, OptimumBranching};
use crate::error::{DbnError, Result};
use crate::logging::{event_names, Stage};
use crate::network::{BayesNet, DynamicBayesNet};
use crate::observations::Dataset;
use crate::scoring::ScoringFunction;

/// Search results for one child.
#[derive(Debug, Clone, Default)]
struct NodeScores {
    weights: Vec<f64>,
    best_past: Vec<usize>,
    /// Indexed by same-slice parent; the child's own entry stays empty.
    best_given: Vec<Vec<usize>>,
}

/// Parent-set search over one dataset.
#[derive(Debug)]
pub struct ScoreSearch<'a> {
    dataset: &'a Dataset,
    max_parents: usize,
    stationary: bool,
    threads: usize,
    parent_sets: Vec<Vec<usize>>,
    /// `[matrix][node]`; one matrix when stationary, else one per transition.
    scores: Option<Vec<Vec<NodeScores>>>,
}

impl<'a> ScoreSearch<'a> {
    /// Candidate past parent sets are every subset of the
    /// `markov_lag * n` past slots with at most `max_parents` members,
    /// the empty set first.
    pub fn new(dataset: &'a Dataset, max_parents: usize, stationary: bool) -> Self {
        let past_slots = dataset.markov_lag() * dataset.num_attributes();
        Self {
            dataset,
            max_parents,
            stationary,
            threads: 0,
            parent_sets: bounded_subsets(past_slots, max_parents),
            scores: None,
        }
    }

    /// Worker threads for scoring; 0 uses the global rayon pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn max_parents(&self) -> usize {
        self.max_parents
    }

    pub fn parent_sets(&self) -> &[Vec<usize>] {
        &self.parent_sets
    }

    pub fn is_evaluated(&self) -> bool {
        self.scores.is_some()
    }

    fn in_pool<T, F>(&self, op: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        if self.threads == 0 {
            return Ok(op());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;
        Ok(pool.install(op))
    }

    /// Score every candidate parent set of every node.
    ///
    /// Node rows are split into one contiguous block per worker before any
    /// worker starts; each worker writes only its own block.
    pub fn evaluate<S: ScoringFunction + ?Sized>(&mut self, sf: &S) -> Result<()> {
        let n = self.dataset.num_attributes();
        let matrices = if self.stationary {
            1
        } else {
            self.dataset.num_transitions()
        };
        let workers = if self.threads > 0 {
            self.threads
        } else {
            rayon::current_num_threads()
        };
        let block = n.div_ceil(workers.max(1)).max(1);
        let start = Instant::now();

        info!(
            event = event_names::SCORE_STARTED,
            stage = %Stage::Score,
            scoring = sf.name(),
            nodes = n,
            matrices,
            parent_sets = self.parent_sets.len(),
            workers,
            "scoring parent sets"
        );

        let dataset = self.dataset;
        let parent_sets = &self.parent_sets;
        let mut all = Vec::with_capacity(matrices);
        for t in 0..matrices {
            let transition = (!self.stationary).then_some(t);
            let mut rows = vec![NodeScores::default(); n];
            self.in_pool(|| {
                rows.par_chunks_mut(block)
                    .enumerate()
                    .for_each(|(b, chunk)| {
                        for (offset, row) in chunk.iter_mut().enumerate() {
                            *row = score_node(dataset, parent_sets, sf, transition, b * block + offset);
                        }
                    })
            })?;
            debug!(transition = ?transition, "score matrix filled");
            all.push(rows);
        }

        self.scores = Some(all);
        info!(
            event = event_names::SCORE_FINISHED,
            stage = %Stage::Score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "parent sets scored"
        );
        Ok(())
    }

    fn scores(&self) -> Result<&[Vec<NodeScores>]> {
        self.scores.as_deref().ok_or(DbnError::NotEvaluated)
    }

    fn node(&self, t: usize, node: usize) -> Result<&NodeScores> {
        let scores = self.scores()?;
        let rows = scores.get(t).ok_or(DbnError::TooManyTransitions {
            requested: t + 1,
            available: scores.len(),
        })?;
        rows.get(node).ok_or(DbnError::NodeOutOfRange {
            node,
            num_nodes: rows.len(),
        })
    }

    /// Number of score matrices (1 when stationary).
    pub fn num_matrices(&self) -> Result<usize> {
        Ok(self.scores()?.len())
    }

    /// Gain matrix of transition `t`: row = head, column = tail.
    pub fn matrix(&self, t: usize) -> Result<Vec<Vec<f64>>> {
        let scores = self.scores()?;
        let rows = scores.get(t).ok_or(DbnError::TooManyTransitions {
            requested: t + 1,
            available: scores.len(),
        })?;
        Ok(rows.iter().map(|r| r.weights.clone()).collect())
    }

    /// Best past parent set of `node` without a same-slice parent.
    pub fn best_past(&self, t: usize, node: usize) -> Result<&[usize]> {
        Ok(&self.node(t, node)?.best_past)
    }

    /// Best past parent set of `node` given the same-slice parent `tail`.
    pub fn best_given(&self, t: usize, node: usize, tail: usize) -> Result<&[usize]> {
        let scores = self.node(t, node)?;
        scores
            .best_given
            .get(tail)
            .map(Vec::as_slice)
            .ok_or(DbnError::NodeOutOfRange {
                node: tail,
                num_nodes: scores.best_given.len(),
            })
    }

    /// Tree-augmented DBN: a maximum branching over same-slice edges, and
    /// for each node the past parents that were best alongside its chosen
    /// same-slice parent (or alone, for roots).
    pub fn to_dbn(
        &self,
        root: Option<usize>,
        spanning: bool,
        prior: bool,
    ) -> Result<DynamicBayesNet> {
        let scores = self.scores()?;
        let attributes = self.dataset.attributes();
        let n = attributes.len();

        let mut nets = Vec::with_capacity(scores.len());
        for rows in scores {
            let matrix: Vec<Vec<f64>> = rows.iter().map(|r| r.weights.clone()).collect();
            let branching = OptimumBranching::new(&matrix, root, spanning)?;
            let mut inter = Vec::new();
            for head in 0..n {
                let past = match branching.parent_of(head) {
                    Some(tail) => &rows[head].best_given[tail],
                    None => &rows[head].best_past,
                };
                inter.extend(past.iter().map(|&p| Edge::new(p, head, 0.0)));
            }
            nets.push(BayesNet::new(
                attributes,
                self.dataset.markov_lag(),
                branching.edges(),
                &inter,
            )?);
        }
        self.assemble(nets, prior)
    }

    /// Breadth-first-consistent DBN: the branching is flattened into its
    /// breadth-first chain and every node may take up to `k` same-slice
    /// parents among the nodes before it.
    pub fn to_bcdbn<S: ScoringFunction + ?Sized>(
        &self,
        sf: &S,
        k: usize,
        root: Option<usize>,
        spanning: bool,
        prior: bool,
    ) -> Result<DynamicBayesNet> {
        self.to_bounded(sf, k, root, spanning, prior, true)
    }

    /// Consistent DBN: every node may take up to `k` same-slice parents
    /// among its ancestors in the branching.
    pub fn to_cdbn<S: ScoringFunction + ?Sized>(
        &self,
        sf: &S,
        k: usize,
        root: Option<usize>,
        spanning: bool,
        prior: bool,
    ) -> Result<DynamicBayesNet> {
        self.to_bounded(sf, k, root, spanning, prior, false)
    }

    fn to_bounded<S: ScoringFunction + ?Sized>(
        &self,
        sf: &S,
        k: usize,
        root: Option<usize>,
        spanning: bool,
        prior: bool,
        chain: bool,
    ) -> Result<DynamicBayesNet> {
        let scores = self.scores()?;
        let dataset = self.dataset;
        let parent_sets = &self.parent_sets;
        let n = dataset.num_attributes();

        let mut nets = Vec::with_capacity(scores.len());
        for (t, rows) in scores.iter().enumerate() {
            let transition = (!self.stationary).then_some(t);
            let matrix: Vec<Vec<f64>> = rows.iter().map(|r| r.weights.clone()).collect();
            let branching = OptimumBranching::new(&matrix, root, spanning)?;
            let candidates = if chain {
                branching.breadth_first_chain()
            } else {
                branching
            };

            let choices: Vec<(Vec<usize>, Vec<usize>)> = self.in_pool(|| {
                (0..n)
                    .into_par_iter()
                    .map(|i| {
                        best_bounded(
                            dataset,
                            parent_sets,
                            sf,
                            transition,
                            &candidates.ancestors(i),
                            k,
                            i,
                        )
                    })
                    .collect()
            })?;

            let mut intra = Vec::new();
            let mut inter = Vec::new();
            for (head, (past, present)) in choices.into_iter().enumerate() {
                intra.extend(present.into_iter().map(|tail| Edge::new(tail, head, 0.0)));
                inter.extend(past.into_iter().map(|tail| Edge::new(tail, head, 0.0)));
            }
            debug!(
                event = event_names::BRANCH_BUILT,
                stage = %Stage::Branch,
                transition = ?transition,
                intra_edges = intra.len(),
                max_in_degree = k,
                chain,
                "bounded in-degree structure built"
            );
            nets.push(BayesNet::new(
                dataset.attributes(),
                dataset.markov_lag(),
                &intra,
                &inter,
            )?);
        }
        self.assemble(nets, prior)
    }

    /// Structure in the mode named by `config`.
    pub fn to_network<S: ScoringFunction + ?Sized>(
        &self,
        config: &LearnConfig,
        sf: &S,
    ) -> Result<DynamicBayesNet> {
        match config.structure {
            StructureMode::Tree => self.to_dbn(config.root, config.spanning, config.prior),
            StructureMode::Bcdbn => self.to_bcdbn(
                sf,
                config.intra_in_degree,
                config.root,
                config.spanning,
                config.prior,
            ),
            StructureMode::Cdbn => self.to_cdbn(
                sf,
                config.intra_in_degree,
                config.root,
                config.spanning,
                config.prior,
            ),
        }
    }

    fn assemble(&self, nets: Vec<BayesNet>, prior: bool) -> Result<DynamicBayesNet> {
        let attributes = self.dataset.attributes();
        let initial = if prior {
            Some(BayesNet::new(attributes, 0, &[], &[])?)
        } else {
            None
        };
        DynamicBayesNet::new(
            attributes.to_vec(),
            self.dataset.markov_lag(),
            initial,
            nets,
        )
    }
}

fn score_node<S: ScoringFunction + ?Sized>(
    dataset: &Dataset,
    parent_sets: &[Vec<usize>],
    sf: &S,
    transition: Option<usize>,
    child: usize,
) -> NodeScores {
    let n = dataset.num_attributes();
    let mut best_past_score = f64::NEG_INFINITY;
    let mut best_past = Vec::new();
    let mut best_given_score = vec![f64::NEG_INFINITY; n];
    let mut best_given = vec![Vec::new(); n];

    for parents in parent_sets {
        let score = sf.evaluate(dataset, transition, parents, &[], child);
        if score > best_past_score {
            best_past_score = score;
            best_past = parents.clone();
        }
        for j in (0..n).filter(|&j| j != child) {
            let score = sf.evaluate(dataset, transition, parents, &[j], child);
            if score > best_given_score[j] {
                best_given_score[j] = score;
                best_given[j] = parents.clone();
            }
        }
    }

    let weights = (0..n)
        .map(|j| {
            if j == child {
                -best_past_score
            } else {
                best_given_score[j] - best_past_score
            }
        })
        .collect();
    NodeScores {
        weights,
        best_past,
        best_given,
    }
}

/// Jointly best past parent set and same-slice parent set (at most `k`
/// members drawn from `ancestors`) for `child`.
fn best_bounded<S: ScoringFunction + ?Sized>(
    dataset: &Dataset,
    parent_sets: &[Vec<usize>],
    sf: &S,
    transition: Option<usize>,
    ancestors: &[usize],
    k: usize,
    child: usize,
) -> (Vec<usize>, Vec<usize>) {
    let present_sets = bounded_subsets_of(ancestors, k);
    let mut best = f64::NEG_INFINITY;
    let mut choice = (Vec::new(), Vec::new());
    for past in parent_sets {
        for present in &present_sets {
            let score = sf.evaluate(dataset, transition, past, present, child);
            if score > best {
                best = score;
                choice = (past.clone(), present.clone());
            }
        }
    }
    choice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeDomain, AttributeKind};
    use crate::scoring::{Ll, Mdl, RandomScore};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn binary(n: usize) -> Vec<AttributeDomain> {
        (0..n)
            .map(|i| {
                AttributeDomain::with_values(format!("X{}", i), AttributeKind::Nominal, ["0", "1"])
                    .unwrap()
            })
            .collect()
    }

    /// X0 persists with noise, X1 copies X0 within the slice, X2 is noise.
    fn coupled(subjects: usize, seed: u64) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rows = Vec::with_capacity(subjects);
        for _ in 0..subjects {
            let past: Vec<i64> = (0..3).map(|_| rng.random_range(0..2)).collect();
            let x0 = if rng.random::<f64>() < 0.9 { past[0] } else { 1 - past[0] };
            let x1 = if rng.random::<f64>() < 0.95 { x0 } else { 1 - x0 };
            let x2 = rng.random_range(0..2);
            rows.push(vec![past[0], past[1], past[2], x0, x1, x2]);
        }
        Dataset::from_coded(binary(3), 1, &[rows]).unwrap()
    }

    #[test]
    fn unevaluated_search_cannot_build_networks() {
        let data = coupled(10, 1);
        let search = ScoreSearch::new(&data, 1, true);
        assert!(matches!(
            search.to_dbn(None, true, false),
            Err(DbnError::NotEvaluated)
        ));
        assert!(matches!(search.matrix(0), Err(DbnError::NotEvaluated)));
    }

    #[test]
    fn matrix_holds_marginal_gains() {
        let data = coupled(200, 2);
        let mut search = ScoreSearch::new(&data, 1, true);
        search.evaluate(&Ll).unwrap();
        let m = search.matrix(0).unwrap();
        let alone = Ll.evaluate(&data, None, search.best_past(0, 1).unwrap(), &[], 1);
        assert!((m[1][1] + alone).abs() < 1e-9);
        let given = Ll.evaluate(&data, None, search.best_given(0, 1, 0).unwrap(), &[0], 1);
        assert!((m[1][0] - (given - alone)).abs() < 1e-9);
        assert_eq!(search.best_past(0, 0).unwrap(), &[0]);
    }

    #[test]
    fn tree_recovers_planted_structure() {
        let data = coupled(500, 3);
        let mut search = ScoreSearch::new(&data, 1, true);
        search.evaluate(&Mdl::new()).unwrap();
        let dbn = search.to_dbn(None, true, true).unwrap();
        let net = &dbn.transitions()[0];
        assert!(net.present_parents(1) == vec![0] || net.present_parents(0) == vec![1]);
        if net.present_parents(0) != vec![1] {
            assert_eq!(net.past_parents(0), vec![0]);
        }
        assert!(dbn.initial().is_some());
    }

    #[test]
    fn thread_count_does_not_change_scores() {
        let data = coupled(100, 4);
        let mut single = ScoreSearch::new(&data, 2, true).with_threads(1);
        let mut many = ScoreSearch::new(&data, 2, true).with_threads(3);
        single.evaluate(&Ll).unwrap();
        many.evaluate(&Ll).unwrap();
        assert_eq!(single.matrix(0).unwrap(), many.matrix(0).unwrap());
    }

    #[test]
    fn bounded_variants_respect_in_degree() {
        let data = coupled(100, 5);
        let mut search = ScoreSearch::new(&data, 1, true);
        let sf = RandomScore::new(8);
        search.evaluate(&sf).unwrap();
        for k in 0..3 {
            for dbn in [
                search.to_bcdbn(&sf, k, None, true, false).unwrap(),
                search.to_cdbn(&sf, k, None, true, false).unwrap(),
            ] {
                for node in 0..3 {
                    assert!(dbn.transitions()[0].present_parents(node).len() <= k);
                }
            }
        }
    }

    #[test]
    fn non_stationary_search_has_one_matrix_per_transition() {
        let attrs = binary(2);
        let data = Dataset::from_coded(
            attrs,
            1,
            &[vec![vec![0, 1, 0, 1]], vec![vec![0, 1, 1, 0]]],
        )
        .unwrap();
        let mut search = ScoreSearch::new(&data, 1, false);
        search.evaluate(&Ll).unwrap();
        assert_eq!(search.num_matrices().unwrap(), 2);
        let dbn = search.to_dbn(None, true, false).unwrap();
        assert_eq!(dbn.transitions().len(), 2);
    }

    #[test]
    fn config_dispatch_uses_structure_mode() {
        let data = coupled(50, 6);
        let mut search = ScoreSearch::new(&data, 1, true);
        search.evaluate(&Ll).unwrap();
        let config = LearnConfig {
            structure: StructureMode::Cdbn,
            intra_in_degree: 0,
            ..LearnConfig::default()
        };
        let dbn = search.to_network(&config, &Ll).unwrap();
        assert!(dbn.transitions()[0].intra_edges().is_empty());
    }
}
