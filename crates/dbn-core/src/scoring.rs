//! Decomposable local scores for a child and a candidate parent set.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use dbn_config::ScoringKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::LocalConfiguration;
use crate::observations::Dataset;

/// A local score for `child` given a parent set.
///
/// `past_slots` are window slots in `[0, markov_lag * n)`; `present_nodes`
/// are node indices in the present slice. `transition = None` scores the
/// pooled counts of every transition.
pub trait ScoringFunction: Send + Sync {
    fn evaluate(
        &self,
        dataset: &Dataset,
        transition: Option<usize>,
        past_slots: &[usize],
        present_nodes: &[usize],
        child: usize,
    ) -> f64;

    fn name(&self) -> &'static str;
}

/// Weighted log-likelihood of the child's maximum-likelihood CPT.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ll;

/// Counts that round to zero at three decimals contribute nothing, so
/// vanishing soft counts from completion do not perturb the score.
fn is_negligible(count: f64) -> bool {
    (count * 1000.0).round() / 1000.0 == 0.0
}

impl ScoringFunction for Ll {
    fn evaluate(
        &self,
        dataset: &Dataset,
        transition: Option<usize>,
        past_slots: &[usize],
        present_nodes: &[usize],
        child: usize,
    ) -> f64 {
        let mut config = LocalConfiguration::new(
            dataset.attributes(),
            dataset.markov_lag(),
            past_slots,
            present_nodes,
            child,
        );
        let stats = dataset.statistics(config.parent_slots(), config.child_slot(), transition);
        let child_range = config.child_range() as u32;

        let mut score = 0.0;
        loop {
            let parents = config.parent_values();
            let nij = stats.parent_total(&parents);
            if nij > 0.0 {
                for k in 0..child_range {
                    let nijk = stats.count(&parents, k);
                    if !is_negligible(nijk) && nijk != nij {
                        score += nijk * (nijk.ln() - nij.ln());
                    }
                }
            }
            if !config.next_parents() {
                break;
            }
        }
        score
    }

    fn name(&self) -> &'static str {
        "ll"
    }
}

/// Minimum description length: an inner score minus
/// `0.5 * ln(N) * free_parameters`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mdl<S = Ll> {
    inner: S,
}

impl Mdl<Ll> {
    pub fn new() -> Self {
        Self { inner: Ll }
    }
}

impl<S: ScoringFunction> Mdl<S> {
    pub fn wrapping(inner: S) -> Self {
        Self { inner }
    }

    /// Complexity penalty for a child with `num_parameters` free
    /// parameters learned from `sample_size` weighted rows.
    pub fn penalty(sample_size: f64, num_parameters: usize) -> f64 {
        0.5 * (sample_size + 1e-10).ln() * num_parameters as f64
    }
}

impl<S: ScoringFunction> ScoringFunction for Mdl<S> {
    fn evaluate(
        &self,
        dataset: &Dataset,
        transition: Option<usize>,
        past_slots: &[usize],
        present_nodes: &[usize],
        child: usize,
    ) -> f64 {
        let ll = self
            .inner
            .evaluate(dataset, transition, past_slots, present_nodes, child);
        let config = LocalConfiguration::new(
            dataset.attributes(),
            dataset.markov_lag(),
            past_slots,
            present_nodes,
            child,
        );
        ll - Self::penalty(dataset.total_weight(transition), config.num_parameters())
    }

    fn name(&self) -> &'static str {
        "mdl"
    }
}

/// Uniform noise in `[-100, 0)`, keyed by the scored parent set.
///
/// The same arguments always produce the same score for a given seed, so
/// repeated searches over the same inputs agree.
#[derive(Debug, Clone, Copy)]
pub struct RandomScore {
    seed: u64,
}

impl RandomScore {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self { seed: rng.random() }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl ScoringFunction for RandomScore {
    fn evaluate(
        &self,
        _dataset: &Dataset,
        transition: Option<usize>,
        past_slots: &[usize],
        present_nodes: &[usize],
        child: usize,
    ) -> f64 {
        let mut past = past_slots.to_vec();
        past.sort_unstable();
        let mut present = present_nodes.to_vec();
        present.sort_unstable();

        let mut hasher = DefaultHasher::new();
        (transition, past, present, child).hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(self.seed ^ hasher.finish());
        rng.random_range(-100.0..0.0)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Build the scoring function named by the configuration.
pub fn scoring_function(kind: ScoringKind, seed: Option<u64>) -> Box<dyn ScoringFunction> {
    match kind {
        ScoringKind::Ll => Box::new(Ll),
        ScoringKind::Mdl => Box::new(Mdl::new()),
        ScoringKind::Random => Box::new(match seed {
            Some(seed) => RandomScore::new(seed),
            None => RandomScore::from_rng(&mut rand::rng()),
        }),
    }
}
