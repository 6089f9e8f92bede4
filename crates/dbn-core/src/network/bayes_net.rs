//! One transition network: parent sets over a window and their CPTs.

use std::collections::HashMap;

use dbn_math::categorical;
use rand::Rng;
use tracing::debug;

use crate::attribute::AttributeDomain;
use crate::branching::Edge;
use crate::configuration::{Configuration, LocalConfiguration};
use crate::error::{DbnError, Result};
use crate::logging::{event_names, Stage};
use crate::observations::Dataset;

/// CPT of one node: masked parent configuration to the explicit
/// probabilities of every child value but the last.
pub type Cpt = HashMap<Configuration, Vec<f64>>;

/// Precision, recall and F1 of recovered parent sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureComparison {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// A Bayesian network over the `n` present-slice nodes of a window with
/// `markov_lag` past slices.
///
/// Parents are window slots: past slots lie in `[0, markov_lag * n)`, a
/// same-slice parent `j` is slot `markov_lag * n + j`.
#[derive(Debug, Clone)]
pub struct BayesNet {
    attributes: Vec<AttributeDomain>,
    markov_lag: usize,
    parents: Vec<Vec<usize>>,
    topological_order: Vec<usize>,
    cpts: Vec<Cpt>,
}

impl BayesNet {
    /// Build the structure from same-slice edges (`intra`, node indices)
    /// and past edges (`inter`, tail is a past slot).
    pub fn new(
        attributes: &[AttributeDomain],
        markov_lag: usize,
        intra: &[Edge],
        inter: &[Edge],
    ) -> Result<Self> {
        let n = attributes.len();
        let present = markov_lag * n;
        let mut parents = vec![Vec::new(); n];
        let mut children = vec![Vec::new(); n];

        for e in intra {
            for node in [e.head, e.tail] {
                if node >= n {
                    return Err(DbnError::NodeOutOfRange { node, num_nodes: n });
                }
            }
            if e.head == e.tail {
                return Err(DbnError::CyclicStructure { node: e.head });
            }
            parents[e.head].push(e.tail + present);
            children[e.tail].push(e.head);
        }
        for e in inter {
            if e.head >= n {
                return Err(DbnError::NodeOutOfRange {
                    node: e.head,
                    num_nodes: n,
                });
            }
            if e.tail >= present {
                return Err(DbnError::NodeOutOfRange {
                    node: e.tail,
                    num_nodes: present,
                });
            }
            parents[e.head].push(e.tail);
        }
        for p in &mut parents {
            p.sort_unstable();
            p.dedup();
        }
        for c in &mut children {
            c.sort_unstable();
            c.dedup();
        }

        let topological_order = topological_sort(&children)?;
        Ok(Self {
            attributes: attributes.to_vec(),
            markov_lag,
            parents,
            topological_order,
            cpts: vec![Cpt::new(); n],
        })
    }

    pub fn attributes(&self) -> &[AttributeDomain] {
        &self.attributes
    }

    pub fn markov_lag(&self) -> usize {
        self.markov_lag
    }

    pub fn num_nodes(&self) -> usize {
        self.attributes.len()
    }

    /// Sorted parent slots of `node`.
    pub fn parents(&self, node: usize) -> &[usize] {
        &self.parents[node]
    }

    /// Parent slots in past slices.
    pub fn past_parents(&self, node: usize) -> Vec<usize> {
        let present = self.markov_lag * self.num_nodes();
        self.parents[node]
            .iter()
            .copied()
            .filter(|&p| p < present)
            .collect()
    }

    /// Same-slice parents as node indices.
    pub fn present_parents(&self, node: usize) -> Vec<usize> {
        let present = self.markov_lag * self.num_nodes();
        self.parents[node]
            .iter()
            .filter(|&&p| p >= present)
            .map(|&p| p - present)
            .collect()
    }

    /// Same-slice edges, heads ascending.
    pub fn intra_edges(&self) -> Vec<Edge> {
        (0..self.num_nodes())
            .flat_map(|head| {
                self.present_parents(head)
                    .into_iter()
                    .map(move |tail| Edge::new(tail, head, 0.0))
            })
            .collect()
    }

    /// Past edges, heads ascending.
    pub fn inter_edges(&self) -> Vec<Edge> {
        (0..self.num_nodes())
            .flat_map(|head| {
                self.past_parents(head)
                    .into_iter()
                    .map(move |tail| Edge::new(tail, head, 0.0))
            })
            .collect()
    }

    pub fn topological_order(&self) -> &[usize] {
        &self.topological_order
    }

    pub fn cpt(&self, node: usize) -> &Cpt {
        &self.cpts[node]
    }

    pub fn has_parameters(&self) -> bool {
        self.cpts.iter().all(|c| !c.is_empty())
    }

    /// Enumerator over `node`'s parent combinations and child values.
    pub fn local_configuration(&self, node: usize) -> LocalConfiguration<'_> {
        LocalConfiguration::new(
            &self.attributes,
            self.markov_lag,
            &self.past_parents(node),
            &self.present_parents(node),
            node,
        )
    }

    /// Draw every CPT row uniformly from the simplex.
    pub fn generate_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut cpts = Vec::with_capacity(self.num_nodes());
        for node in 0..self.num_nodes() {
            let mut config = self.local_configuration(node);
            let child_range = config.child_range();
            let mut cpt = Cpt::new();
            loop {
                cpt.insert(config.key(), categorical::stick_breaking(child_range, rng));
                if !config.next_parents() {
                    break;
                }
            }
            cpts.push(cpt);
        }
        self.cpts = cpts;
    }

    /// Maximum-likelihood CPTs from weighted counts. Parent combinations
    /// never observed get a uniform row.
    pub fn learn_parameters(&mut self, dataset: &Dataset, transition: Option<usize>) -> Result<()> {
        if dataset.attributes() != self.attributes.as_slice() {
            return Err(DbnError::AttributeMismatch(
                "dataset attributes differ from the network's".to_string(),
            ));
        }
        if dataset.markov_lag() != self.markov_lag {
            return Err(DbnError::AttributeMismatch(format!(
                "dataset markov lag {} differs from the network's {}",
                dataset.markov_lag(),
                self.markov_lag
            )));
        }
        if let Some(t) = transition {
            if t >= dataset.num_transitions() {
                return Err(DbnError::TransitionCountMismatch {
                    networks: t + 1,
                    transitions: dataset.num_transitions(),
                });
            }
        }

        let mut cpts = Vec::with_capacity(self.num_nodes());
        let mut unseen = 0usize;
        for node in 0..self.num_nodes() {
            let mut config = self.local_configuration(node);
            let stats = dataset.statistics(config.parent_slots(), config.child_slot(), transition);
            let child_range = config.child_range();
            let mut cpt = Cpt::new();
            loop {
                let parents = config.parent_values();
                let nij = stats.parent_total(&parents);
                let row = if nij == 0.0 {
                    unseen += 1;
                    vec![1.0 / child_range as f64; child_range.saturating_sub(1)]
                } else {
                    (0..child_range.saturating_sub(1) as u32)
                        .map(|k| stats.count(&parents, k) / nij)
                        .collect()
                };
                cpt.insert(config.key(), row);
                if !config.next_parents() {
                    break;
                }
            }
            cpts.push(cpt);
        }
        self.cpts = cpts;
        debug!(
            event = event_names::ESTIMATE_CPT,
            stage = %Stage::Estimate,
            nodes = self.num_nodes(),
            transition = ?transition,
            unseen_parent_combinations = unseen,
            "CPTs estimated"
        );
        Ok(())
    }

    fn key_for(&self, node: usize, window: &[Option<u32>]) -> Configuration {
        let child_slot = self.markov_lag * self.num_nodes() + node;
        let mut slots = vec![None; (self.markov_lag + 1) * self.num_nodes()];
        for &p in &self.parents[node] {
            slots[p] = window.get(p).copied().flatten();
        }
        slots[child_slot] = Some(0);
        Configuration::from_slots(slots)
    }

    /// CPT row of `node` for the parent values found in `window`.
    pub fn parameters(&self, node: usize, window: &[Option<u32>]) -> Result<&[f64]> {
        self.cpts[node]
            .get(&self.key_for(node, window))
            .map(Vec::as_slice)
            .ok_or(DbnError::MissingParameters { node })
    }

    /// `P(node = value | parents)` with parents read from `window`.
    pub fn probability(&self, node: usize, window: &[Option<u32>], value: u32) -> Result<f64> {
        Ok(categorical::probability(
            self.parameters(node, window)?,
            value as usize,
        ))
    }

    /// Sample the present slice given the `markov_lag * n` past values.
    pub fn next_observation<R: Rng + ?Sized>(
        &self,
        past: &[Option<u32>],
        most_probable: bool,
        rng: &mut R,
    ) -> Result<Vec<Option<u32>>> {
        let n = self.num_nodes();
        let present = self.markov_lag * n;
        let mut window = vec![None; present + n];
        let copied = past.len().min(present);
        window[..copied].copy_from_slice(&past[..copied]);

        for &node in &self.topological_order {
            let row = self.parameters(node, &window)?;
            let value = if most_probable {
                categorical::most_probable(row)
            } else {
                categorical::sample(row, rng)
            };
            window[present + node] = Some(value as u32);
        }
        Ok(window.split_off(present))
    }

    /// Compare parent sets against `original`, treating each parent slot as
    /// one predicted edge. Ratios with an empty denominator are 0.
    pub fn compare(&self, original: &BayesNet) -> StructureComparison {
        let mut true_positive = 0usize;
        let mut condition_positive = 0usize;
        let mut test_positive = 0usize;
        for node in 0..self.num_nodes().min(original.num_nodes()) {
            let recovered = &self.parents[node];
            let truth = &original.parents[node];
            true_positive += truth.iter().filter(|p| recovered.contains(p)).count();
            condition_positive += truth.len();
            test_positive += recovered.len();
        }
        let ratio = |a: usize, b: usize| if b == 0 { 0.0 } else { a as f64 / b as f64 };
        let precision = ratio(true_positive, test_positive);
        let recall = ratio(true_positive, condition_positive);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        StructureComparison {
            precision,
            recall,
            f1,
        }
    }
}

/// Reverse depth-first postorder; fails on a cycle.
fn topological_sort(children: &[Vec<usize>]) -> Result<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Open,
        Done,
    }

    fn visit(
        node: usize,
        children: &[Vec<usize>],
        marks: &mut [Mark],
        postorder: &mut Vec<usize>,
    ) -> Result<()> {
        marks[node] = Mark::Open;
        for &child in &children[node] {
            match marks[child] {
                Mark::New => visit(child, children, marks, postorder)?,
                Mark::Open => return Err(DbnError::CyclicStructure { node: child }),
                Mark::Done => {}
            }
        }
        marks[node] = Mark::Done;
        postorder.push(node);
        Ok(())
    }

    let mut marks = vec![Mark::New; children.len()];
    let mut postorder = Vec::with_capacity(children.len());
    for node in 0..children.len() {
        if marks[node] == Mark::New {
            visit(node, children, &mut marks, &mut postorder)?;
        }
    }
    postorder.reverse();
    Ok(postorder)
}
