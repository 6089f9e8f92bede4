//! Dynamic Bayesian networks: an optional initial network plus one
//! transition network per transition (or one shared network when the
//! process is stationary).

use dbn_config::EmConfig;
use rand::Rng;
use tracing::{debug, info};

use super::bayes_net::{BayesNet, StructureComparison};
use crate::attribute::AttributeDomain;
use crate::completion::fill_missing_values;
use crate::error::{DbnError, Result};
use crate::logging::{event_names, Stage};
use crate::observations::Dataset;
use crate::scoring::{Ll, ScoringFunction};

/// Trace of one parameter-EM run.
#[derive(Debug, Clone, PartialEq)]
pub struct EmSummary {
    /// Log-likelihood after each iteration; all but the last are strictly
    /// increasing.
    pub scores: Vec<f64>,
}

impl EmSummary {
    pub fn iterations(&self) -> usize {
        self.scores.len()
    }

    /// Final log-likelihood.
    pub fn score(&self) -> f64 {
        self.scores.last().copied().unwrap_or(f64::NEG_INFINITY)
    }
}

#[derive(Debug, Clone)]
pub struct DynamicBayesNet {
    attributes: Vec<AttributeDomain>,
    markov_lag: usize,
    initial: Option<BayesNet>,
    transitions: Vec<BayesNet>,
}

impl DynamicBayesNet {
    /// Assemble a model. Every transition network must share the
    /// attributes and Markov lag; the initial network has lag 0.
    pub fn new(
        attributes: Vec<AttributeDomain>,
        markov_lag: usize,
        initial: Option<BayesNet>,
        transitions: Vec<BayesNet>,
    ) -> Result<Self> {
        for (t, net) in transitions.iter().enumerate() {
            if net.attributes() != attributes.as_slice() || net.markov_lag() != markov_lag {
                return Err(DbnError::AttributeMismatch(format!(
                    "transition network {} does not match the model's attributes or lag",
                    t
                )));
            }
        }
        if let Some(init) = &initial {
            if init.attributes() != attributes.as_slice() || init.markov_lag() != 0 {
                return Err(DbnError::AttributeMismatch(
                    "initial network must share the attributes and have lag 0".to_string(),
                ));
            }
        }
        Ok(Self {
            attributes,
            markov_lag,
            initial,
            transitions,
        })
    }

    pub fn attributes(&self) -> &[AttributeDomain] {
        &self.attributes
    }

    pub fn markov_lag(&self) -> usize {
        self.markov_lag
    }

    pub fn initial(&self) -> Option<&BayesNet> {
        self.initial.as_ref()
    }

    pub fn transitions(&self) -> &[BayesNet] {
        &self.transitions
    }

    /// Network used for transition `t`.
    pub fn net_for(&self, t: usize, stationary: bool) -> Result<&BayesNet> {
        let index = if stationary { 0 } else { t };
        self.transitions
            .get(index)
            .ok_or(DbnError::TooManyTransitions {
                requested: t + 1,
                available: self.transitions.len(),
            })
    }

    fn ensure_stationary(&self) -> Result<()> {
        match self.transitions.len() {
            1 => Ok(()),
            n => Err(DbnError::StationaryMultipleNets(n)),
        }
    }

    pub fn generate_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Some(init) = &mut self.initial {
            init.generate_parameters(rng);
        }
        for net in &mut self.transitions {
            net.generate_parameters(rng);
        }
    }

    /// Estimate CPTs: the single network from pooled transitions when
    /// stationary, otherwise network `t` from transition `t`.
    pub fn learn_parameters(&mut self, dataset: &Dataset, stationary: bool) -> Result<()> {
        if stationary {
            self.ensure_stationary()?;
            return self.transitions[0].learn_parameters(dataset, None);
        }
        if self.transitions.len() > dataset.num_transitions() {
            return Err(DbnError::TransitionCountMismatch {
                networks: self.transitions.len(),
                transitions: dataset.num_transitions(),
            });
        }
        for (t, net) in self.transitions.iter_mut().enumerate() {
            net.learn_parameters(dataset, Some(t))?;
        }
        Ok(())
    }

    /// Sum of local scores of every node's parent set.
    pub fn score<S: ScoringFunction + ?Sized>(
        &self,
        dataset: &Dataset,
        sf: &S,
        stationary: bool,
    ) -> Result<f64> {
        let mut score = 0.0;
        if stationary {
            self.ensure_stationary()?;
            let net = &self.transitions[0];
            for node in 0..net.num_nodes() {
                score += sf.evaluate(
                    dataset,
                    None,
                    &net.past_parents(node),
                    &net.present_parents(node),
                    node,
                );
            }
            return Ok(score);
        }
        if self.transitions.len() > dataset.num_transitions() {
            return Err(DbnError::TransitionCountMismatch {
                networks: self.transitions.len(),
                transitions: dataset.num_transitions(),
            });
        }
        for (t, net) in self.transitions.iter().enumerate() {
            for node in 0..net.num_nodes() {
                score += sf.evaluate(
                    dataset,
                    Some(t),
                    &net.past_parents(node),
                    &net.present_parents(node),
                    node,
                );
            }
        }
        Ok(score)
    }

    /// Parameter EM: start from random parameters, then alternate soft
    /// completion and re-estimation until the log-likelihood of the
    /// completed data stops increasing (or `max_iterations` is hit).
    pub fn parameter_em<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        stationary: bool,
        em: &EmConfig,
        rng: &mut R,
    ) -> Result<EmSummary> {
        self.generate_parameters(rng);
        let mut scores = Vec::new();
        let mut previous = f64::NEG_INFINITY;
        loop {
            let filled = fill_missing_values(dataset, self, stationary, em)?;
            self.learn_parameters(&filled, stationary)?;
            let score = self.score(&filled, &Ll, stationary)?;
            scores.push(score);
            debug!(
                event = event_names::ESTIMATE_EM_STEP,
                stage = %Stage::Estimate,
                iteration = scores.len(),
                score,
                previous,
                "parameter EM step"
            );
            if score <= previous || scores.len() >= em.max_iterations {
                break;
            }
            previous = score;
        }
        Ok(EmSummary { scores })
    }

    /// Sample `num_subjects` fresh time series. First windows come from the
    /// initial network (`markov_lag` independent draws).
    pub fn generate_observations<R: Rng + ?Sized>(
        &self,
        num_subjects: usize,
        num_transitions: usize,
        stationary: bool,
        most_probable: bool,
        rng: &mut R,
    ) -> Result<Dataset> {
        let init = self.initial.as_ref().ok_or(DbnError::MissingInitialNet)?;
        let mut seeds = Vec::with_capacity(num_subjects);
        for _ in 0..num_subjects {
            let mut past = Vec::with_capacity(self.markov_lag * self.attributes.len());
            for _ in 0..self.markov_lag {
                past.extend(init.next_observation(&[], most_probable, rng)?);
            }
            seeds.push(past);
        }
        let dataset = self.sample_from(&seeds, num_transitions, stationary, most_probable, rng)?;
        info!(
            event = event_names::SAMPLE_GENERATED,
            stage = %Stage::Sample,
            subjects = num_subjects,
            transitions = num_transitions,
            "observations generated"
        );
        Ok(dataset)
    }

    /// Continue every subject of `dataset` from its first window.
    pub fn forecast<R: Rng + ?Sized>(
        &self,
        dataset: &Dataset,
        num_transitions: usize,
        stationary: bool,
        most_probable: bool,
        rng: &mut R,
    ) -> Result<Dataset> {
        if stationary {
            self.ensure_stationary()?;
        }
        if dataset.attributes() != self.attributes.as_slice() {
            return Err(DbnError::AttributeMismatch(
                "forecast dataset attributes differ from the model's".to_string(),
            ));
        }
        let seeds = dataset.first_window_past();
        let forecast = self.sample_from(&seeds, num_transitions, stationary, most_probable, rng)?;
        info!(
            event = event_names::SAMPLE_GENERATED,
            stage = %Stage::Sample,
            subjects = seeds.len(),
            transitions = num_transitions,
            most_probable,
            "forecast generated"
        );
        Ok(forecast)
    }

    fn sample_from<R: Rng + ?Sized>(
        &self,
        seeds: &[Vec<Option<u32>>],
        num_transitions: usize,
        stationary: bool,
        most_probable: bool,
        rng: &mut R,
    ) -> Result<Dataset> {
        let available = self.transitions.len();
        if (!stationary && num_transitions > available) || (num_transitions > 0 && available == 0)
        {
            return Err(DbnError::TooManyTransitions {
                requested: num_transitions,
                available,
            });
        }
        let n = self.attributes.len();
        let past_len = self.markov_lag * n;

        let mut cells = vec![Vec::with_capacity(seeds.len()); num_transitions];
        for (subject, seed) in seeds.iter().enumerate() {
            if seed.len() != past_len {
                return Err(DbnError::RaggedRows {
                    transition: 0,
                    row: subject,
                    expected: past_len,
                    actual: seed.len(),
                });
            }
            let mut past = seed.clone();
            for (t, rows) in cells.iter_mut().enumerate() {
                let net = self.net_for(t, stationary)?;
                let present = net.next_observation(&past, most_probable, rng)?;
                let mut row = past;
                row.extend(present);
                past = row[n..].to_vec();
                rows.push(row);
            }
        }
        Dataset::new(self.attributes.clone(), self.markov_lag, cells)
    }

    /// Structure recovery of the first transition network against
    /// `original`'s.
    pub fn compare(&self, original: &DynamicBayesNet) -> Option<StructureComparison> {
        let recovered = self.transitions.first()?;
        let truth = original.transitions.first()?;
        Some(recovered.compare(truth))
    }
}
