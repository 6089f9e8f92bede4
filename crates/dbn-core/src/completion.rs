//! Missing-data completion under a learned model (the EM E-step).
//!
//! Each subject is treated as one timeline, so a cell shared by
//! overlapping windows is completed once and stays consistent across them.
//! Every completion of a subject's missing cells is scored by the sum of
//! log CPT lookups over all transitions and nodes; the resulting posterior
//! is either emitted as weighted rows (soft) or collapsed to one row
//! (hard).

use dbn_config::EmConfig;
use dbn_math::categorical;
use dbn_math::combinatorics::{checked_product, MixedRadix};
use dbn_math::{argmax, relative_weights};
use rand::Rng;
use tracing::{debug, info};

use crate::error::{DbnError, Result};
use crate::logging::{event_names, Stage};
use crate::network::DynamicBayesNet;
use crate::observations::Dataset;

/// Soft completion: every subject with missing cells is replaced by all of
/// its completions, weighted by posterior probability times the subject's
/// own weight. Complete subjects are kept as they are.
pub fn fill_missing_values(
    dataset: &Dataset,
    dbn: &DynamicBayesNet,
    stationary: bool,
    em: &EmConfig,
) -> Result<Dataset> {
    let num_subjects = dataset.ensure_even_subjects()?;
    if dataset.num_transitions() == 0 {
        return Ok(dataset.clone());
    }

    let mut timelines = Vec::with_capacity(num_subjects);
    let mut weights = Vec::with_capacity(num_subjects);
    let mut completed = 0usize;
    for subject in 0..num_subjects {
        let timeline = dataset.subject_timeline(subject);
        let weight = dataset.weights(0)[subject];
        match posterior(dataset, dbn, stationary, em, subject, &timeline)? {
            None => {
                timelines.push(timeline);
                weights.push(weight);
            }
            Some(completions) => {
                completed += 1;
                for (completion, p) in completions {
                    timelines.push(completion);
                    weights.push(weight * p);
                }
            }
        }
    }

    debug!(
        event = event_names::COMPLETE_FILLED,
        stage = %Stage::Complete,
        subjects = num_subjects,
        completed_subjects = completed,
        rows = timelines.len(),
        "missing values filled"
    );
    Dataset::from_timelines(
        dataset.attributes().to_vec(),
        dataset.markov_lag(),
        &timelines,
        &weights,
    )
}

/// Hard completion: each subject keeps one completion, the most probable
/// one (first on ties) or a posterior draw. Every row has weight 1.
pub fn impute_missing_values<R: Rng + ?Sized>(
    dataset: &Dataset,
    dbn: &DynamicBayesNet,
    stationary: bool,
    em: &EmConfig,
    most_probable: bool,
    rng: &mut R,
) -> Result<Dataset> {
    let num_subjects = dataset.ensure_even_subjects()?;
    if dataset.num_transitions() == 0 {
        return Ok(dataset.clone());
    }

    let mut timelines = Vec::with_capacity(num_subjects);
    let mut imputed = 0usize;
    for subject in 0..num_subjects {
        let timeline = dataset.subject_timeline(subject);
        let chosen = match posterior(dataset, dbn, stationary, em, subject, &timeline)? {
            None => timeline,
            Some(mut completions) => {
                imputed += 1;
                let probabilities: Vec<f64> = completions.iter().map(|(_, p)| *p).collect();
                let index = if most_probable {
                    argmax(&probabilities).unwrap_or(0)
                } else {
                    let u = rng.random::<f64>();
                    probabilities
                        .split_last()
                        .map_or(0, |(_, explicit)| categorical::sample_index(explicit, u))
                };
                completions.swap_remove(index).0
            }
        };
        timelines.push(chosen);
    }

    info!(
        event = event_names::COMPLETE_IMPUTED,
        stage = %Stage::Complete,
        subjects = num_subjects,
        imputed_subjects = imputed,
        most_probable,
        "missing values imputed"
    );
    Dataset::from_timelines(
        dataset.attributes().to_vec(),
        dataset.markov_lag(),
        &timelines,
        &vec![1.0; timelines.len()],
    )
}

/// Completions of one subject's timeline with their posterior
/// probabilities, or `None` when nothing is missing.
fn posterior(
    dataset: &Dataset,
    dbn: &DynamicBayesNet,
    stationary: bool,
    em: &EmConfig,
    subject: usize,
    timeline: &[Option<u32>],
) -> Result<Option<Vec<(Vec<Option<u32>>, f64)>>> {
    let attributes = dataset.attributes();
    let n = attributes.len();
    let missing: Vec<usize> = timeline
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_none())
        .map(|(pos, _)| pos)
        .collect();
    if missing.is_empty() {
        return Ok(None);
    }

    let radices: Vec<usize> = missing.iter().map(|&pos| attributes[pos % n].size()).collect();
    match checked_product(&radices) {
        Some(count) if count <= em.max_completions_per_subject => {}
        count => {
            return Err(DbnError::CompletionLimitExceeded {
                subject,
                combinations: count.map_or_else(
                    || format!("more than {}", usize::MAX),
                    |c| c.to_string(),
                ),
                limit: em.max_completions_per_subject,
            })
        }
    }

    let window_len = dataset.window_len();
    let mut completions = Vec::new();
    let mut log_probabilities = Vec::new();
    let mut odometer = MixedRadix::new(radices);
    while let Some(digits) = odometer.advance() {
        let mut completion = timeline.to_vec();
        for (&pos, &value) in missing.iter().zip(digits) {
            completion[pos] = Some(value as u32);
        }

        let mut log_p = 0.0;
        for t in 0..dataset.num_transitions() {
            let net = dbn.net_for(t, stationary)?;
            let window = &completion[t * n..t * n + window_len];
            let present = &window[window_len - n..];
            for (node, cell) in present.iter().enumerate() {
                let Some(value) = *cell else { continue };
                log_p += net.probability(node, window, value)?.ln();
            }
        }
        completions.push(completion);
        log_probabilities.push(log_p);
    }

    let probabilities = relative_weights(&log_probabilities, em.tolerance)
        .ok_or(DbnError::DegenerateCompletion { subject })?;
    Ok(Some(completions.into_iter().zip(probabilities).collect()))
}
