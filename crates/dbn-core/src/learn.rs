//! End-to-end pipelines: structure and parameter learning (with structural
//! EM when the data has gaps) and synthetic model generation.

use std::time::Instant;

use dbn_config::{GenerateConfig, LearnConfig, MAX_DOMAIN_TOKEN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, info_span};

use crate::attribute::{AttributeDomain, AttributeKind};
use crate::completion::{fill_missing_values, impute_missing_values};
use crate::error::{DbnError, Result};
use crate::logging::{event_names, generate_run_id, Stage};
use crate::network::DynamicBayesNet;
use crate::observations::Dataset;
use crate::scores::ScoreSearch;
use crate::scoring::{scoring_function, RandomScore, ScoringFunction};

/// Result of [`learn`].
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    pub dbn: DynamicBayesNet,
    /// Hard completion of the input; only set when the input had gaps.
    pub imputed: Option<Dataset>,
    /// Structural EM iterations; 0 for complete data.
    pub iterations: usize,
    /// Score of the final model on the (completed) training data.
    pub score: f64,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Learn a model from `dataset` as configured.
pub fn learn(dataset: &Dataset, config: &LearnConfig) -> Result<LearnOutcome> {
    config.validate()?;
    if dataset.markov_lag() != config.markov_lag {
        return Err(DbnError::AttributeMismatch(format!(
            "dataset has Markov lag {}, configuration asks for {}",
            dataset.markov_lag(),
            config.markov_lag
        )));
    }
    let run_id = generate_run_id();
    let span = info_span!("learn", run_id = %run_id);
    let _guard = span.enter();

    let start = Instant::now();
    let missing = dataset.has_missing();
    info!(
        event = event_names::LEARN_STARTED,
        stage = %Stage::Init,
        attributes = dataset.num_attributes(),
        transitions = dataset.num_transitions(),
        markov_lag = dataset.markov_lag(),
        scoring = config.scoring.as_str(),
        structure = config.structure.as_str(),
        missing,
        "learning started"
    );

    let mut rng = seeded_rng(config.seed);
    let sf = scoring_function(config.scoring, config.seed);
    let outcome = if missing {
        structural_em(dataset, config, sf.as_ref(), &mut rng)?
    } else {
        let mut search = search_for(dataset, config);
        search.evaluate(sf.as_ref())?;
        let mut dbn = search.to_network(config, sf.as_ref())?;
        dbn.learn_parameters(dataset, config.stationary)?;
        let score = dbn.score(dataset, sf.as_ref(), config.stationary)?;
        LearnOutcome {
            dbn,
            imputed: None,
            iterations: 0,
            score,
        }
    };

    info!(
        event = event_names::LEARN_FINISHED,
        iterations = outcome.iterations,
        score = outcome.score,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "learning finished"
    );
    Ok(outcome)
}

fn search_for<'a>(dataset: &'a Dataset, config: &LearnConfig) -> ScoreSearch<'a> {
    ScoreSearch::new(dataset, config.max_parents, config.stationary).with_threads(config.threads)
}

/// Start from a randomly scored structure, then alternate parameter EM,
/// soft completion and a fresh structure search on the completed data.
/// The rebuilt model is kept each round; the loop ends on the first round
/// whose rebuilt model does not beat the model it replaced.
fn structural_em<S: ScoringFunction + ?Sized>(
    dataset: &Dataset,
    config: &LearnConfig,
    sf: &S,
    rng: &mut StdRng,
) -> Result<LearnOutcome> {
    let stationary = config.stationary;
    let random = RandomScore::from_rng(rng);
    let mut search = search_for(dataset, config);
    search.evaluate(&random)?;
    let mut dbn = search.to_network(config, &random)?;
    dbn.generate_parameters(rng);

    let mut iterations = 0;
    let score = loop {
        iterations += 1;
        let em = dbn.parameter_em(dataset, stationary, &config.em, rng)?;
        let filled = fill_missing_values(dataset, &dbn, stationary, &config.em)?;
        let previous = dbn.score(&filled, sf, stationary)?;

        let mut search = search_for(&filled, config);
        search.evaluate(sf)?;
        dbn = search.to_network(config, sf)?;
        dbn.learn_parameters(&filled, stationary)?;
        let score = dbn.score(&filled, sf, stationary)?;

        info!(
            event = event_names::STRUCTURAL_EM_STEP,
            stage = %Stage::Estimate,
            iteration = iterations,
            parameter_em_iterations = em.iterations(),
            score,
            previous,
            "structural EM step"
        );
        if score <= previous || iterations >= config.em.max_iterations {
            break score;
        }
    };

    let imputed = impute_missing_values(
        dataset,
        &dbn,
        stationary,
        &config.em,
        config.em.impute_most_probable,
        rng,
    )?;
    Ok(LearnOutcome {
        dbn,
        imputed: Some(imputed),
        iterations,
        score,
    })
}

/// Numeric domains of `size` distinct tokens drawn from `1..=MAX_DOMAIN_TOKEN`.
pub fn random_domains<R: Rng + ?Sized>(
    num_attributes: usize,
    size: usize,
    rng: &mut R,
) -> Result<Vec<AttributeDomain>> {
    (0..num_attributes)
        .map(|i| {
            let tokens = rand::seq::index::sample(&mut *rng, MAX_DOMAIN_TOKEN, size)
                .into_iter()
                .map(|v| (v + 1).to_string());
            AttributeDomain::with_values(format!("X{}", i + 1), AttributeKind::Numeric, tokens)
        })
        .collect()
}

/// A random stationary model with an initial network, and subjects
/// sampled from it.
pub fn generate(config: &GenerateConfig) -> Result<(DynamicBayesNet, Dataset)> {
    config.validate()?;
    let mut rng = seeded_rng(config.seed);

    let attributes = random_domains(config.num_attributes, config.domain_size, &mut rng)?;
    let shell = Dataset::empty(attributes, config.markov_lag);
    let sf = RandomScore::from_rng(&mut rng);
    let mut search = ScoreSearch::new(&shell, config.max_parents, true);
    search.evaluate(&sf)?;

    let mut dbn = search.to_dbn(None, true, true)?;
    dbn.generate_parameters(&mut rng);
    let observations = dbn.generate_observations(
        config.num_subjects,
        config.num_transitions,
        true,
        false,
        &mut rng,
    )?;
    Ok((dbn, observations))
}
