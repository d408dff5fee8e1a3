//! Main `FairnessCookbook` entry point and builder.

use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::analysis::ReplicateRunner;
use crate::config::{Config, FailurePolicy, Method};
use crate::data::{needs_encoding, CategoricalEncoder, Dataset, IndicatorEncoder, Variables};
use crate::error::{Error, Result};
use crate::estimator::{EffectEstimator, ForestParams, LinearTLearner};
use crate::result::{Decomposition, EffectTable, Metadata, ReplicateEffects, ReplicateFailure};
use crate::statistics::summarize;

/// Main entry point for causal fairness decompositions.
///
/// Use the builder pattern to configure and run a decomposition.
///
/// # Example
///
/// ```
/// use fairness_cookbook::{FairnessCookbook, Measure};
/// use fairness_cookbook::data::{Dataset, Variables};
/// use fairness_cookbook::estimator::LinearTLearner;
///
/// let x: Vec<&str> = (0..40).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
/// let z: Vec<f64> = (0..40).map(|i| (i % 5) as f64).collect();
/// let y: Vec<f64> = (0..40).map(|i| (i % 2) as f64 + 0.1 * (i % 5) as f64).collect();
/// let data = Dataset::new()
///     .with_categorical("x", x)?
///     .with_numeric("z", z)?
///     .with_numeric("y", y)?;
/// let vars = Variables::new("x", "y", "a", "b").mediators(["z"]);
///
/// let result = FairnessCookbook::new(LinearTLearner::new())
///     .nboot1(2)
///     .nboot2(20)
///     .seed(7)
///     .decompose(&data, &vars)?;
///
/// assert!(result.mean(Measure::Tv).is_finite());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FairnessCookbook<E> {
    config: Config,
    estimator: E,
    encoder: Box<dyn CategoricalEncoder>,
}

impl<E: fmt::Debug> fmt::Debug for FairnessCookbook<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairnessCookbook")
            .field("config", &self.config)
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}

impl Default for FairnessCookbook<LinearTLearner> {
    fn default() -> Self {
        Self::new(LinearTLearner::new())
    }
}

impl<E: EffectEstimator> FairnessCookbook<E> {
    /// Create with default configuration.
    pub fn new(estimator: E) -> Self {
        Self {
            config: Config::default(),
            estimator,
            encoder: Box::new(IndicatorEncoder),
        }
    }

    /// Create with defaults overlaid by `FC_*` environment variables.
    ///
    /// See [`Config::from_env`].
    pub fn from_env(estimator: E) -> Self {
        Self::new(estimator).config(Config::from_env())
    }

    /// Create with a fast configuration for exploration and tests.
    ///
    /// Settings:
    /// - 1 outer replicate (the point estimate only)
    /// - 20 inner replicates (vs 100 default)
    pub fn quick(estimator: E) -> Self {
        Self::new(estimator).config(Config {
            nboot1: 1,
            nboot2: 20,
            ..Config::default()
        })
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the number of outer replicates (estimator refits).
    pub fn nboot1(mut self, n: usize) -> Self {
        self.config.nboot1 = n;
        self
    }

    /// Set the number of inner replicates per outer replicate.
    pub fn nboot2(mut self, n: usize) -> Self {
        self.config.nboot2 = n;
        self
    }

    /// Set the deterministic base seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Enable or disable indicator expansion of categorical features.
    pub fn auto_dummy(mut self, enabled: bool) -> Self {
        self.config.auto_dummy = enabled;
        self
    }

    /// Set how failed outer replicates are handled.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Set the decomposition method.
    pub fn method(mut self, method: Method) -> Self {
        self.config.method = method;
        self
    }

    /// Set the forest settings passed to every estimator fit.
    pub fn forest(mut self, params: ForestParams) -> Self {
        self.config.forest = params;
        self
    }

    /// Use a custom categorical encoder.
    pub fn encoder(mut self, encoder: impl CategoricalEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Get the current configuration.
    pub fn settings(&self) -> &Config {
        &self.config
    }

    /// Run the decomposition.
    ///
    /// # How It Works
    ///
    /// 1. Validates the configuration and the variable roles
    /// 2. Expands categorical mediators and confounders (if enabled)
    /// 3. Runs `nboot1` outer replicates, in parallel when the `parallel`
    ///    feature is on; replicate 0 uses the original rows
    /// 4. Concatenates the per-replicate tables and summarises every measure
    ///
    /// # Errors
    ///
    /// Configuration and data problems are returned before any replicate
    /// runs. Replicate failures are returned immediately under
    /// [`FailurePolicy::FailFast`]; under [`FailurePolicy::SkipReplicate`]
    /// they are recorded in [`Decomposition::failures`] and only an error if
    /// every replicate fails.
    pub fn decompose(&self, data: &Dataset, vars: &Variables) -> Result<Decomposition> {
        let start = Instant::now();
        self.config.validate()?;
        vars.check_roles()?;

        let (data, vars) = self.encode(data, vars)?;
        let prepared = vars.prepare(&data)?;

        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let runner = ReplicateRunner::new(
            &prepared,
            &self.estimator,
            &self.config.forest,
            self.config.nboot2,
            seed,
        );
        let plan = runner.plan();
        tracing::debug!(
            rows = prepared.n_rows(),
            mediators = prepared.n_mediators(),
            confounders = prepared.n_confounders(),
            ?plan,
            fits_per_replicate = plan.fits(),
            seed,
            "starting decomposition"
        );

        let (mut replicates, failures) =
            run_replicates(&runner, self.config.nboot1, self.config.failure_policy)?;
        replicates.sort_by_key(ReplicateEffects::rep);

        let summary = summarize(&replicates);
        let effects = EffectTable::from_replicates(&replicates);
        let runtime_secs = start.elapsed().as_secs_f64();

        tracing::info!(
            ?plan,
            successful = replicates.len(),
            failed = failures.len(),
            rows = effects.len(),
            runtime_secs,
            "decomposition complete"
        );

        Ok(Decomposition {
            effects,
            summary,
            failures,
            metadata: Metadata {
                method: self.config.method,
                plan,
                nboot1: self.config.nboot1,
                nboot2: self.config.nboot2,
                seed,
                successful_replicates: replicates.len(),
                runtime_secs,
            },
        })
    }

    /// Expand categorical mediators and confounders, or pass through.
    fn encode<'d>(
        &self,
        data: &'d Dataset,
        vars: &'d Variables,
    ) -> Result<(Cow<'d, Dataset>, Cow<'d, Variables>)> {
        let categorical =
            needs_encoding(data, &vars.mediators) || needs_encoding(data, &vars.confounders);
        if !categorical {
            return Ok((Cow::Borrowed(data), Cow::Borrowed(vars)));
        }
        if !self.config.auto_dummy {
            tracing::warn!("categorical mediators or confounders present with auto_dummy disabled");
            return Ok((Cow::Borrowed(data), Cow::Borrowed(vars)));
        }

        let (data, mediators) = self.encoder.encode(data, &vars.mediators)?;
        let (data, confounders) = self.encoder.encode(&data, &vars.confounders)?;
        tracing::warn!(
            mediators = mediators.len(),
            confounders = confounders.len(),
            "expanded categorical features into indicator columns"
        );

        let mut encoded = vars.clone();
        encoded.mediators = mediators;
        encoded.confounders = confounders;
        Ok((Cow::Owned(data), Cow::Owned(encoded)))
    }
}

/// Run outer replicates `0..nboot1` under `policy`.
fn run_replicates<E: EffectEstimator>(
    runner: &ReplicateRunner<'_, E>,
    nboot1: usize,
    policy: FailurePolicy,
) -> Result<(Vec<ReplicateEffects>, Vec<ReplicateFailure>)> {
    match policy {
        FailurePolicy::FailFast => {
            let run = |rep: usize| runner.run(rep).map_err(|source| Error::Replicate { rep, source });

            // Collecting into `Result` stops scheduling new replicates after
            // the first error.
            #[cfg(feature = "parallel")]
            let replicates = crate::thread_pool::install(|| {
                (0..nboot1).into_par_iter().map(run).collect::<Result<Vec<_>>>()
            })?;
            #[cfg(not(feature = "parallel"))]
            let replicates = (0..nboot1).map(run).collect::<Result<Vec<_>>>()?;

            Ok((replicates, Vec::new()))
        }
        FailurePolicy::SkipReplicate => {
            let run = |rep: usize| runner.run(rep).map_err(|error| ReplicateFailure { rep, error });

            #[cfg(feature = "parallel")]
            let outcomes: Vec<_> =
                crate::thread_pool::install(|| (0..nboot1).into_par_iter().map(run).collect());
            #[cfg(not(feature = "parallel"))]
            let outcomes: Vec<_> = (0..nboot1).map(run).collect();

            let mut replicates = Vec::with_capacity(nboot1);
            let mut failures = Vec::new();
            for outcome in outcomes {
                match outcome {
                    Ok(effects) => replicates.push(effects),
                    Err(failure) => {
                        tracing::warn!(rep = failure.rep, error = %failure.error, "skipping failed replicate");
                        failures.push(failure);
                    }
                }
            }
            if replicates.is_empty() {
                return Err(Error::AllReplicatesFailed {
                    attempted: nboot1,
                    failures,
                });
            }
            Ok((replicates, failures))
        }
    }
}

/// Run a decomposition with an explicit configuration.
///
/// Equivalent to `FairnessCookbook::new(estimator).config(config)` followed
/// by [`FairnessCookbook::decompose`].
pub fn fairness_cookbook<E: EffectEstimator>(
    data: &Dataset,
    vars: &Variables,
    config: Config,
    estimator: E,
) -> Result<Decomposition> {
    FairnessCookbook::new(estimator)
        .config(config)
        .decompose(data, vars)
}
