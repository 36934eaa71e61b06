//! Adaptive sample-size debugger.
//!
//! Finds the smallest number of Monte Carlo samples whose empirical mean (and
//! optionally standard deviation) lands within an absolute tolerance of a
//! target. Candidate counts come from a [`HyperparameterModel`] and are tried
//! highest-scored first:
//!
//! ```text
//! Proposing --> Sampling --> Evaluating --+--> Accepted
//!     ^                                   |
//!     +-----------------------------------+--> Exhausted (pool empty)
//! ```
//!
//! ## Sampling
//!
//! A trial of size `n` materializes the model's inference boundary `n` times.
//! Each draw owns a fresh [`TraversalContext`](crate::engine::context::TraversalContext)
//! on its own stream; stream ids increase monotonically over the whole search,
//! so no two draws share a draw index. A search that would need a stream
//! past [`MAX_STREAM`] fails instead of reusing one. Rejected draws are
//! retried on the same stream up to `max_rejections` times.
//!
//! With the `parallel` feature the `n` draws of a trial run on the rayon pool.
//! Stream assignment does not depend on scheduling, so results are identical
//! to a sequential run.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use stochas_ir::{Node, Value};

use crate::engine::context::{stream_origin, MAX_STREAM};
use crate::engine::errors::ExecError;
use crate::engine::hyperparameter::HyperparameterModel;
use crate::engine::sample_stats::{SampleRun, SampleStats};
use crate::engine::traversal::traverse_with_retries;

/// Configuration for the sample-size search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebuggerConfig {
    /// Rejected traversals tolerated per draw before the search fails.
    pub max_rejections: usize,
    /// Stream id of the first draw of the search.
    pub first_stream: u64,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            max_rejections: 64,
            first_stream: 0,
        }
    }
}

impl DebuggerConfig {
    fn validate(self) -> Result<Self, ExecError> {
        if self.first_stream > MAX_STREAM {
            return Err(ExecError::PreconditionViolation(format!(
                "sample-size search: first_stream must be <= {}, got {}",
                MAX_STREAM, self.first_stream
            )));
        }
        Ok(self)
    }
}

/// Statistics the search must reach.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceTarget {
    pub mean: f64,
    /// Target standard deviation; `None` for the single-moment search.
    pub std_dev: Option<f64>,
    /// Absolute tolerance applied to every targeted moment.
    pub tolerance: f64,
}

impl ConvergenceTarget {
    pub fn mean_only(mean: f64, tolerance: f64) -> Self {
        Self {
            mean,
            std_dev: None,
            tolerance,
        }
    }

    pub fn mean_and_std(mean: f64, std_dev: f64, tolerance: f64) -> Self {
        Self {
            mean,
            std_dev: Some(std_dev),
            tolerance,
        }
    }

    fn validate(self) -> Result<Self, ExecError> {
        if !self.mean.is_finite() {
            return Err(ExecError::PreconditionViolation(
                "convergence target: mean must be finite".into(),
            ));
        }
        if let Some(std_dev) = self.std_dev {
            if !std_dev.is_finite() || std_dev < 0.0 {
                return Err(ExecError::PreconditionViolation(
                    "convergence target: std_dev must be finite and >= 0".into(),
                ));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ExecError::PreconditionViolation(
                "convergence target: tolerance must be finite and >= 0".into(),
            ));
        }
        Ok(self)
    }

    /// The `Evaluating` predicate.
    pub fn is_met_by(&self, stats: &SampleStats) -> bool {
        if stats.mean_error(self.mean) > self.tolerance || stats.mean.is_nan() {
            return false;
        }
        match self.std_dev {
            None => true,
            Some(target) => stats
                .std_dev_error(target)
                .is_some_and(|err| err <= self.tolerance),
        }
    }

    /// Distance used to rank failed trials: the largest targeted error.
    fn error_of(&self, stats: &SampleStats) -> f64 {
        let mean_err = stats.mean_error(self.mean);
        match self.std_dev {
            None => mean_err,
            Some(target) => mean_err.max(stats.std_dev_error(target).unwrap_or(f64::INFINITY)),
        }
    }
}

/// One evaluated candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trial {
    pub count: usize,
    pub stats: SampleStats,
}

/// Terminal state of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchOutcome {
    /// A candidate met the target.
    Accepted(Trial),
    /// Every candidate failed. `count` is `max_count`; `best` is the trial
    /// closest to the target.
    Exhausted { count: usize, best: Option<Trial> },
}

impl SearchOutcome {
    /// Sample count the search settled on.
    pub fn count(&self) -> usize {
        match self {
            SearchOutcome::Accepted(trial) => trial.count,
            SearchOutcome::Exhausted { count, .. } => *count,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, SearchOutcome::Accepted(_))
    }

    /// Statistics of the accepted trial, or of the best failed one.
    pub fn stats(&self) -> Option<SampleStats> {
        match self {
            SearchOutcome::Accepted(trial) => Some(trial.stats),
            SearchOutcome::Exhausted { best, .. } => best.map(|trial| trial.stats),
        }
    }

    /// Empirical mean reached, NaN when nothing was sampled.
    pub fn achieved_mean(&self) -> f64 {
        self.stats().map_or(f64::NAN, |stats| stats.mean)
    }
}

/// Runtime diagnostics emitted by a search.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchDiagnostics {
    /// Evaluated trials in proposal order.
    pub trials: Vec<Trial>,
    /// Successful draws across all trials.
    pub draws: u64,
    /// Rejected traversals discarded across all trials.
    pub rejections: u64,
}

enum SearchState {
    Proposing,
    Sampling(usize),
    Evaluating(SampleRun),
    Accepted(Trial),
    Exhausted,
}

/// Searches for the smallest sample count meeting a convergence target.
#[derive(Debug, Clone)]
pub struct SampleSizeDebugger {
    model: HyperparameterModel,
    config: DebuggerConfig,
}

impl SampleSizeDebugger {
    /// Creates a debugger with default configuration.
    pub fn new(model: HyperparameterModel) -> Self {
        Self {
            model,
            config: DebuggerConfig::default(),
        }
    }

    pub fn with_config(model: HyperparameterModel, config: DebuggerConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &HyperparameterModel {
        &self.model
    }

    pub fn config(&self) -> DebuggerConfig {
        self.config
    }

    /// Single-moment search: mean only.
    pub fn converge_mean(
        &self,
        model: &Node,
        mean: f64,
        tolerance: f64,
    ) -> Result<SearchOutcome, ExecError> {
        self.search(model, ConvergenceTarget::mean_only(mean, tolerance))
    }

    /// Two-moment search: mean and standard deviation.
    pub fn converge_mean_and_std(
        &self,
        model: &Node,
        mean: f64,
        std_dev: f64,
        tolerance: f64,
    ) -> Result<SearchOutcome, ExecError> {
        self.search(model, ConvergenceTarget::mean_and_std(mean, std_dev, tolerance))
    }

    /// Single-moment search returning `(n, achieved_mean)`.
    ///
    /// The pair always comes from one trial: the accepted one, or on
    /// exhaustion the trial closest to the target.
    pub fn converge_mean_with_estimate(
        &self,
        model: &Node,
        mean: f64,
        tolerance: f64,
    ) -> Result<(usize, f64), ExecError> {
        match self.converge_mean(model, mean, tolerance)? {
            SearchOutcome::Accepted(trial)
            | SearchOutcome::Exhausted {
                best: Some(trial), ..
            } => Ok((trial.count, trial.stats.mean)),
            SearchOutcome::Exhausted { count, best: None } => Ok((count, f64::NAN)),
        }
    }

    /// Runs the search for an explicit target.
    pub fn search(
        &self,
        model: &Node,
        target: ConvergenceTarget,
    ) -> Result<SearchOutcome, ExecError> {
        self.search_with_diagnostics(model, target)
            .map(|(outcome, _)| outcome)
    }

    /// Runs the search and reports every trial it evaluated.
    pub fn search_with_diagnostics(
        &self,
        model: &Node,
        target: ConvergenceTarget,
    ) -> Result<(SearchOutcome, SearchDiagnostics), ExecError> {
        let target = target.validate()?;
        let config = self.config.validate()?;
        let boundary = model.inference_boundary();
        let mut candidates = self.model.candidates();
        let mut next_stream = config.first_stream;
        let mut diagnostics = SearchDiagnostics::default();
        let mut best: Option<(f64, Trial)> = None;

        let mut state = SearchState::Proposing;
        let outcome = loop {
            state = match state {
                SearchState::Proposing => match candidates.next() {
                    Some(count) => SearchState::Sampling(count),
                    None => SearchState::Exhausted,
                },
                SearchState::Sampling(count) => {
                    let first_stream = next_stream;
                    next_stream = reserve_streams(first_stream, count)?;
                    let (run, rejections) = self.sample_run(boundary, count, first_stream)?;
                    diagnostics.draws += count as u64;
                    diagnostics.rejections += rejections;
                    SearchState::Evaluating(run)
                }
                SearchState::Evaluating(run) => {
                    let trial = Trial {
                        count: run.count(),
                        stats: run.stats(),
                    };
                    diagnostics.trials.push(trial);
                    let met = target.is_met_by(&trial.stats);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        count = trial.count,
                        mean = trial.stats.mean,
                        std_dev = ?trial.stats.std_dev,
                        met,
                        "sample-size trial evaluated"
                    );

                    if met {
                        SearchState::Accepted(trial)
                    } else {
                        let error = target.error_of(&trial.stats);
                        if best.map_or(true, |(best_error, _)| error < best_error) {
                            best = Some((error, trial));
                        }
                        if candidates.is_exhausted() {
                            SearchState::Exhausted
                        } else {
                            SearchState::Proposing
                        }
                    }
                }
                SearchState::Accepted(trial) => break SearchOutcome::Accepted(trial),
                SearchState::Exhausted => {
                    break SearchOutcome::Exhausted {
                        count: self.model.max_count(),
                        best: best.map(|(_, trial)| trial),
                    }
                }
            };
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            converged = outcome.is_converged(),
            count = outcome.count(),
            trials = diagnostics.trials.len(),
            draws = diagnostics.draws,
            "sample-size search finished"
        );

        Ok((outcome, diagnostics))
    }

    /// Materializes `boundary` `count` times on streams starting at `first_stream`.
    fn sample_run(
        &self,
        boundary: &Node,
        count: usize,
        first_stream: u64,
    ) -> Result<(SampleRun, u64), ExecError> {
        let max_rejections = self.config.max_rejections;
        let draw = |i: usize| materialize(boundary, first_stream + i as u64, max_rejections);

        #[cfg(feature = "parallel")]
        let draws: Vec<(Value, usize)> = (0..count)
            .into_par_iter()
            .map(draw)
            .collect::<Result<_, _>>()?;
        #[cfg(not(feature = "parallel"))]
        let draws: Vec<(Value, usize)> = (0..count).map(draw).collect::<Result<_, _>>()?;

        let rejections = draws.iter().map(|(_, r)| *r as u64).sum();
        let values = draws.into_iter().map(|(value, _)| value).collect();
        Ok((SampleRun::new(values), rejections))
    }
}

/// Claims `count` consecutive streams from `first_stream` and returns the
/// stream after them. Fails when the claim would run past [`MAX_STREAM`].
fn reserve_streams(first_stream: u64, count: usize) -> Result<u64, ExecError> {
    u64::try_from(count)
        .ok()
        .and_then(|count| first_stream.checked_add(count))
        .filter(|next| *next <= MAX_STREAM + 1)
        .ok_or_else(|| {
            ExecError::PreconditionViolation(format!(
                "sample-size search: {} draws from stream {} exceed the last stream {}",
                count, first_stream, MAX_STREAM
            ))
        })
}

/// One independent draw of `boundary` on `stream`.
fn materialize(
    boundary: &Node,
    stream: u64,
    max_rejections: usize,
) -> Result<(Value, usize), ExecError> {
    let (_, value, rejections) =
        traverse_with_retries(boundary, stream_origin(stream)?, max_rejections)?;
    if !value.is_finite() {
        return Err(ExecError::Numerical(format!(
            "sample-size search: non-finite sample {} on stream {}",
            value, stream
        )));
    }
    Ok((value, rejections))
}
