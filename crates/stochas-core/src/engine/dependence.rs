//! Dependence analysis over elementary random sources.
//!
//! Dependence is treated as *structural sharing of elementary draws*, not as
//! statistical covariance:
//! - two expressions with disjoint source sets are independent;
//! - two expressions sharing sources are flagged as potentially dependent,
//!   with a Jaccard overlap `|A ∩ B| / |A ∪ B|` as the reported strength.
//!
//! The exact correlation coefficient is left to an external estimator, which
//! can consume [`Correlation::shared`] as its input set.
//!
//! Both roots of a correlation query are traversed from the same stream
//! origin, so identical roots produce identical traces whenever their
//! distributions are deterministic in `(source, draw index)`.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use stochas_ir::{Node, SourceId, Value};

use crate::engine::context::{stream_origin, MAX_STREAM};
use crate::engine::errors::ExecError;
use crate::engine::traversal::traverse_with_retries;

/// Set of source identities reachable from an expression.
pub type SourceSet = BTreeSet<SourceId>;

/// Configuration for the dependence analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalyzerConfig {
    /// Rejected traversals tolerated before giving up on a root.
    pub max_rejections: usize,
    /// Draw stream every analyzed root starts from.
    pub stream: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_rejections: 64,
            stream: 0,
        }
    }
}

impl AnalyzerConfig {
    fn validate(self) -> Result<Self, ExecError> {
        if self.stream > MAX_STREAM {
            return Err(ExecError::PreconditionViolation(format!(
                "dependence analysis: stream must be <= {}, got {}",
                MAX_STREAM, self.stream
            )));
        }
        Ok(self)
    }
}

/// Sources visited by one successful traversal, in visit order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceTrace {
    /// Visited source identities, duplicates included.
    pub visits: Vec<SourceId>,
    /// Value the traversal produced.
    pub value: Value,
    /// Rejected traversals discarded before this one succeeded.
    pub rejections: usize,
}

impl SourceTrace {
    /// Visited sources as a set (multiplicity dropped).
    pub fn sources(&self) -> SourceSet {
        self.visits.iter().copied().collect()
    }

    /// Number of times `id` was drawn.
    pub fn multiplicity(&self, id: SourceId) -> usize {
        self.visits.iter().filter(|visit| **visit == id).count()
    }

    /// Sources drawn more than once, i.e. reused within a single traversal.
    pub fn reused_sources(&self) -> SourceSet {
        let mut counts: FxHashMap<SourceId, usize> = FxHashMap::default();
        for id in &self.visits {
            *counts.entry(*id).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Structural correlation report between two expressions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Correlation {
    /// Sources reachable from both expressions.
    pub shared: SourceSet,
    /// Jaccard overlap of the two source sets, in `[0, 1]`.
    pub correlation_strength: f64,
}

impl Correlation {
    /// Builds the report from two source sets.
    ///
    /// Strength is `0` when both sets are empty.
    pub fn between(a: &SourceSet, b: &SourceSet) -> Self {
        let shared: SourceSet = a.intersection(b).copied().collect();
        let union = a.union(b).count();
        let correlation_strength = if union == 0 {
            0.0
        } else {
            shared.len() as f64 / union as f64
        };
        Self {
            shared,
            correlation_strength,
        }
    }

    /// True when the expressions share no source and are therefore independent.
    pub fn is_independent(&self) -> bool {
        self.shared.is_empty()
    }
}

/// Collects source sets and correlation reports.
#[derive(Debug, Clone, Default)]
pub struct DependenceAnalyzer {
    config: AnalyzerConfig,
}

impl DependenceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> AnalyzerConfig {
        self.config
    }

    /// Runs one successful traversal of `root` and records its visits.
    pub fn trace(&self, root: &Node) -> Result<SourceTrace, ExecError> {
        let config = self.config.validate()?;
        let (ctx, value, rejections) = traverse_with_retries(
            root,
            stream_origin(config.stream)?,
            config.max_rejections,
        )?;

        if rejections > 0 {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                root = %root,
                rejections,
                "dependence analysis retried rejected traversals"
            );
        }

        Ok(SourceTrace {
            visits: ctx.visited_ids(),
            value,
            rejections,
        })
    }

    /// `Sources(root)`: identities of every source one traversal touches.
    pub fn analyze(&self, root: &Node) -> Result<SourceSet, ExecError> {
        self.trace(root).map(|trace| trace.sources())
    }

    /// Compares the source sets of two expressions.
    pub fn correlated(&self, a: &Node, b: &Node) -> Result<Correlation, ExecError> {
        let sources_a = self.analyze(a)?;
        let sources_b = self.analyze(b)?;
        Ok(Correlation::between(&sources_a, &sources_b))
    }
}

/// `Sources(root)` with the default analyzer configuration.
pub fn analyze(root: &Node) -> Result<SourceSet, ExecError> {
    DependenceAnalyzer::default().analyze(root)
}

/// Correlation report with the default analyzer configuration.
pub fn correlated(a: &Node, b: &Node) -> Result<Correlation, ExecError> {
    DependenceAnalyzer::default().correlated(a, b)
}
