//! # Stochas Core
//!
//! Analysis engine for stochas computation graphs: a tag-driven traversal,
//! a dependence analyzer over elementary sources, and an adaptive
//! sample-size debugger.

pub mod engine;

// Re-export commonly used types
pub use engine::context::{TraversalContext, MAX_STREAM};
pub use engine::debugger::{
    ConvergenceTarget, DebuggerConfig, SampleSizeDebugger, SearchDiagnostics, SearchOutcome,
    Trial,
};
pub use engine::dependence::{
    analyze, correlated, AnalyzerConfig, Correlation, DependenceAnalyzer, SourceSet, SourceTrace,
};
pub use engine::errors::ExecError;
pub use engine::hyperparameter::HyperparameterModel;
pub use engine::sample_stats::{SampleRun, SampleStats};
pub use engine::traversal::traverse;
