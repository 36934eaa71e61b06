//! # Stochas IR
//!
//! Computation graph model for lazily-evaluated probabilistic expressions.
//!
//! A graph is built purely by composition of immutable nodes:
//! - `source` leaves, each drawing from an external [`Distribution`]
//! - `filter` for conditioning on the current value
//! - `bind` for sequential composition with a dependent continuation
//! - `mark_for_inference` for subgraphs materialized by repeated sampling

pub mod node;
pub mod source;

// Re-export commonly used types
pub use node::{
    bind, constant, filter, map, mark_for_inference, source, Continuation, Node, Predicate, Value,
};
pub use source::{Distribution, Source, SourceId};
