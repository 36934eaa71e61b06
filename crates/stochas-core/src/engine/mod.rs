//! The analysis engine for stochas graphs.
//!
//! This module provides:
//! - **errors**: Error types for traversal and search failures
//! - **context**: Per-traversal mutable state
//! - **traversal**: Tag-driven graph walker
//! - **dependence**: Source-set collection and correlation reports
//! - **hyperparameter**: Truncated geometric prior over sample counts
//! - **sample_stats**: Sample runs and their summary statistics
//! - **debugger**: Adaptive sample-size search

pub mod context;
pub mod debugger;
pub mod dependence;
pub mod errors;
pub mod hyperparameter;
pub mod sample_stats;
pub mod traversal;
