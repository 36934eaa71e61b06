//! Tag-driven graph traversal.
//!
//! [`traverse`] visits every node of a graph exactly once per traversal,
//! dispatching on the node tag. Continuations of `Bind` nodes are invoked
//! eagerly and the subgraphs they return are walked in place, so sources
//! reachable only through a continuation are drawn and recorded like any
//! other source.
//!
//! A traversal of a tree with `k` source leaves performs at most `k` draws;
//! fewer when a filter rejects early. Rejection surfaces as
//! [`ExecError::RejectedSample`] and is never retried here.

use stochas_ir::{Node, Value};

use crate::engine::context::TraversalContext;
use crate::engine::errors::ExecError;

/// Walks `root`, threading `ctx`, and returns the value it produces.
///
/// - `Source`: draws at `ctx.generation()`, records the source, advances
///   the generation. Fails once the generation cannot advance.
/// - `Constant`: yields its value without drawing.
/// - `Filter`: walks the child, then rejects unless the predicate holds on
///   the current value.
/// - `Bind`: walks the child, feeds its value to the continuation, walks the
///   returned subgraph.
/// - `InferenceMarker`: walks the child; the boundary only matters to callers
///   that materialize it repeatedly.
pub fn traverse(root: &Node, ctx: &mut TraversalContext) -> Result<Value, ExecError> {
    match root {
        Node::Source(source) => ctx.draw(source),
        Node::Constant(value) => {
            ctx.set_current(*value);
            Ok(*value)
        }
        Node::Filter { predicate, child } => {
            let value = traverse(child, ctx)?;
            if predicate(value) {
                Ok(value)
            } else {
                Err(ExecError::RejectedSample {
                    value,
                    generation: ctx.generation(),
                })
            }
        }
        Node::Bind {
            child,
            continuation,
        } => {
            let a = traverse(child, ctx)?;
            let next = continuation(a);
            let b = traverse(&next, ctx)?;
            ctx.set_current(b);
            Ok(b)
        }
        Node::InferenceMarker(child) => traverse(child, ctx),
    }
}

/// Walks `root` in a fresh context, retrying rejected traversals.
///
/// Each retry starts a new context at the generation where the rejected one
/// stopped, so no draw index is reused. Returns the successful context and
/// value together with the number of rejections seen.
pub(crate) fn traverse_with_retries(
    root: &Node,
    first_generation: u64,
    max_rejections: usize,
) -> Result<(TraversalContext, Value, usize), ExecError> {
    let mut generation = first_generation;
    for rejections in 0..=max_rejections {
        let mut ctx = TraversalContext::starting_at(generation);
        match traverse(root, &mut ctx) {
            Ok(value) => return Ok((ctx, value, rejections)),
            Err(ExecError::RejectedSample { .. }) => generation = ctx.generation(),
            Err(other) => return Err(other),
        }
    }
    Err(ExecError::RejectionLimit {
        attempts: max_rejections + 1,
    })
}
