//! Computation graph nodes.
//!
//! A [`Node`] is an immutable, finite, rooted tree. Children are exclusively
//! owned by their parent; only [`Source`] identities may be shared between
//! independently rooted graphs, which is exactly what dependence analysis
//! looks for.
//!
//! ## Purity of continuations
//!
//! `bind` takes a continuation `Value -> Node`. The continuation must be
//! referentially pure: it may capture sources and constants, but it must not
//! capture or mutate traversal state. An impure continuation is a usage
//! contract violation; nothing checks it at runtime, and dependence results
//! for such graphs are undefined.

use std::fmt;
use std::sync::Arc;

use crate::source::{Distribution, Source};

/// Value produced by a traversal step.
pub type Value = f64;

/// Conditioning predicate applied to the current value.
pub type Predicate = Arc<dyn Fn(Value) -> bool + Send + Sync>;

/// Dependent continuation of a `Bind` node.
pub type Continuation = Arc<dyn Fn(Value) -> Node + Send + Sync>;

/// A probabilistic expression.
///
/// The node set is closed; consumers match on it exhaustively.
#[derive(Clone)]
pub enum Node {
    /// Leaf elementary random draw.
    Source(Source),
    /// Leaf fixed value; draws nothing.
    Constant(Value),
    /// Conditioning: the child's value must satisfy `predicate`.
    Filter {
        predicate: Predicate,
        child: Box<Node>,
    },
    /// Sequential composition: `continuation` builds the next subgraph from
    /// the child's value.
    Bind {
        child: Box<Node>,
        continuation: Continuation,
    },
    /// Boundary of a subgraph that is materialized by repeated, independent
    /// sampling.
    InferenceMarker(Box<Node>),
}

/// Builds a leaf node drawing from `distribution` under a fresh identity.
pub fn source(distribution: impl Distribution + 'static) -> Node {
    Node::Source(Source::new(distribution))
}

/// Builds a leaf node yielding `value`.
pub fn constant(value: Value) -> Node {
    Node::Constant(value)
}

/// Conditions `child` on `predicate`.
pub fn filter<P>(predicate: P, child: Node) -> Node
where
    P: Fn(Value) -> bool + Send + Sync + 'static,
{
    Node::Filter {
        predicate: Arc::new(predicate),
        child: Box::new(child),
    }
}

/// Sequentially composes `child` with a dependent `continuation`.
///
/// `continuation` must be pure; see the module documentation.
pub fn bind<K>(child: Node, continuation: K) -> Node
where
    K: Fn(Value) -> Node + Send + Sync + 'static,
{
    Node::Bind {
        child: Box::new(child),
        continuation: Arc::new(continuation),
    }
}

/// Applies a pure function to the value of `child`.
///
/// Equivalent to `bind(child, |a| constant(f(a)))`.
pub fn map<F>(child: Node, f: F) -> Node
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    bind(child, move |a| Node::Constant(f(a)))
}

/// Marks `child` as a subgraph to be materialized by sampling.
pub fn mark_for_inference(child: Node) -> Node {
    Node::InferenceMarker(Box::new(child))
}

impl Node {
    pub fn filter<P>(self, predicate: P) -> Node
    where
        P: Fn(Value) -> bool + Send + Sync + 'static,
    {
        filter(predicate, self)
    }

    pub fn bind<K>(self, continuation: K) -> Node
    where
        K: Fn(Value) -> Node + Send + Sync + 'static,
    {
        bind(self, continuation)
    }

    pub fn map<F>(self, f: F) -> Node
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        map(self, f)
    }

    pub fn mark_for_inference(self) -> Node {
        mark_for_inference(self)
    }

    /// Returns the node kind as a static tag, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Source(_) => "source",
            Node::Constant(_) => "constant",
            Node::Filter { .. } => "filter",
            Node::Bind { .. } => "bind",
            Node::InferenceMarker(_) => "infer",
        }
    }

    /// Returns the subgraph below this node's outermost inference marker,
    /// or `self` when the root is not a marker.
    pub fn inference_boundary(&self) -> &Node {
        match self {
            Node::InferenceMarker(child) => child,
            other => other,
        }
    }
}

impl From<Source> for Node {
    fn from(source: Source) -> Self {
        Node::Source(source)
    }
}

/// Renders the statically known shape. Continuations are opaque and shown as `..`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Source(source) => write!(f, "{}", source),
            Node::Constant(value) => write!(f, "{}", value),
            Node::Filter { child, .. } => write!(f, "filter({})", child),
            Node::Bind { child, .. } => write!(f, "bind({}, ..)", child),
            Node::InferenceMarker(child) => write!(f, "infer({})", child),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Source(source) => f.debug_tuple("Source").field(source).finish(),
            Node::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Node::Filter { child, .. } => f
                .debug_struct("Filter")
                .field("child", child)
                .finish_non_exhaustive(),
            Node::Bind { child, .. } => f
                .debug_struct("Bind")
                .field("child", child)
                .finish_non_exhaustive(),
            Node::InferenceMarker(child) => f.debug_tuple("InferenceMarker").field(child).finish(),
        }
    }
}
