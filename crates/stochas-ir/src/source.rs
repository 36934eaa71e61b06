//! Elementary random sources.
//!
//! A [`Source`] is the leaf of every computation graph. It pairs a stable
//! identity ([`SourceId`]) with a reference to an external [`Distribution`]
//! that knows how to produce a value for a given draw index. The graph model
//! never samples by itself; it only carries the reference.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::node::Value;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an elementary random source.
///
/// Every call to [`Source::new`] (or one of its siblings) allocates a fresh id,
/// so two sources are the same source exactly when their ids are equal.
/// Implements `Ord` for deterministic iteration over source sets.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u64);

impl SourceId {
    fn fresh() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

/// Random-source provider for a single source.
///
/// Given the identity of the source being drawn and the draw index chosen by
/// the traversal, returns a numeric value. Implementations decide whether the
/// same `(source, draw_index)` pair must always yield the same value; callers
/// that need reproducible analyses should supply deterministic providers.
pub trait Distribution: Send + Sync {
    fn draw(&self, source: SourceId, draw_index: u64) -> Value;
}

struct FnDistribution<F>(F);

impl<F> Distribution for FnDistribution<F>
where
    F: Fn(SourceId, u64) -> Value + Send + Sync,
{
    fn draw(&self, source: SourceId, draw_index: u64) -> Value {
        (self.0)(source, draw_index)
    }
}

/// A leaf random source: identity plus distribution reference.
///
/// Cloning a `Source` keeps its identity, which is how two independently
/// rooted graphs come to share an elementary draw.
#[derive(Clone)]
pub struct Source {
    id: SourceId,
    label: Option<Arc<str>>,
    distribution: Arc<dyn Distribution>,
}

impl Source {
    /// Creates a source with a fresh identity.
    pub fn new(distribution: impl Distribution + 'static) -> Self {
        Self::from_shared(Arc::new(distribution))
    }

    /// Creates a labelled source with a fresh identity.
    ///
    /// The label is for reporting only and takes no part in identity.
    pub fn labelled(label: impl Into<Arc<str>>, distribution: impl Distribution + 'static) -> Self {
        let mut source = Self::new(distribution);
        source.label = Some(label.into());
        source
    }

    /// Creates a source from a closure `(source, draw_index) -> value`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(SourceId, u64) -> Value + Send + Sync + 'static,
    {
        Self::new(FnDistribution(f))
    }

    /// Creates a source around an already shared distribution.
    pub fn from_shared(distribution: Arc<dyn Distribution>) -> Self {
        Self {
            id: SourceId::fresh(),
            label: None,
            distribution,
        }
    }

    /// Returns a copy of this source carrying `label`, keeping its identity.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn distribution(&self) -> &Arc<dyn Distribution> {
        &self.distribution
    }

    /// Draws the value at `draw_index` from the underlying distribution.
    #[inline]
    pub fn draw(&self, draw_index: u64) -> Value {
        self.distribution.draw(self.id, draw_index)
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Source {}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} '{}'", self.id, label),
            None => write!(f, "{}", self.id),
        }
    }
}
