//! Per-traversal mutable state.
//!
//! A [`TraversalContext`] is created fresh for one traversal and discarded at
//! its end. It is never shared, so any number of traversals over the same
//! graph may run concurrently as long as each owns its context.

use smallvec::SmallVec;
use stochas_ir::{Source, SourceId, Value};

use crate::engine::errors::ExecError;

/// Bit offset separating independent draw streams.
///
/// Stream `s` starts at generation `s << STREAM_SHIFT`, leaving `2^32` draw
/// indices per stream before it would run into the next one.
pub const STREAM_SHIFT: u32 = 32;

/// Largest stream id whose origin fits in a `u64` generation.
pub const MAX_STREAM: u64 = u64::MAX >> STREAM_SHIFT;

/// State threaded through a single traversal.
#[derive(Debug, Clone, Default)]
pub struct TraversalContext {
    generation: u64,
    current_value: Option<Value>,
    visited_sources: SmallVec<[Source; 8]>,
}

impl TraversalContext {
    /// Creates a context starting at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context whose first draw uses `generation` as its index.
    pub fn starting_at(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Creates a context at the origin of draw stream `stream`.
    ///
    /// Fails for streams past [`MAX_STREAM`].
    pub fn for_stream(stream: u64) -> Result<Self, ExecError> {
        stream_origin(stream).map(Self::starting_at)
    }

    /// Draw index the next source visit will use.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Most recently produced value, if any step has run.
    pub fn current_value(&self) -> Option<Value> {
        self.current_value
    }

    /// Every source touched so far, in visit order, duplicates included.
    pub fn visited_sources(&self) -> &[Source] {
        &self.visited_sources
    }

    /// Identities of the visited sources, in visit order.
    pub fn visited_ids(&self) -> Vec<SourceId> {
        self.visited_sources.iter().map(Source::id).collect()
    }

    /// Number of draws performed so far.
    pub fn draws(&self) -> usize {
        self.visited_sources.len()
    }

    pub fn into_visited_sources(self) -> SmallVec<[Source; 8]> {
        self.visited_sources
    }

    /// Draws from `source` at the current generation and records the visit.
    ///
    /// Fails without drawing once the generation cannot advance.
    pub(crate) fn draw(&mut self, source: &Source) -> Result<Value, ExecError> {
        let next = self.generation.checked_add(1).ok_or_else(|| {
            ExecError::PreconditionViolation(format!(
                "traversal context: draw indices exhausted at generation {}",
                self.generation
            ))
        })?;
        let value = source.draw(self.generation);
        self.visited_sources.push(source.clone());
        self.generation = next;
        self.current_value = Some(value);
        Ok(value)
    }

    pub(crate) fn set_current(&mut self, value: Value) {
        self.current_value = Some(value);
    }
}

/// First generation of draw stream `stream`.
///
/// Streams past [`MAX_STREAM`] would alias lower streams and are rejected.
#[inline]
pub fn stream_origin(stream: u64) -> Result<u64, ExecError> {
    if stream > MAX_STREAM {
        return Err(ExecError::PreconditionViolation(format!(
            "draw stream {} exceeds the last stream {}",
            stream, MAX_STREAM
        )));
    }
    Ok(stream << STREAM_SHIFT)
}
