//! Prior over candidate sample counts.
//!
//! [`HyperparameterModel`] is a geometric distribution over `1..=max_count`,
//! right-truncated at `max_count`:
//!
//! ```text
//! score(n) = p (1 - p)^(n - 1) / Z,    Z = 1 - (1 - p)^max_count
//! ```
//!
//! Scores are computed in log space, so [`HyperparameterModel::log_score`]
//! stays finite and ordered even when `score(n)` underflows for large `n`.

use rand::Rng;

use crate::engine::errors::ExecError;

/// Truncated geometric prior over sample counts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HyperparameterModel {
    p: f64,
    max_count: usize,
}

impl HyperparameterModel {
    /// Builds a prior with success probability `p` truncated at `max_count`.
    ///
    /// Fails fast when `p` is outside `(0, 1]`, when `max_count` is zero, or
    /// when the support cannot reach `max_count` (`p = 1` puts all mass on a
    /// single count).
    pub fn new(p: f64, max_count: usize) -> Result<Self, ExecError> {
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(ExecError::PreconditionViolation(format!(
                "hyperparameter model: p must be in (0, 1], got {}",
                p
            )));
        }
        if max_count == 0 {
            return Err(ExecError::PreconditionViolation(
                "hyperparameter model: max_count must be > 0".into(),
            ));
        }
        if p == 1.0 && max_count > 1 {
            return Err(ExecError::PreconditionViolation(format!(
                "hyperparameter model: p = 1 has no support beyond 1 and cannot reach max_count = {}",
                max_count
            )));
        }
        Ok(Self { p, max_count })
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Log of the truncation constant `Z`.
    fn log_normalizer(&self) -> f64 {
        if self.p == 1.0 {
            return 0.0;
        }
        // ln(1 - (1-p)^max) computed without cancellation for tiny p.
        let log_tail = self.max_count as f64 * (-self.p).ln_1p();
        (-log_tail.exp_m1()).ln()
    }

    /// Log prior mass of `count`; `-inf` outside `1..=max_count`.
    pub fn log_score(&self, count: usize) -> f64 {
        if count == 0 || count > self.max_count {
            return f64::NEG_INFINITY;
        }
        if self.p == 1.0 {
            return 0.0;
        }
        self.p.ln() + (count - 1) as f64 * (-self.p).ln_1p() - self.log_normalizer()
    }

    /// Prior mass of `count`.
    pub fn score(&self, count: usize) -> f64 {
        self.log_score(count).exp()
    }

    /// Draws a count by inverting the truncated geometric CDF.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.p == 1.0 {
            return 1;
        }
        let u: f64 = rng.gen();
        let z = -(self.max_count as f64 * (-self.p).ln_1p()).exp_m1();
        // CDF(n) = (1 - (1-p)^n) / Z  =>  n = ceil(ln(1 - u Z) / ln(1 - p))
        let n = ((-u * z).ln_1p() / (-self.p).ln_1p()).ceil();
        if n.is_finite() {
            (n as usize).clamp(1, self.max_count)
        } else {
            self.max_count
        }
    }

    /// Every candidate count, highest prior score first.
    ///
    /// `score(n)` is strictly decreasing on `1..=max_count` for `p < 1`, and
    /// `p = 1` only admits `max_count = 1`, so the best-first order is
    /// ascending count and the pool never materializes its candidates.
    pub fn candidates(&self) -> CandidatePool {
        CandidatePool {
            next: 1,
            remaining: self.max_count,
        }
    }
}

/// Untried candidate counts, yielded best-first.
///
/// Each count in `1..=max_count` is yielded exactly once. The pool holds a
/// cursor rather than the candidates, so its size is independent of
/// `max_count`.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    next: usize,
    remaining: usize,
}

impl CandidatePool {
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

impl Iterator for CandidatePool {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let count = self.next;
        self.remaining -= 1;
        self.next = count.wrapping_add(1);
        Some(count)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CandidatePool {}
