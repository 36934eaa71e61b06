//! Shared fixtures for stochas integration tests.
//!
//! Provides seeded random-source providers. Every draw is a pure function of
//! `(seed, source id, draw index)`, so analyses over these sources are
//! reproducible while distinct indices still behave like independent draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stochas_ir::{bind, constant, Distribution, Node, Source, SourceId, Value};

fn draw_rng(seed: u64, source: SourceId, draw_index: u64) -> StdRng {
    let mixed = seed
        ^ source.0.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ draw_index.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    StdRng::seed_from_u64(mixed)
}

/// Uniform on `[low, high)`.
#[derive(Debug, Clone, Copy)]
pub struct Uniform {
    pub low: f64,
    pub high: f64,
    pub seed: u64,
}

impl Distribution for Uniform {
    fn draw(&self, source: SourceId, draw_index: u64) -> Value {
        draw_rng(self.seed, source, draw_index).gen_range(self.low..self.high)
    }
}

/// Normal via Box-Muller.
#[derive(Debug, Clone, Copy)]
pub struct Normal {
    pub mean: f64,
    pub std_dev: f64,
    pub seed: u64,
}

impl Distribution for Normal {
    fn draw(&self, source: SourceId, draw_index: u64) -> Value {
        let mut rng = draw_rng(self.seed, source, draw_index);
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        self.mean + self.std_dev * z
    }
}

pub fn uniform(label: &str, low: f64, high: f64, seed: u64) -> Source {
    Source::labelled(label, Uniform { low, high, seed })
}

pub fn normal(label: &str, mean: f64, std_dev: f64, seed: u64) -> Source {
    Source::labelled(label, Normal { mean, std_dev, seed })
}

/// Standard normal source.
pub fn standard_normal(label: &str, seed: u64) -> Source {
    normal(label, 0.0, 1.0, seed)
}

/// Sum of one draw from each source, composed as a chain of binds.
pub fn sum_chain(sources: &[Source]) -> Node {
    fn step(rest: &[Source], acc: f64) -> Node {
        match rest.split_first() {
            None => constant(acc),
            Some((head, tail)) => {
                let tail = tail.to_vec();
                bind(head.clone().into(), move |x| step(&tail, acc + x))
            }
        }
    }
    step(sources, 0.0)
}
