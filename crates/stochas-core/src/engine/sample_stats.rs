//! Sample runs and their summary statistics.
//!
//! Notes:
//! - Mean uses Kahan-compensated summation.
//! - Standard deviation is the unbiased (`n - 1`) estimator and is undefined
//!   for fewer than two values.

use stochas_ir::Value;

/// Values produced by materializing an inference boundary `count` times.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRun {
    count: usize,
    values: Vec<Value>,
}

impl SampleRun {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            count: values.len(),
            values,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn stats(&self) -> SampleStats {
        SampleStats::from_values(&self.values)
    }
}

/// Empirical mean and standard deviation of a sample run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleStats {
    pub count: usize,
    /// Empirical mean; NaN for an empty run.
    pub mean: f64,
    /// Unbiased sample standard deviation; `None` below two values.
    pub std_dev: Option<f64>,
}

impl SampleStats {
    pub fn from_values(values: &[Value]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                std_dev: None,
            };
        }

        let mean = kahan_sum(values.iter().copied()) / count as f64;
        let std_dev = (count >= 2).then(|| {
            let squares = kahan_sum(values.iter().map(|v| (v - mean) * (v - mean)));
            (squares / (count - 1) as f64).sqrt()
        });

        Self {
            count,
            mean,
            std_dev,
        }
    }

    /// Absolute distance of the mean from `target`.
    pub fn mean_error(&self, target: f64) -> f64 {
        (self.mean - target).abs()
    }

    /// Absolute distance of the standard deviation from `target`, if defined.
    pub fn std_dev_error(&self, target: f64) -> Option<f64> {
        self.std_dev.map(|s| (s - target).abs())
    }
}

fn kahan_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for v in values {
        let y = v - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}
