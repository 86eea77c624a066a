//! Activation functions
//!
//! Element-wise non-linearities used by [`ActivationLayer`](crate::layers::ActivationLayer)
//! and the recurrent cell, plus a row-wise softmax for turning logits into
//! class probabilities.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Default negative slope for leaky ReLU.
pub const DEFAULT_LEAKY_SLOPE: f32 = 0.01;

/// Element-wise activation function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Relu,
    LeakyRelu(f32),
    Tanh,
    Sigmoid,
}

impl Activation {
    /// Names accepted by [`FromStr`].
    pub const NAMES: [&'static str; 4] = ["relu", "leaky_relu", "tanh", "sigmoid"];

    /// Apply to a single value.
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu(slope) => {
                if x > 0.0 {
                    x
                } else {
                    slope * x
                }
            }
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
        }
    }

    /// Apply in place to every element of `data`.
    pub fn apply_inplace(self, data: &mut [f32]) {
        match self {
            Activation::Relu => relu_inplace(data),
            _ => {
                for value in data.iter_mut() {
                    *value = self.apply(*value);
                }
            }
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "leaky_relu" => Ok(Activation::LeakyRelu(DEFAULT_LEAKY_SLOPE)),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            other => Err(Error::config(format!(
                "Invalid activation function '{}'. Must be one of: {}",
                other,
                Activation::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Relu => write!(f, "relu"),
            Activation::LeakyRelu(slope) => write!(f, "leaky_relu({})", slope),
            Activation::Tanh => write!(f, "tanh"),
            Activation::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Sets all negative values to 0.0, keeps positive values unchanged.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

/// Softmax applied row-wise to a row-major `rows × cols` buffer.
///
/// Subtracts the row maximum before exponentiating so large logits do not
/// overflow.
pub fn softmax_rows(outputs: &mut [f32], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(outputs.len(), rows * cols, "outputs length mismatch in softmax_rows");

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let max_value = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0f32 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Index of the largest value in each row.
pub fn argmax_rows(data: &[f32], rows: usize, cols: usize) -> Vec<usize> {
    data.chunks_exact(cols)
        .take(rows)
        .map(|row| {
            let mut best = 0usize;
            for (j, &v) in row.iter().enumerate().skip(1) {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect()
}
