//! Dense (fully connected) layer
//!
//! Performs the transformation: output = input × weights + biases

use crate::error::{Error, Result};
use crate::layers::r#trait::check_buffers;
use crate::layers::Layer;
use crate::utils::SimpleRng;

/// Fully connected layer, `y = xW + b`.
///
/// `weights` is stored row-major as `input_size × output_size`.
///
/// # Example
///
/// ```
/// use rust_conv_networks::layers::{DenseLayer, Layer};
/// use rust_conv_networks::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = DenseLayer::new(400, 120, &mut rng);
/// assert_eq!(layer.parameter_count(), 400 * 120 + 120);
/// ```
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl DenseLayer {
    /// Xavier-uniform weights, limit = sqrt(6 / (input_size + output_size)),
    /// and zero biases.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        let limit = (6.0f32 / (input_size + output_size) as f32).sqrt();
        let weights = rng.uniform_vec(input_size * output_size, -limit, limit);

        Self {
            input_size,
            output_size,
            weights,
            biases: vec![0.0f32; output_size],
        }
    }

    /// Build a layer from explicit row-major weights and biases.
    pub fn from_weights(
        input_size: usize,
        output_size: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if weights.len() != input_size * output_size {
            return Err(Error::ElementCountMismatch {
                expected: input_size * output_size,
                got: weights.len(),
            });
        }
        if biases.len() != output_size {
            return Err(Error::ElementCountMismatch {
                expected: output_size,
                got: biases.len(),
            });
        }
        Ok(Self {
            input_size,
            output_size,
            weights,
            biases,
        })
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }
}

impl Layer for DenseLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        check_buffers(self, input, output, batch_size);

        for (x, y) in input
            .chunks_exact(self.input_size)
            .zip(output.chunks_exact_mut(self.output_size))
        {
            y.copy_from_slice(&self.biases);
            for (&xi, w_row) in x.iter().zip(self.weights.chunks_exact(self.output_size)) {
                if xi == 0.0 {
                    continue;
                }
                for (yj, &w) in y.iter_mut().zip(w_row) {
                    *yj += xi * w;
                }
            }
        }
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}
