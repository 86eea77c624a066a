//! Batch normalization layer
//!
//! Normalizes each channel to zero mean and unit variance, then applies a
//! learnable scale (gamma) and shift (beta):
//!
//! 1. Compute statistics per channel: mean μ and variance σ²
//! 2. Normalize: x_norm = (x - μ) / sqrt(σ² + ε)
//! 3. Scale and shift: y = γ * x_norm + β
//!
//! For a spatial input `[C, H, W]` the statistics of channel `c` are taken over
//! the batch and all `H × W` positions. A flat input of `n` features is the
//! special case `C = n`, `H × W = 1`.
//!
//! In training mode the layer uses batch statistics and folds them into
//! running estimates with an exponential moving average; in inference mode it
//! normalizes with the running estimates instead.
//!
//! # References
//!
//! Ioffe, S., & Szegedy, C. (2015). Batch Normalization: Accelerating Deep Network Training
//! by Reducing Internal Covariate Shift. ICML.

use crate::error::{Error, Result};
use crate::layers::r#trait::check_buffers;
use crate::layers::Layer;
use std::cell::RefCell;

/// Default ε added to the variance.
pub const DEFAULT_EPSILON: f32 = 1e-5;
/// Default weight of the previous running estimate.
pub const DEFAULT_MOMENTUM: f32 = 0.9;

/// Per-channel batch normalization.
///
/// # Example
///
/// ```
/// use rust_conv_networks::layers::{BatchNormLayer, Layer};
///
/// let layer = BatchNormLayer::new(6, 28 * 28, 1e-5, 0.9).unwrap();
/// assert_eq!(layer.input_size(), 6 * 28 * 28);
/// assert_eq!(layer.parameter_count(), 12); // 6 gamma + 6 beta
/// assert!(layer.is_training());
/// ```
pub struct BatchNormLayer {
    num_features: usize,
    spatial: usize,
    epsilon: f32,
    momentum: f32,
    training: bool,

    gamma: Vec<f32>,
    beta: Vec<f32>,

    // Updated from `forward(&self, ..)` while training
    running_mean: RefCell<Vec<f32>>,
    running_var: RefCell<Vec<f32>>,
}

impl BatchNormLayer {
    /// Creates a layer for `num_features` channels of `spatial` values each.
    ///
    /// Gamma starts at 1.0, beta at 0.0, running mean at 0.0 and running
    /// variance at 1.0. The layer starts in training mode.
    ///
    /// # Errors
    ///
    /// `epsilon` must be positive and `momentum` must lie in [0.0, 1.0].
    pub fn new(num_features: usize, spatial: usize, epsilon: f32, momentum: f32) -> Result<Self> {
        if num_features == 0 || spatial == 0 {
            return Err(Error::config("BatchNorm sizes must be greater than 0"));
        }
        if epsilon <= 0.0 {
            return Err(Error::config("epsilon must be positive"));
        }
        if !(0.0..=1.0).contains(&momentum) {
            return Err(Error::config("momentum must be in range [0.0, 1.0]"));
        }

        Ok(Self {
            num_features,
            spatial,
            epsilon,
            momentum,
            training: true,
            gamma: vec![1.0f32; num_features],
            beta: vec![0.0f32; num_features],
            running_mean: RefCell::new(vec![0.0f32; num_features]),
            running_var: RefCell::new(vec![1.0f32; num_features]),
        })
    }

    /// Replace gamma and beta.
    pub fn with_affine(mut self, gamma: Vec<f32>, beta: Vec<f32>) -> Result<Self> {
        for params in [&gamma, &beta] {
            if params.len() != self.num_features {
                return Err(Error::ElementCountMismatch {
                    expected: self.num_features,
                    got: params.len(),
                });
            }
        }
        self.gamma = gamma;
        self.beta = beta;
        Ok(self)
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn gamma(&self) -> &[f32] {
        &self.gamma
    }

    pub fn beta(&self) -> &[f32] {
        &self.beta
    }

    pub fn running_mean(&self) -> Vec<f32> {
        self.running_mean.borrow().clone()
    }

    pub fn running_var(&self) -> Vec<f32> {
        self.running_var.borrow().clone()
    }

    /// Mean and biased variance of every channel over batch and positions.
    fn batch_statistics(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let mut mean = vec![0.0f32; self.num_features];
        let mut var = vec![0.0f32; self.num_features];
        let mut count = 0usize;

        for sample in input.chunks_exact(self.input_size()) {
            for (c, plane) in sample.chunks_exact(self.spatial).enumerate() {
                mean[c] += plane.iter().sum::<f32>();
            }
            count += self.spatial;
        }
        for m in &mut mean {
            *m /= count as f32;
        }

        for sample in input.chunks_exact(self.input_size()) {
            for (c, plane) in sample.chunks_exact(self.spatial).enumerate() {
                var[c] += plane.iter().map(|&x| (x - mean[c]) * (x - mean[c])).sum::<f32>();
            }
        }
        for v in &mut var {
            *v /= count as f32;
        }

        (mean, var)
    }
}

impl Layer for BatchNormLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        check_buffers(self, input, output, batch_size);
        if batch_size == 0 {
            // No statistics to take; leave the running estimates alone.
            return;
        }

        let (mean, var) = if self.training {
            let (mean, var) = self.batch_statistics(input);

            // running = momentum * running + (1 - momentum) * batch
            let mut running_mean = self.running_mean.borrow_mut();
            let mut running_var = self.running_var.borrow_mut();
            for c in 0..self.num_features {
                running_mean[c] = self.momentum * running_mean[c] + (1.0 - self.momentum) * mean[c];
                running_var[c] = self.momentum * running_var[c] + (1.0 - self.momentum) * var[c];
            }
            (mean, var)
        } else {
            (self.running_mean(), self.running_var())
        };

        let inv_std: Vec<f32> = var
            .iter()
            .map(|&v| 1.0 / (v + self.epsilon).sqrt())
            .collect();

        // Planes cycle through the channels sample after sample.
        for (i, (src, dst)) in input
            .chunks_exact(self.spatial)
            .zip(output.chunks_exact_mut(self.spatial))
            .enumerate()
        {
            let c = i % self.num_features;
            for (y, &x) in dst.iter_mut().zip(src) {
                *y = self.gamma[c] * (x - mean[c]) * inv_std[c] + self.beta[c];
            }
        }
    }

    fn input_size(&self) -> usize {
        self.num_features * self.spatial
    }

    fn output_size(&self) -> usize {
        self.num_features * self.spatial
    }

    /// gamma + beta; running statistics are not trainable.
    fn parameter_count(&self) -> usize {
        self.gamma.len() + self.beta.len()
    }

    fn name(&self) -> &'static str {
        "batchnorm"
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}
