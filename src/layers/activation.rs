//! Element-wise activation as a standalone layer.

use crate::layers::r#trait::check_buffers;
use crate::layers::Layer;
use crate::utils::Activation;

/// Applies an [`Activation`] to every element; the shape is unchanged.
pub struct ActivationLayer {
    size: usize,
    activation: Activation,
}

impl ActivationLayer {
    pub fn new(size: usize, activation: Activation) -> Self {
        Self { size, activation }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl Layer for ActivationLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        check_buffers(self, input, output, batch_size);
        output.copy_from_slice(input);
        self.activation.apply_inplace(output);
    }

    fn input_size(&self) -> usize {
        self.size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        match self.activation {
            Activation::Relu => "relu",
            Activation::LeakyRelu(_) => "leaky_relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
        }
    }
}
