//! Flatten `[C, H, W]` samples into `[C·H·W]`.
//!
//! Buffers are already stored flat, so the forward pass is a copy; the layer
//! exists to mark the point in a topology where spatial structure ends and
//! fully connected layers may follow.

use crate::layers::r#trait::check_buffers;
use crate::layers::Layer;

pub struct FlattenLayer {
    size: usize,
}

impl FlattenLayer {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            size: channels * height * width,
        }
    }
}

impl Layer for FlattenLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        check_buffers(self, input, output, batch_size);
        output.copy_from_slice(input);
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
        "flatten"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_preserves_values() {
        let layer = FlattenLayer::new(2, 2, 2);
        let input: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let mut output = vec![0.0f32; 16];
        layer.forward(&input, &mut output, 2);
        assert_eq!(output, input);
        assert_eq!(layer.output_size(), 8);
    }
}
