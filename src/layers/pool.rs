//! Max pooling over each channel plane.

use crate::correlate::output_size;
use crate::error::Result;
use crate::layers::r#trait::check_buffers;
use crate::layers::Layer;

/// 2D max pooling with a square window.
///
/// Output size per axis follows the convolution formula with no padding:
/// (input - pool_size) / stride + 1.
pub struct MaxPool2DLayer {
    channels: usize,
    input_height: usize,
    input_width: usize,
    pool_size: usize,
    stride: usize,
    output_height: usize,
    output_width: usize,
}

impl MaxPool2DLayer {
    /// # Errors
    ///
    /// Fails when the stride is zero or the window does not fit the input.
    pub fn new(
        channels: usize,
        input_height: usize,
        input_width: usize,
        pool_size: usize,
        stride: usize,
    ) -> Result<Self> {
        let output_height = output_size(input_height, pool_size, 0, stride)?;
        let output_width = output_size(input_width, pool_size, 0, stride)?;
        Ok(Self {
            channels,
            input_height,
            input_width,
            pool_size,
            stride,
            output_height,
            output_width,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn output_height(&self) -> usize {
        self.output_height
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }
}

impl Layer for MaxPool2DLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        check_buffers(self, input, output, batch_size);

        let in_plane = self.input_height * self.input_width;
        let out_plane = self.output_height * self.output_width;

        // Every (sample, channel) pair is an independent plane.
        for (src, dst) in input
            .chunks_exact(in_plane)
            .zip(output.chunks_exact_mut(out_plane))
        {
            for py in 0..self.output_height {
                for px in 0..self.output_width {
                    let y0 = py * self.stride;
                    let x0 = px * self.stride;

                    let mut best = f32::NEG_INFINITY;
                    for dy in 0..self.pool_size {
                        let row = (y0 + dy) * self.input_width + x0;
                        for &v in &src[row..row + self.pool_size] {
                            if v > best {
                                best = v;
                            }
                        }
                    }

                    dst[py * self.output_width + px] = best;
                }
            }
        }
    }

    fn input_size(&self) -> usize {
        self.channels * self.input_height * self.input_width
    }

    fn output_size(&self) -> usize {
        self.channels * self.output_height * self.output_width
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "maxpool2d"
    }
}
