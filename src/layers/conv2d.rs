//! Custom 2D convolution layer
//!
//! `Conv2DLayer` is the "write your own convolution layer" exercise: it owns
//! one [`Volume`] filter and one bias per output channel and produces each
//! feature map by running the manual
//! [`correlate2d`](crate::correlate::correlate2d) routine over the sample.

use crate::correlate::{correlate_padded_into, output_size, Volume};
use crate::error::{Error, Result};
use crate::layers::r#trait::check_buffers;
use crate::layers::Layer;
use crate::utils::SimpleRng;
use log::debug;

/// 2D convolution layer with square kernels, zero padding and stride.
///
/// # Fields
///
/// * `in_channels` - Number of input channels (e.g., 3 for RGB)
/// * `input_height` - Height of input feature map
/// * `input_width` - Width of input feature map
/// * `padding` - Zero-padding applied to each spatial side
/// * `stride` - Step between consecutive kernel positions
/// * `filters` - One `in_channels × kernel_size × kernel_size` volume per output channel
/// * `biases` - Bias for each output channel
///
/// # Example
///
/// ```
/// use rust_conv_networks::layers::{Conv2DLayer, Layer};
/// use rust_conv_networks::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// // 3 input channels, 6 filters, 5x5 kernel, no padding, stride 1, 32x32 input
/// let layer = Conv2DLayer::new(3, 6, 5, 0, 1, 32, 32, &mut rng).unwrap();
/// assert_eq!(layer.output_height(), 28);
/// assert_eq!(layer.parameter_count(), 6 * 3 * 5 * 5 + 6);
/// ```
pub struct Conv2DLayer {
    in_channels: usize,
    kernel_size: usize,
    padding: usize,
    stride: usize,
    input_height: usize,
    input_width: usize,
    output_height: usize,
    output_width: usize,
    filters: Vec<Volume>,
    biases: Vec<f32>,
}

impl Conv2DLayer {
    /// Create a layer with Xavier-uniform filters and zero biases.
    ///
    /// limit = sqrt(6 / (fan_in + fan_out)) with
    /// fan_in = in_channels × k² and fan_out = out_channels × k².
    ///
    /// # Errors
    ///
    /// Fails when any size is zero, the stride is zero, or the kernel does not
    /// fit inside the padded input.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        padding: usize,
        stride: usize,
        input_height: usize,
        input_width: usize,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        let fan_in = (in_channels * kernel_size * kernel_size) as f32;
        let fan_out = (out_channels * kernel_size * kernel_size) as f32;
        let limit = (6.0f32 / (fan_in + fan_out)).sqrt();

        let filters = (0..out_channels)
            .map(|_| Volume::uniform(in_channels, kernel_size, kernel_size, -limit, limit, rng))
            .collect();

        Self::assemble(
            in_channels,
            kernel_size,
            padding,
            stride,
            input_height,
            input_width,
            filters,
            vec![0.0f32; out_channels],
        )
    }

    /// Build a layer from explicit filters and biases.
    ///
    /// All filters must share the same square shape; the number of biases
    /// must equal the number of filters.
    pub fn from_weights(
        filters: Vec<Volume>,
        biases: Vec<f32>,
        padding: usize,
        stride: usize,
        input_height: usize,
        input_width: usize,
    ) -> Result<Self> {
        let first = filters
            .first()
            .ok_or_else(|| Error::config("Conv2D layer needs at least one filter"))?;
        let (in_channels, kernel_size) = (first.channels(), first.height());

        for filter in &filters {
            if filter.height() != filter.width() {
                return Err(Error::config(format!(
                    "Conv2D filters must be square, got {}x{}",
                    filter.height(),
                    filter.width()
                )));
            }
            if filter.channels() != in_channels || filter.height() != kernel_size {
                return Err(Error::config(
                    "Conv2D filters must all have the same shape",
                ));
            }
        }

        Self::assemble(
            in_channels,
            kernel_size,
            padding,
            stride,
            input_height,
            input_width,
            filters,
            biases,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        in_channels: usize,
        kernel_size: usize,
        padding: usize,
        stride: usize,
        input_height: usize,
        input_width: usize,
        filters: Vec<Volume>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if in_channels == 0 || filters.is_empty() {
            return Err(Error::config(
                "Conv2D layer needs at least one input and one output channel",
            ));
        }
        if biases.len() != filters.len() {
            return Err(Error::ElementCountMismatch {
                expected: filters.len(),
                got: biases.len(),
            });
        }

        let output_height = output_size(input_height, kernel_size, padding, stride)?;
        let output_width = output_size(input_width, kernel_size, padding, stride)?;

        Ok(Self {
            in_channels,
            kernel_size,
            padding,
            stride,
            input_height,
            input_width,
            output_height,
            output_width,
            filters,
            biases,
        })
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    /// Number of filters, i.e. output feature maps.
    pub fn out_channels(&self) -> usize {
        self.filters.len()
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn padding(&self) -> usize {
        self.padding
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

    pub fn filters(&self) -> &[Volume] {
        &self.filters
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }
}

impl Layer for Conv2DLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        check_buffers(self, input, output, batch_size);
        debug!(
            "conv2d forward: batch={} {}x{}x{} -> {}x{}x{}",
            batch_size,
            self.in_channels,
            self.input_height,
            self.input_width,
            self.out_channels(),
            self.output_height,
            self.output_width
        );

        let in_len = self.input_size();
        let out_spatial = self.output_height * self.output_width;

        for (sample_in, sample_out) in input
            .chunks_exact(in_len)
            .zip(output.chunks_exact_mut(self.output_size()))
        {
            // Pad once per sample; every filter reads the same padded volume.
            let padded = Volume::padded_from_slice(
                self.in_channels,
                self.input_height,
                self.input_width,
                sample_in,
                self.padding,
            );

            for ((filter, &bias), plane) in self
                .filters
                .iter()
                .zip(&self.biases)
                .zip(sample_out.chunks_exact_mut(out_spatial))
            {
                correlate_padded_into(&padded, filter, self.stride, plane, self.output_width);
                for out in plane.iter_mut() {
                    *out += bias;
                }
            }
        }
    }

    fn input_size(&self) -> usize {
        self.in_channels * self.input_height * self.input_width
    }

    fn output_size(&self) -> usize {
        self.out_channels() * self.output_height * self.output_width
    }

    fn parameter_count(&self) -> usize {
        self.filters.iter().map(Volume::len).sum::<usize>() + self.biases.len()
    }

    fn name(&self) -> &'static str {
        "conv2d"
    }
}
