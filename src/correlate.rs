//! Manual 2D correlation
//!
//! This module computes a convolution the way it is usually drawn on a
//! whiteboard: zero-pad the input, then slide the kernel over it and take the
//! element-wise product sum of every receptive-field window. Like most deep
//! learning frameworks the kernel is not flipped, so strictly speaking this is
//! a cross-correlation.
//!
//! The loops are deliberately direct: O(out_h × out_w × channels × k²) with no
//! im2col, FFT or tiling.
//!
//! # Example
//!
//! ```
//! use rust_conv_networks::correlate::{correlate2d, Volume};
//!
//! let input = Volume::from_vec(1, 3, 3, vec![1., 2., 3., 4., 5., 6., 7., 8., 9.]).unwrap();
//! let kernel = Volume::from_vec(1, 2, 2, vec![1., 0., 0., 1.]).unwrap();
//! let map = correlate2d(&input, &kernel, 1, 0).unwrap();
//! assert_eq!((map.height(), map.width()), (2, 2));
//! assert_eq!(map.get(0, 0), 1.0 + 5.0);
//! ```

use crate::error::{Error, Result};
use crate::utils::SimpleRng;

/// A `channels × height × width` block of values stored channel-major.
///
/// Used both for input images and for correlation kernels.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Volume {
    /// Volume filled with zeros.
    pub fn zeros(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
            data: vec![0.0f32; channels * height * width],
        }
    }

    /// Wrap an existing buffer, checking that its length matches the shape.
    pub fn from_vec(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        let expected = channels * height * width;
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            channels,
            height,
            width,
            data,
        })
    }

    /// Volume with every element drawn uniformly from `[low, high)`.
    pub fn uniform(
        channels: usize,
        height: usize,
        width: usize,
        low: f32,
        high: f32,
        rng: &mut SimpleRng,
    ) -> Self {
        Self {
            channels,
            height,
            width,
            data: rng.uniform_vec(channels * height * width, low, high),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at channel `c`, row `y`, column `x`.
    pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[self.index(c, y, x)]
    }

    fn index(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.height + y) * self.width + x
    }

    /// Surround every channel plane with `padding` zeros on each spatial side.
    ///
    /// The result has shape `channels × (height + 2p) × (width + 2p)`.
    pub fn zero_pad(&self, padding: usize) -> Volume {
        if padding == 0 {
            return self.clone();
        }
        Self::padded_from_slice(self.channels, self.height, self.width, &self.data, padding)
    }

    /// Zero-pad a raw `channels × height × width` slice into a new volume.
    ///
    /// Callers guarantee `data.len() == channels * height * width`.
    pub(crate) fn padded_from_slice(
        channels: usize,
        height: usize,
        width: usize,
        data: &[f32],
        padding: usize,
    ) -> Volume {
        debug_assert_eq!(data.len(), channels * height * width);
        let mut padded = Volume::zeros(channels, height + 2 * padding, width + 2 * padding);
        for (c, plane) in data.chunks_exact(height * width).enumerate() {
            for (y, row) in plane.chunks_exact(width).enumerate() {
                let dst = padded.index(c, y + padding, padding);
                padded.data[dst..dst + width].copy_from_slice(row);
            }
        }
        padded
    }
}

/// Single-channel output plane of a correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl FeatureMap {
    /// Wrap a row-major `height × width` buffer.
    pub fn from_vec(height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != height * width {
            return Err(Error::ElementCountMismatch {
                expected: height * width,
                got: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at row `y`, column `x`.
    pub fn get(&self, y: usize, x: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Smallest and largest value, or `None` for an empty map.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let first = *self.data.first()?;
        Some(self.data.iter().fold((first, first), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
    }
}

/// Output spatial size along one axis.
///
/// Calculated as: (input + 2*padding - kernel) / stride + 1
///
/// # Errors
///
/// `InvalidStride` when `stride == 0`, `KernelTooLarge` when the kernel does
/// not fit inside the padded input.
pub fn output_size(input: usize, kernel: usize, padding: usize, stride: usize) -> Result<usize> {
    if stride == 0 {
        return Err(Error::InvalidStride);
    }
    if kernel == 0 {
        return Err(Error::config("kernel size must be greater than 0"));
    }
    let padded = input + 2 * padding;
    if kernel > padded {
        return Err(Error::KernelTooLarge { kernel, padded });
    }
    Ok((padded - kernel) / stride + 1)
}

/// Correlate `kernel` over `input` after zero-padding it by `padding`.
///
/// Every output cell `(oy, ox)` is the sum over all channels of the
/// element-wise product between the kernel and the padded window whose
/// top-left corner sits at `(oy * stride, ox * stride)`.
///
/// # Errors
///
/// Returns `ChannelMismatch` if the kernel depth differs from the input depth,
/// plus any error from [`output_size`] for either spatial axis.
pub fn correlate2d(
    input: &Volume,
    kernel: &Volume,
    stride: usize,
    padding: usize,
) -> Result<FeatureMap> {
    if input.channels != kernel.channels {
        return Err(Error::ChannelMismatch {
            input: input.channels,
            kernel: kernel.channels,
        });
    }

    let out_h = output_size(input.height, kernel.height, padding, stride)?;
    let out_w = output_size(input.width, kernel.width, padding, stride)?;
    let padded = input.zero_pad(padding);

    let mut data = vec![0.0f32; out_h * out_w];
    correlate_padded_into(&padded, kernel, stride, &mut data, out_w);

    Ok(FeatureMap {
        height: out_h,
        width: out_w,
        data,
    })
}

/// Sliding-window product sums of `kernel` over an already padded volume.
///
/// `out` holds `out.len() / out_w` rows of `out_w` cells. The caller has
/// checked channel counts and computed the output size with [`output_size`],
/// so every window lies inside `padded`.
pub(crate) fn correlate_padded_into(
    padded: &Volume,
    kernel: &Volume,
    stride: usize,
    out: &mut [f32],
    out_w: usize,
) {
    debug_assert_eq!(padded.channels, kernel.channels);
    for (oy, out_row) in out.chunks_exact_mut(out_w).enumerate() {
        for (ox, cell) in out_row.iter_mut().enumerate() {
            let y0 = oy * stride;
            let x0 = ox * stride;
            let mut sum = 0.0f32;

            for c in 0..kernel.channels {
                for ky in 0..kernel.height {
                    let row = padded.index(c, y0 + ky, x0);
                    let krow = kernel.index(c, ky, 0);
                    let window = &padded.data[row..row + kernel.width];
                    let weights = &kernel.data[krow..krow + kernel.width];
                    sum += window
                        .iter()
                        .zip(weights)
                        .map(|(a, b)| a * b)
                        .sum::<f32>();
                }
            }

            *cell = sum;
        }
    }
}
