//! Declarative network topologies
//!
//! A topology is an input shape plus an ordered list of layer specifications
//! with fixed hyperparameters. It can be written in JSON and loaded with
//! [`load_architecture`], or built in code. Validation walks the layers while
//! tracking the per-sample [`ActivationShape`], so every connection mismatch
//! is reported with the index of the offending layer before any weights are
//! allocated.
//!
//! Supported `layer_type` values and their fields:
//!
//! - **conv2d**: `out_channels`, `kernel_size`, optional `in_channels` (checked),
//!   `padding` (default 0), `stride` (default 1)
//! - **maxpool2d**: `pool_size`, optional `stride` (default `pool_size`)
//! - **flatten**: no fields
//! - **dense**: `output_size`, optional `input_size` (checked against the flattened input)
//! - **batchnorm**: optional `num_features` (checked), `epsilon` (default 1e-5),
//!   `momentum` (default 0.9)
//! - **activation**: `activation` = relu | leaky_relu | tanh | sigmoid, optional
//!   `negative_slope` for leaky_relu. The activation name may also be used
//!   directly as the `layer_type`.
//!
//! # Example
//!
//! ```json
//! {
//!   "input": { "channels": 3, "height": 32, "width": 32 },
//!   "layers": [
//!     { "layer_type": "conv2d", "in_channels": 3, "out_channels": 6, "kernel_size": 5 },
//!     { "layer_type": "relu" },
//!     { "layer_type": "maxpool2d", "pool_size": 2 },
//!     { "layer_type": "flatten" },
//!     { "layer_type": "dense", "input_size": 1176, "output_size": 10 }
//!   ]
//! }
//! ```

use crate::correlate::output_size;
use crate::error::{Error, Result};
use crate::layers::batchnorm::{DEFAULT_EPSILON, DEFAULT_MOMENTUM};
use crate::layers::{
    ActivationLayer, BatchNormLayer, Conv2DLayer, DenseLayer, FlattenLayer, Layer,
    MaxPool2DLayer,
};
use crate::network::Network;
use crate::utils::activations::{Activation, DEFAULT_LEAKY_SLOPE};
use crate::utils::SimpleRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Shape of one input sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct InputShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

/// Per-sample shape of the values flowing between two layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationShape {
    Spatial {
        channels: usize,
        height: usize,
        width: usize,
    },
    Flat(usize),
}

impl ActivationShape {
    /// Number of values per sample.
    pub fn len(&self) -> usize {
        match *self {
            ActivationShape::Spatial {
                channels,
                height,
                width,
            } => channels * height * width,
            ActivationShape::Flat(n) => n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of feature channels; each element of a flat vector is a channel.
    pub fn channels(&self) -> usize {
        match *self {
            ActivationShape::Spatial { channels, .. } => channels,
            ActivationShape::Flat(n) => n,
        }
    }
}

impl From<InputShape> for ActivationShape {
    fn from(shape: InputShape) -> Self {
        ActivationShape::Spatial {
            channels: shape.channels,
            height: shape.height,
            width: shape.width,
        }
    }
}

impl fmt::Display for ActivationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationShape::Spatial {
                channels,
                height,
                width,
            } => write!(f, "{}x{}x{}", channels, height, width),
            ActivationShape::Flat(n) => write!(f, "{}", n),
        }
    }
}

/// Configuration for a single layer.
///
/// Only the fields relevant to `layer_type` are read; see the module docs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LayerConfig {
    pub layer_type: String,

    // Conv2D
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_channels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_channels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<usize>,
    /// Shared by conv2d and maxpool2d.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stride: Option<usize>,

    // MaxPool2D
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,

    // Dense
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<usize>,

    // BatchNorm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_features: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum: Option<f32>,

    // Activation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_slope: Option<f32>,
}

impl LayerConfig {
    pub fn conv2d(in_channels: usize, out_channels: usize, kernel_size: usize) -> Self {
        Self {
            layer_type: "conv2d".to_string(),
            in_channels: Some(in_channels),
            out_channels: Some(out_channels),
            kernel_size: Some(kernel_size),
            ..Default::default()
        }
    }

    /// Set conv2d padding.
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Set conv2d / maxpool2d stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn maxpool2d(pool_size: usize) -> Self {
        Self {
            layer_type: "maxpool2d".to_string(),
            pool_size: Some(pool_size),
            ..Default::default()
        }
    }

    pub fn flatten() -> Self {
        Self {
            layer_type: "flatten".to_string(),
            ..Default::default()
        }
    }

    pub fn dense(input_size: usize, output_size: usize) -> Self {
        Self {
            layer_type: "dense".to_string(),
            input_size: Some(input_size),
            output_size: Some(output_size),
            ..Default::default()
        }
    }

    pub fn batchnorm(num_features: usize) -> Self {
        Self {
            layer_type: "batchnorm".to_string(),
            num_features: Some(num_features),
            ..Default::default()
        }
    }

    pub fn activation(name: &str) -> Self {
        Self {
            layer_type: "activation".to_string(),
            activation: Some(name.to_string()),
            ..Default::default()
        }
    }
}

/// Input shape plus the ordered layer list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArchitectureConfig {
    pub input: InputShape,
    pub layers: Vec<LayerConfig>,
}

impl ArchitectureConfig {
    /// The fixed CNN used throughout the demos, for 3×32×32 images and 10
    /// classes:
    ///
    /// conv(3→6, 5×5) → batchnorm → relu → maxpool(2) → conv(6→16, 5×5) → relu →
    /// maxpool(2) → flatten → dense(400→120) → relu → dense(120→84) → relu →
    /// dense(84→10)
    pub fn reference_cnn() -> Self {
        Self {
            input: InputShape {
                channels: 3,
                height: 32,
                width: 32,
            },
            layers: vec![
                LayerConfig::conv2d(3, 6, 5),
                LayerConfig::batchnorm(6),
                LayerConfig::activation("relu"),
                LayerConfig::maxpool2d(2),
                LayerConfig::conv2d(6, 16, 5),
                LayerConfig::activation("relu"),
                LayerConfig::maxpool2d(2),
                LayerConfig::flatten(),
                LayerConfig::dense(16 * 5 * 5, 120),
                LayerConfig::activation("relu"),
                LayerConfig::dense(120, 84),
                LayerConfig::activation("relu"),
                LayerConfig::dense(84, 10),
            ],
        }
    }
}

/// Loads and validates an architecture from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use rust_conv_networks::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/reference_cnn.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Checks an architecture and returns the output shape of every layer.
///
/// Checks that:
/// - the input shape and the layer list are non-empty
/// - every layer has the fields its type requires, with values in range
/// - declared channel counts and sizes match the incoming shape
/// - dense layers only follow a flatten (or another dense/flat layer)
///
/// # Errors
///
/// `InvalidConfig` naming the first offending layer.
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<Vec<ActivationShape>> {
    resolve_layers(config)
        .map(|resolved| resolved.into_iter().map(|(_, shape)| shape).collect())
}

/// Builds a [`Network`] from a validated architecture.
///
/// Weights come from `rng`, so the same seed always yields the same network.
pub fn build_model(config: &ArchitectureConfig, rng: &mut SimpleRng) -> Result<Network> {
    let resolved = resolve_layers(config)?;
    let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(resolved.len());
    let mut shapes = Vec::with_capacity(resolved.len());

    for (spec, shape) in resolved {
        layers.push(spec.instantiate(rng)?);
        shapes.push(shape);
    }

    Ok(Network::new(config.input.into(), layers, shapes))
}

/// A layer config with every default filled in and the incoming shape known.
#[derive(Debug, Clone, Copy)]
enum LayerSpec {
    Conv2d {
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        padding: usize,
        stride: usize,
        height: usize,
        width: usize,
    },
    MaxPool2d {
        channels: usize,
        height: usize,
        width: usize,
        pool_size: usize,
        stride: usize,
    },
    Flatten {
        channels: usize,
        height: usize,
        width: usize,
    },
    Dense {
        input_size: usize,
        output_size: usize,
    },
    BatchNorm {
        num_features: usize,
        spatial: usize,
        epsilon: f32,
        momentum: f32,
    },
    Activation {
        size: usize,
        activation: Activation,
    },
}

impl LayerSpec {
    fn instantiate(self, rng: &mut SimpleRng) -> Result<Box<dyn Layer>> {
        Ok(match self {
            LayerSpec::Conv2d {
                in_channels,
                out_channels,
                kernel_size,
                padding,
                stride,
                height,
                width,
            } => Box::new(Conv2DLayer::new(
                in_channels,
                out_channels,
                kernel_size,
                padding,
                stride,
                height,
                width,
                rng,
            )?),
            LayerSpec::MaxPool2d {
                channels,
                height,
                width,
                pool_size,
                stride,
            } => Box::new(MaxPool2DLayer::new(channels, height, width, pool_size, stride)?),
            LayerSpec::Flatten {
                channels,
                height,
                width,
            } => Box::new(FlattenLayer::new(channels, height, width)),
            LayerSpec::Dense {
                input_size,
                output_size,
            } => Box::new(DenseLayer::new(input_size, output_size, rng)),
            LayerSpec::BatchNorm {
                num_features,
                spatial,
                epsilon,
                momentum,
            } => Box::new(BatchNormLayer::new(num_features, spatial, epsilon, momentum)?),
            LayerSpec::Activation { size, activation } => {
                Box::new(ActivationLayer::new(size, activation))
            }
        })
    }
}

fn resolve_layers(config: &ArchitectureConfig) -> Result<Vec<(LayerSpec, ActivationShape)>> {
    let input = config.input;
    if input.channels == 0 || input.height == 0 || input.width == 0 {
        return Err(Error::config("input shape dimensions must be greater than 0"));
    }
    if config.layers.is_empty() {
        return Err(Error::config("Architecture must have at least one layer"));
    }

    let mut shape = ActivationShape::from(input);
    let mut resolved = Vec::with_capacity(config.layers.len());
    for (index, layer) in config.layers.iter().enumerate() {
        let (spec, next) = resolve_layer(layer, index, shape)?;
        resolved.push((spec, next));
        shape = next;
    }
    Ok(resolved)
}

fn require(value: Option<usize>, index: usize, kind: &str, field: &str) -> Result<usize> {
    match value {
        None => Err(Error::config(format!(
            "Layer {}: {} layer requires '{}'",
            index, kind, field
        ))),
        Some(0) => Err(Error::config(format!(
            "Layer {}: {} must be greater than 0",
            index, field
        ))),
        Some(v) => Ok(v),
    }
}

fn spatial_dims(
    shape: ActivationShape,
    index: usize,
    kind: &str,
) -> Result<(usize, usize, usize)> {
    match shape {
        ActivationShape::Spatial {
            channels,
            height,
            width,
        } => Ok((channels, height, width)),
        ActivationShape::Flat(_) => Err(Error::config(format!(
            "Layer {}: {} layer requires spatial input, got flat input of size {}",
            index, kind, shape
        ))),
    }
}

fn window_output(
    input: usize,
    window: usize,
    padding: usize,
    stride: usize,
    index: usize,
) -> Result<usize> {
    output_size(input, window, padding, stride)
        .map_err(|e| Error::config(format!("Layer {}: {}", index, e)))
}

fn resolve_layer(
    layer: &LayerConfig,
    index: usize,
    shape: ActivationShape,
) -> Result<(LayerSpec, ActivationShape)> {
    let layer_type = layer.layer_type.to_lowercase();

    match layer_type.as_str() {
        "conv2d" => {
            let (channels, height, width) = spatial_dims(shape, index, "Conv2D")?;
            let out_channels = require(layer.out_channels, index, "Conv2D", "out_channels")?;
            let kernel_size = require(layer.kernel_size, index, "Conv2D", "kernel_size")?;
            let padding = layer.padding.unwrap_or(0);
            let stride = layer.stride.unwrap_or(1);
            if stride == 0 {
                return Err(Error::config(format!(
                    "Layer {}: stride must be greater than 0",
                    index
                )));
            }
            if let Some(in_channels) = layer.in_channels {
                if in_channels != channels {
                    return Err(Error::config(format!(
                        "Layer connection mismatch: Layer {} expects {} input channels but receives {}",
                        index, in_channels, channels
                    )));
                }
            }

            let out_height = window_output(height, kernel_size, padding, stride, index)?;
            let out_width = window_output(width, kernel_size, padding, stride, index)?;
            Ok((
                LayerSpec::Conv2d {
                    in_channels: channels,
                    out_channels,
                    kernel_size,
                    padding,
                    stride,
                    height,
                    width,
                },
                ActivationShape::Spatial {
                    channels: out_channels,
                    height: out_height,
                    width: out_width,
                },
            ))
        }
        "maxpool2d" | "maxpool" => {
            let (channels, height, width) = spatial_dims(shape, index, "MaxPool2D")?;
            let pool_size = require(layer.pool_size, index, "MaxPool2D", "pool_size")?;
            let stride = layer.stride.unwrap_or(pool_size);
            let out_height = window_output(height, pool_size, 0, stride, index)?;
            let out_width = window_output(width, pool_size, 0, stride, index)?;
            Ok((
                LayerSpec::MaxPool2d {
                    channels,
                    height,
                    width,
                    pool_size,
                    stride,
                },
                ActivationShape::Spatial {
                    channels,
                    height: out_height,
                    width: out_width,
                },
            ))
        }
        "flatten" => {
            let (channels, height, width) = match shape {
                ActivationShape::Spatial {
                    channels,
                    height,
                    width,
                } => (channels, height, width),
                ActivationShape::Flat(n) => (n, 1, 1),
            };
            Ok((
                LayerSpec::Flatten {
                    channels,
                    height,
                    width,
                },
                ActivationShape::Flat(shape.len()),
            ))
        }
        "dense" | "linear" => {
            let input_size = match shape {
                ActivationShape::Flat(n) => n,
                ActivationShape::Spatial { .. } => {
                    return Err(Error::config(format!(
                        "Layer {}: Dense layer requires flat input, got {}; insert a flatten layer",
                        index, shape
                    )));
                }
            };
            let output_size = require(layer.output_size, index, "Dense", "output_size")?;
            if let Some(declared) = layer.input_size {
                if declared != input_size {
                    return Err(Error::config(format!(
                        "Layer connection mismatch: Layer {} input size ({}) does not match incoming size ({})",
                        index, declared, input_size
                    )));
                }
            }
            Ok((
                LayerSpec::Dense {
                    input_size,
                    output_size,
                },
                ActivationShape::Flat(output_size),
            ))
        }
        "batchnorm" => {
            let num_features = shape.channels();
            if let Some(declared) = layer.num_features {
                if declared != num_features {
                    return Err(Error::config(format!(
                        "Layer connection mismatch: Layer {} normalizes {} features but receives {}",
                        index, declared, num_features
                    )));
                }
            }
            let epsilon = layer.epsilon.unwrap_or(DEFAULT_EPSILON);
            if epsilon <= 0.0 {
                return Err(Error::config(format!(
                    "Layer {}: epsilon must be positive",
                    index
                )));
            }
            let momentum = layer.momentum.unwrap_or(DEFAULT_MOMENTUM);
            if !(0.0..=1.0).contains(&momentum) {
                return Err(Error::config(format!(
                    "Layer {}: momentum must be in range [0.0, 1.0]",
                    index
                )));
            }
            Ok((
                LayerSpec::BatchNorm {
                    num_features,
                    spatial: shape.len() / num_features,
                    epsilon,
                    momentum,
                },
                shape,
            ))
        }
        _ => {
            let name = if layer_type == "activation" {
                layer.activation.as_deref().ok_or_else(|| {
                    Error::config(format!(
                        "Layer {}: Activation layer requires 'activation'",
                        index
                    ))
                })?
            } else {
                layer_type.as_str()
            };

            let activation = match name.parse::<Activation>() {
                Ok(Activation::LeakyRelu(_)) => {
                    let slope = layer.negative_slope.unwrap_or(DEFAULT_LEAKY_SLOPE);
                    if slope < 0.0 {
                        return Err(Error::config(format!(
                            "Layer {}: negative_slope must be non-negative",
                            index
                        )));
                    }
                    Activation::LeakyRelu(slope)
                }
                Ok(activation) => activation,
                Err(_) if layer_type == "activation" => {
                    return Err(Error::config(format!(
                        "Layer {}: Invalid activation function '{}'. Must be one of: {}",
                        index,
                        name,
                        Activation::NAMES.join(", ")
                    )));
                }
                Err(_) => {
                    return Err(Error::config(format!(
                        "Layer {}: Invalid layer type '{}'. Must be one of: conv2d, maxpool2d, flatten, dense, batchnorm, activation",
                        index, layer.layer_type
                    )));
                }
            };

            Ok((
                LayerSpec::Activation {
                    size: shape.len(),
                    activation,
                },
                shape,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch(
        channels: usize,
        height: usize,
        width: usize,
        layers: Vec<LayerConfig>,
    ) -> ArchitectureConfig {
        ArchitectureConfig {
            input: InputShape {
                channels,
                height,
                width,
            },
            layers,
        }
    }

    #[test]
    fn test_reference_cnn_shapes() {
        let shapes = validate_architecture(&ArchitectureConfig::reference_cnn()).unwrap();
        let spatial = |c, h, w| ActivationShape::Spatial {
            channels: c,
            height: h,
            width: w,
        };

        assert_eq!(shapes[0], spatial(6, 28, 28));
        assert_eq!(shapes[3], spatial(6, 14, 14));
        assert_eq!(shapes[4], spatial(16, 10, 10));
        assert_eq!(shapes[6], spatial(16, 5, 5));
        assert_eq!(shapes[7], ActivationShape::Flat(400));
        assert_eq!(*shapes.last().unwrap(), ActivationShape::Flat(10));
    }

    #[test]
    fn test_validate_empty_architecture() {
        assert!(validate_architecture(&arch(1, 4, 4, vec![])).is_err());
    }

    #[test]
    fn test_validate_zero_input() {
        let config = arch(0, 4, 4, vec![LayerConfig::flatten()]);
        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_conv_missing_kernel_size() {
        let mut conv = LayerConfig::conv2d(1, 4, 3);
        conv.kernel_size = None;
        let err = validate_architecture(&arch(1, 8, 8, vec![conv])).unwrap_err();
        assert!(err.to_string().contains("kernel_size"));
    }

    #[test]
    fn test_conv_channel_mismatch() {
        let config = arch(3, 8, 8, vec![LayerConfig::conv2d(1, 4, 3)]);
        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("Layer 0"));
    }

    #[test]
    fn test_conv_padding_and_stride() {
        let config = arch(
            3,
            32,
            32,
            vec![LayerConfig::conv2d(3, 8, 5).with_padding(2).with_stride(2)],
        );
        let shapes = validate_architecture(&config).unwrap();
        assert_eq!(
            shapes[0],
            ActivationShape::Spatial {
                channels: 8,
                height: 16,
                width: 16
            }
        );
    }

    #[test]
    fn test_dense_requires_flatten() {
        let config = arch(1, 2, 2, vec![LayerConfig::dense(4, 2)]);
        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("flatten"));
    }

    #[test]
    fn test_dense_size_mismatch() {
        let config = arch(
            1,
            2,
            2,
            vec![LayerConfig::flatten(), LayerConfig::dense(5, 2)],
        );
        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_conv_after_flatten_rejected() {
        let config = arch(
            1,
            4,
            4,
            vec![LayerConfig::flatten(), LayerConfig::conv2d(1, 1, 3)],
        );
        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_pool_window_too_large() {
        let config = arch(1, 3, 3, vec![LayerConfig::maxpool2d(4)]);
        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_batchnorm_feature_mismatch() {
        let config = arch(2, 4, 4, vec![LayerConfig::batchnorm(3)]);
        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_batchnorm_flat_input() {
        let config = arch(
            1,
            2,
            2,
            vec![LayerConfig::flatten(), LayerConfig::batchnorm(4)],
        );
        assert!(validate_architecture(&config).is_ok());
    }

    #[test]
    fn test_activation_shorthand_and_invalid_names() {
        let tanh = LayerConfig {
            layer_type: "tanh".to_string(),
            ..Default::default()
        };
        assert!(validate_architecture(&arch(1, 2, 2, vec![tanh])).is_ok());

        let unknown = LayerConfig {
            layer_type: "dropout".to_string(),
            ..Default::default()
        };
        let err = validate_architecture(&arch(1, 2, 2, vec![unknown])).unwrap_err();
        assert!(err.to_string().contains("Invalid layer type"));

        let bad_activation = LayerConfig::activation("swish");
        let err = validate_architecture(&arch(1, 2, 2, vec![bad_activation])).unwrap_err();
        assert!(err.to_string().contains("Invalid activation function"));
    }

    #[test]
    fn test_build_model_parameter_count() {
        let mut rng = SimpleRng::new(42);
        let network = build_model(&ArchitectureConfig::reference_cnn(), &mut rng).unwrap();

        let expected = (6 * 3 * 25 + 6)
            + 12
            + (16 * 6 * 25 + 16)
            + (400 * 120 + 120)
            + (120 * 84 + 84)
            + (84 * 10 + 10);
        assert_eq!(network.total_parameters(), expected);
        assert_eq!(network.len(), 13);
    }
}
