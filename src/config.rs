//! Configuration for the demo programs
//!
//! Each demo reads a small JSON file. Optional fields fall back to the
//! defaults documented on the accessor methods, so a minimal file only names
//! the required sizes.

use crate::correlate::output_size;
use crate::error::{Error, Result};
use crate::utils::Activation;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Seed used when a config does not set one.
pub const DEFAULT_SEED: u64 = 42;

/// Settings for the manual correlation demo.
///
/// # Example
///
/// ```json
/// {
///   "channels": 3,
///   "height": 32,
///   "width": 32,
///   "kernel_size": 5,
///   "padding": 2,
///   "stride": 1,
///   "seed": 7,
///   "heatmap_path": "correlation.png"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    /// Channels of both the image and the kernel
    pub channels: usize,
    pub height: usize,
    pub width: usize,

    /// Side length of the square kernel
    pub kernel_size: usize,

    pub padding: Option<usize>,
    pub stride: Option<usize>,
    pub seed: Option<u64>,

    /// Where to write the rendered feature map; nothing is rendered when unset
    pub heatmap_path: Option<String>,
}

impl CorrelationConfig {
    /// Zero padding on each side, default 0.
    pub fn padding(&self) -> usize {
        self.padding.unwrap_or(0)
    }

    /// Default 1.
    pub fn stride(&self) -> usize {
        self.stride.unwrap_or(1)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

impl Default for CorrelationConfig {
    /// 3×32×32 image, 3×5×5 kernel, padding 2, stride 1.
    fn default() -> Self {
        Self {
            channels: 3,
            height: 32,
            width: 32,
            kernel_size: 5,
            padding: Some(2),
            stride: Some(1),
            seed: Some(DEFAULT_SEED),
            heatmap_path: Some("correlation_heatmap.png".to_string()),
        }
    }
}

/// Settings for the recurrent sequence demo.
///
/// `nonlinearity` is `"tanh"` (default) or `"relu"`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecurrentConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub seq_len: usize,
    pub batch_size: Option<usize>,
    pub seed: Option<u64>,
    pub nonlinearity: Option<String>,
}

impl RecurrentConfig {
    /// Default 1.
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(1)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// The configured nonlinearity; only tanh and relu are accepted.
    pub fn activation(&self) -> Result<Activation> {
        match self.nonlinearity.as_deref() {
            None => Ok(Activation::Tanh),
            Some(name) => match name.parse::<Activation>()? {
                activation @ (Activation::Tanh | Activation::Relu) => Ok(activation),
                _ => Err(Error::config(format!(
                    "Invalid nonlinearity '{}'. Must be one of: tanh, relu",
                    name
                ))),
            },
        }
    }
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self {
            input_size: 1,
            hidden_size: 8,
            seq_len: 20,
            batch_size: Some(1),
            seed: Some(DEFAULT_SEED),
            nonlinearity: Some("tanh".to_string()),
        }
    }
}

/// Loads a correlation demo configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use rust_conv_networks::config::load_correlation_config;
///
/// let cfg = load_correlation_config("config/correlation_demo.json").unwrap();
/// assert_eq!(cfg.kernel_size, 5);
/// ```
pub fn load_correlation_config(path: impl AsRef<Path>) -> Result<CorrelationConfig> {
    let contents = fs::read_to_string(path)?;
    let config: CorrelationConfig = serde_json::from_str(&contents)?;
    validate_correlation_config(&config)?;
    Ok(config)
}

/// Loads a recurrent demo configuration from a JSON file.
pub fn load_recurrent_config(path: impl AsRef<Path>) -> Result<RecurrentConfig> {
    let contents = fs::read_to_string(path)?;
    let config: RecurrentConfig = serde_json::from_str(&contents)?;
    validate_recurrent_config(&config)?;
    Ok(config)
}

pub fn validate_correlation_config(config: &CorrelationConfig) -> Result<()> {
    if config.channels == 0 || config.height == 0 || config.width == 0 {
        return Err(Error::config(
            "channels, height and width must be greater than 0",
        ));
    }
    if config.kernel_size == 0 {
        return Err(Error::config("kernel_size must be greater than 0"));
    }
    if config.stride == Some(0) {
        return Err(Error::config("stride must be greater than 0"));
    }

    // The kernel has to fit in both padded dimensions.
    for dim in [config.height, config.width] {
        output_size(dim, config.kernel_size, config.padding(), config.stride())
            .map_err(|e| Error::config(e.to_string()))?;
    }

    if let Some(path) = &config.heatmap_path {
        if path.trim().is_empty() {
            return Err(Error::config("heatmap_path must not be empty"));
        }
    }
    Ok(())
}

pub fn validate_recurrent_config(config: &RecurrentConfig) -> Result<()> {
    if config.input_size == 0 {
        return Err(Error::config("input_size must be greater than 0"));
    }
    if config.hidden_size == 0 {
        return Err(Error::config("hidden_size must be greater than 0"));
    }
    if config.seq_len == 0 {
        return Err(Error::config("seq_len must be greater than 0"));
    }
    if config.batch_size == Some(0) {
        return Err(Error::config("batch_size must be greater than 0"));
    }
    config.activation()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_defaults_are_valid() {
        let config = CorrelationConfig::default();
        assert!(validate_correlation_config(&config).is_ok());
        assert_eq!(config.padding(), 2);
    }

    #[test]
    fn test_correlation_kernel_too_large() {
        let config = CorrelationConfig {
            kernel_size: 9,
            padding: Some(0),
            height: 8,
            ..CorrelationConfig::default()
        };
        assert!(validate_correlation_config(&config).is_err());
    }

    #[test]
    fn test_recurrent_nonlinearity() {
        let mut config = RecurrentConfig::default();
        assert_eq!(config.activation().unwrap(), Activation::Tanh);

        config.nonlinearity = Some("ReLU".to_string());
        assert_eq!(config.activation().unwrap(), Activation::Relu);

        config.nonlinearity = Some("sigmoid".to_string());
        assert!(validate_recurrent_config(&config).is_err());
    }
}
