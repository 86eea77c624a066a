//! Tests for configuration parsing
//!
//! This file tests the config module including:
//! - Loading the shipped demo configs
//! - Defaults for missing optional fields
//! - Handling invalid JSON, missing files and out-of-range values

use rust_conv_networks::config::{
    load_correlation_config, load_recurrent_config, CorrelationConfig, RecurrentConfig,
    DEFAULT_SEED,
};
use rust_conv_networks::utils::Activation;
use rust_conv_networks::Error;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

// ============================================================================
// Correlation Config Tests
// ============================================================================

mod correlation_config_tests {
    use super::*;

    #[test]
    fn test_load_shipped_correlation_config() {
        let config = load_correlation_config("config/correlation_demo.json")
            .expect("Failed to load correlation config");

        assert_eq!((config.channels, config.height, config.width), (3, 32, 32));
        assert_eq!(config.kernel_size, 5);
        assert_eq!(config.padding(), 2);
        assert_eq!(config.stride(), 1);
        assert_eq!(config.seed(), 7);
    }

    #[test]
    fn test_optional_fields_default() {
        let temp = write_temp_config(
            r#"{ "channels": 1, "height": 6, "width": 6, "kernel_size": 3 }"#,
        );
        let config: CorrelationConfig = load_correlation_config(temp.path()).unwrap();

        assert_eq!(config.padding(), 0);
        assert_eq!(config.stride(), 1);
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert!(config.heatmap_path.is_none());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let temp = write_temp_config(
            r#"{ "channels": 1, "height": 6, "width": 6, "kernel_size": 3, "stride": 0 }"#,
        );
        let err = load_correlation_config(temp.path()).unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn test_kernel_wider_than_padded_width_rejected() {
        let temp = write_temp_config(
            r#"{ "channels": 1, "height": 12, "width": 3, "kernel_size": 5, "padding": 0 }"#,
        );
        assert!(matches!(
            load_correlation_config(temp.path()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_heatmap_path_rejected() {
        let temp = write_temp_config(
            r#"{ "channels": 1, "height": 6, "width": 6, "kernel_size": 3, "heatmap_path": " " }"#,
        );
        assert!(load_correlation_config(temp.path()).is_err());
    }

    #[test]
    fn test_missing_required_field() {
        let temp = write_temp_config(r#"{ "channels": 1, "height": 6, "width": 6 }"#);
        assert!(matches!(
            load_correlation_config(temp.path()),
            Err(Error::Json(_))
        ));
    }
}

// ============================================================================
// Recurrent Config Tests
// ============================================================================

mod recurrent_config_tests {
    use super::*;

    #[test]
    fn test_load_shipped_recurrent_config() {
        let config = load_recurrent_config("config/rnn_sequence.json")
            .expect("Failed to load recurrent config");

        assert_eq!(config.input_size, 1);
        assert_eq!(config.hidden_size, 16);
        assert_eq!(config.seq_len, 30);
        assert_eq!(config.batch_size(), 2);
        assert_eq!(config.activation().unwrap(), Activation::Tanh);
    }

    #[test]
    fn test_defaults() {
        let temp = write_temp_config(r#"{ "input_size": 2, "hidden_size": 4, "seq_len": 3 }"#);
        let config: RecurrentConfig = load_recurrent_config(temp.path()).unwrap();

        assert_eq!(config.batch_size(), 1);
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert_eq!(config.activation().unwrap(), Activation::Tanh);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        for json in [
            r#"{ "input_size": 0, "hidden_size": 4, "seq_len": 3 }"#,
            r#"{ "input_size": 2, "hidden_size": 0, "seq_len": 3 }"#,
            r#"{ "input_size": 2, "hidden_size": 4, "seq_len": 0 }"#,
            r#"{ "input_size": 2, "hidden_size": 4, "seq_len": 3, "batch_size": 0 }"#,
        ] {
            let temp = write_temp_config(json);
            assert!(load_recurrent_config(temp.path()).is_err(), "accepted {}", json);
        }
    }

    #[test]
    fn test_unknown_nonlinearity_rejected() {
        let temp = write_temp_config(
            r#"{ "input_size": 2, "hidden_size": 4, "seq_len": 3, "nonlinearity": "gelu" }"#,
        );
        let err = load_recurrent_config(temp.path()).unwrap_err();
        assert!(err.to_string().contains("gelu"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_recurrent_config("does_not_exist.json"),
            Err(Error::Io(_))
        ));
    }
}
