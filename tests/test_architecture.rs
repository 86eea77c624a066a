//! Tests for architecture parsing, validation and model building
//!
//! This file tests the architecture module including:
//! - Loading JSON topologies from disk (shipped configs and temp files)
//! - Shape inference through conv, pool, flatten and dense layers
//! - Building networks and running them end to end
//! - Handling invalid JSON, missing files and mismatched connections

use rust_conv_networks::architecture::{
    build_model, load_architecture, validate_architecture, ActivationShape, ArchitectureConfig,
    LayerConfig,
};
use rust_conv_networks::utils::rng::SimpleRng;
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
// Loading Tests
// ============================================================================

mod loading_tests {
    use super::*;

    #[test]
    fn test_shipped_reference_matches_builtin() {
        let loaded = load_architecture("config/architectures/reference_cnn.json").unwrap();
        assert_eq!(loaded, ArchitectureConfig::reference_cnn());
    }

    #[test]
    fn test_shipped_padded_cnn_loads() {
        let config = load_architecture("config/architectures/padded_cnn.json").unwrap();
        let shapes = validate_architecture(&config).unwrap();
        assert_eq!(
            shapes[3],
            ActivationShape::Spatial {
                channels: 16,
                height: 8,
                width: 8
            }
        );
        assert_eq!(*shapes.last().unwrap(), ActivationShape::Flat(10));
    }

    #[test]
    fn test_load_minimal_cnn() {
        let config_json = r#"{
  "input": { "channels": 1, "height": 28, "width": 28 },
  "layers": [
    { "layer_type": "conv2d", "out_channels": 8, "kernel_size": 3, "padding": 1 },
    { "layer_type": "relu" },
    { "layer_type": "maxpool2d", "pool_size": 2 },
    { "layer_type": "flatten" },
    { "layer_type": "dense", "input_size": 1568, "output_size": 10 }
  ]
}"#;

        let temp_file = write_temp_config(config_json);
        let config = load_architecture(temp_file.path()).unwrap();

        assert_eq!(config.layers.len(), 5);
        assert_eq!(config.layers[0].layer_type, "conv2d");
        assert_eq!(config.layers[0].in_channels, None);
        assert_eq!(config.layers[0].padding, Some(1));
        assert_eq!(config.layers[4].input_size, Some(1568));
    }

    #[test]
    fn test_serialized_config_round_trips_through_loader() {
        let config = ArchitectureConfig::reference_cnn();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let temp_file = write_temp_config(&json);

        assert_eq!(load_architecture(temp_file.path()).unwrap(), config);
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling_tests {
    use super::*;

    #[test]
    fn test_invalid_json() {
        let temp_file = write_temp_config("{ \"input\": { \"channels\": 1 ");
        assert!(matches!(
            load_architecture(temp_file.path()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_architecture("nonexistent_architecture.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_missing_input_shape() {
        let temp_file = write_temp_config(r#"{ "layers": [ { "layer_type": "flatten" } ] }"#);
        assert!(load_architecture(temp_file.path()).is_err());
    }

    #[test]
    fn test_layer_connection_mismatch_names_layer() {
        let config_json = r#"{
  "input": { "channels": 3, "height": 32, "width": 32 },
  "layers": [
    { "layer_type": "conv2d", "in_channels": 3, "out_channels": 6, "kernel_size": 5 },
    { "layer_type": "conv2d", "in_channels": 3, "out_channels": 16, "kernel_size": 5 }
  ]
}"#;
        let temp_file = write_temp_config(config_json);
        let err = load_architecture(temp_file.path()).unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("Layer 1"));
    }

    #[test]
    fn test_dense_size_must_match_flattened_length() {
        let mut config = ArchitectureConfig::reference_cnn();
        config.layers[8] = LayerConfig::dense(16 * 6 * 6, 120);

        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("Layer 8"));
    }

    #[test]
    fn test_missing_pool_size() {
        let mut pool = LayerConfig::maxpool2d(2);
        pool.pool_size = None;
        let mut config = ArchitectureConfig::reference_cnn();
        config.layers[3] = pool;

        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_invalid_batchnorm_momentum() {
        let mut bn = LayerConfig::batchnorm(6);
        bn.momentum = Some(1.5);
        let mut config = ArchitectureConfig::reference_cnn();
        config.layers[1] = bn;

        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_shrinking_past_zero() {
        // Two 5x5 convolutions on an 8x8 image leave nothing for the second
        let config = ArchitectureConfig {
            input: rust_conv_networks::architecture::InputShape {
                channels: 1,
                height: 8,
                width: 8,
            },
            layers: vec![LayerConfig::conv2d(1, 2, 5), LayerConfig::conv2d(2, 2, 5)],
        };
        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("Layer 1"));
    }
}

// ============================================================================
// Model Building Tests
// ============================================================================

mod model_building_tests {
    use super::*;

    #[test]
    fn test_build_reference_cnn_layer_names() {
        let mut rng = SimpleRng::new(42);
        let network = build_model(&ArchitectureConfig::reference_cnn(), &mut rng).unwrap();

        let names: Vec<&str> = network.layers().iter().map(|l| l.name()).collect();
        assert_eq!(
            names,
            vec![
                "conv2d",
                "batchnorm",
                "relu",
                "maxpool2d",
                "conv2d",
                "relu",
                "maxpool2d",
                "flatten",
                "dense",
                "relu",
                "dense",
                "relu",
                "dense"
            ]
        );
    }

    #[test]
    fn test_consecutive_layer_sizes_agree() {
        let config = load_architecture("config/architectures/padded_cnn.json").unwrap();
        let mut rng = SimpleRng::new(3);
        let network = build_model(&config, &mut rng).unwrap();

        assert_eq!(network.layers()[0].input_size(), 3 * 32 * 32);
        for pair in network.layers().windows(2) {
            assert_eq!(pair[0].output_size(), pair[1].input_size());
        }
    }

    #[test]
    fn test_same_seed_produces_identical_outputs() {
        let config = ArchitectureConfig::reference_cnn();
        let mut rng1 = SimpleRng::new(9);
        let mut rng2 = SimpleRng::new(9);
        let mut net1 = build_model(&config, &mut rng1).unwrap();
        let mut net2 = build_model(&config, &mut rng2).unwrap();
        net1.set_training(false);
        net2.set_training(false);

        let input = SimpleRng::new(100).uniform_vec(3 * 32 * 32, 0.0, 1.0);
        assert_eq!(
            net1.forward(&input, 1).unwrap(),
            net2.forward(&input, 1).unwrap()
        );
    }

    #[test]
    fn test_different_seeds_produce_different_outputs() {
        let config = ArchitectureConfig::reference_cnn();
        let net1 = build_model(&config, &mut SimpleRng::new(1)).unwrap();
        let net2 = build_model(&config, &mut SimpleRng::new(2)).unwrap();

        let input = SimpleRng::new(100).uniform_vec(2 * 3 * 32 * 32, 0.0, 1.0);
        assert_ne!(
            net1.forward(&input, 2).unwrap(),
            net2.forward(&input, 2).unwrap()
        );
    }
}
