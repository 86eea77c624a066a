// cnn_forward.rs
// Builds a CNN from a declarative topology and runs one forward pass.
//
// Usage:
//   cnn_forward [architecture.json]
//
// Without an argument the fixed reference topology for 3x32x32 images is
// used (see ArchitectureConfig::reference_cnn). Weights are random and the
// network is never trained, so the predicted classes only show that the
// pipeline is wired end to end.

use log::{error, info};
use rust_conv_networks::architecture::{build_model, load_architecture, ArchitectureConfig};
use rust_conv_networks::network::Prediction;
use rust_conv_networks::utils::SimpleRng;
use rust_conv_networks::Result;
use std::process;

const BATCH_SIZE: usize = 4;
const SEED: u64 = 1;

fn architecture_from_args(args: &[String]) -> Result<ArchitectureConfig> {
    match args.get(1) {
        Some(path) => {
            info!("Loading architecture from {}", path);
            load_architecture(path)
        }
        None => Ok(ArchitectureConfig::reference_cnn()),
    }
}

fn run(architecture: &ArchitectureConfig, batch_size: usize) -> Result<Prediction> {
    let mut rng = SimpleRng::new(SEED);
    let mut network = build_model(architecture, &mut rng)?;
    network.summary();
    network.set_training(false);

    let input = rng.uniform_vec(batch_size * network.input_shape().len(), 0.0, 1.0);
    info!(
        "forward pass: batch {} of {}",
        batch_size,
        network.input_shape()
    );
    network.predict(&input, batch_size)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let architecture = architecture_from_args(&args).unwrap_or_else(|e| {
        error!("Failed to load architecture: {}", e);
        process::exit(1);
    });

    let prediction = run(&architecture, BATCH_SIZE).unwrap_or_else(|e| {
        error!("Forward pass failed: {}", e);
        process::exit(1);
    });

    let classes = prediction.probabilities.len() / BATCH_SIZE;
    for (i, &class) in prediction.classes.iter().enumerate() {
        println!(
            "sample {}: class {} (p = {:.3})",
            i,
            class,
            prediction.probabilities[i * classes + class]
        );
    }
}
