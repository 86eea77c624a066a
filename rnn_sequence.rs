// rnn_sequence.rs
// Feeds a sine wave through a vanilla RNN and prints the hidden state norm at
// every step.
//
// Usage:
//   rnn_sequence [config.json]
//
// The hidden state starts at zero; with random weights its norm settles after
// a few steps, which is the behaviour the demo is meant to show.

use log::{error, info};
use rust_conv_networks::config::{load_recurrent_config, RecurrentConfig};
use rust_conv_networks::layers::{Rnn, RnnCell, RnnOutput};
use rust_conv_networks::utils::SimpleRng;
use rust_conv_networks::Result;
use std::process;

// Phase advance per time step.
const STEP: f32 = 0.3;

fn config_from_args(args: &[String]) -> Result<RecurrentConfig> {
    match args.get(1) {
        Some(path) => load_recurrent_config(path),
        None => Ok(RecurrentConfig::default()),
    }
}

// [batch, seq_len, input_size]; every sample and feature is phase shifted.
fn sine_sequence(batch_size: usize, seq_len: usize, input_size: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(batch_size * seq_len * input_size);
    for b in 0..batch_size {
        for t in 0..seq_len {
            for i in 0..input_size {
                let phase = STEP * t as f32 + 0.5 * b as f32 + 0.1 * i as f32;
                data.push(phase.sin());
            }
        }
    }
    data
}

// Euclidean norm of the first sample's hidden state at each step.
fn hidden_norms(outputs: &[f32], seq_len: usize, hidden_size: usize) -> Vec<f32> {
    outputs
        .chunks_exact(hidden_size)
        .take(seq_len)
        .map(|h| h.iter().map(|v| v * v).sum::<f32>().sqrt())
        .collect()
}

fn run(config: &RecurrentConfig) -> Result<RnnOutput> {
    let mut rng = SimpleRng::new(config.seed());
    let cell = RnnCell::new(config.input_size, config.hidden_size, &mut rng)?
        .with_activation(config.activation()?);
    info!(
        "RNN: input {} -> hidden {} ({}), {} parameters",
        config.input_size,
        config.hidden_size,
        cell.activation(),
        cell.parameter_count()
    );

    let rnn = Rnn::new(cell);
    let batch_size = config.batch_size();
    let input = sine_sequence(batch_size, config.seq_len, config.input_size);
    rnn.forward(&input, None, batch_size, config.seq_len)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = config_from_args(&args).unwrap_or_else(|e| {
        error!("Failed to load config: {}", e);
        process::exit(1);
    });

    let output = run(&config).unwrap_or_else(|e| {
        error!("Recurrence failed: {}", e);
        process::exit(1);
    });

    for (t, norm) in hidden_norms(&output.outputs, config.seq_len, config.hidden_size)
        .iter()
        .enumerate()
    {
        println!("t={:>3}  |h| = {:.5}", t, norm);
    }
}
