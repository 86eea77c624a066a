//! Rust Convolutional Networks Library
//!
//! Convolution and recurrence written out by hand: a sliding-window 2D
//! correlation, a forward-only layer stack assembled from a declarative
//! topology, and a vanilla RNN cell unrolled over a sequence.
//!
//! # Modules
//!
//! - `correlate`: Manual 2D correlation over zero-padded volumes
//! - `layers`: Layer trait and implementations (Conv2D, Dense, MaxPool2D, etc.) plus the RNN
//! - `architecture`: Topology configuration, validation and model building
//! - `network`: Sequential forward pass, prediction and summaries
//! - `plot`: Pseudo-color rendering of feature maps
//! - `config`: Demo configuration structures
//! - `utils`: Shared utilities (RNG, activation functions)
//! - `error`: Crate-wide error type

pub mod architecture;
pub mod config;
pub mod correlate;
pub mod error;
pub mod layers;
pub mod network;
pub mod plot;
pub mod utils;

pub use error::{Error, Result};
