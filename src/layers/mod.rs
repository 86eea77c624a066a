//! Layer abstractions
//!
//! The [`Layer`] trait and the feed-forward layers a CNN topology is built
//! from, plus the vanilla recurrent cell (which carries a hidden state and so
//! sits outside the single-input `Layer` contract).

mod r#trait;
pub mod activation;
pub mod batchnorm;
pub mod conv2d;
pub mod dense;
pub mod flatten;
pub mod pool;
pub mod rnn;

pub use activation::ActivationLayer;
pub use batchnorm::BatchNormLayer;
pub use conv2d::Conv2DLayer;
pub use dense::DenseLayer;
pub use flatten::FlattenLayer;
pub use pool::MaxPool2DLayer;
pub use r#trait::Layer;
pub use rnn::{Rnn, RnnCell, RnnOutput};
