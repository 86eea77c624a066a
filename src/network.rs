//! Sequential network assembled from a declarative architecture.

use crate::architecture::ActivationShape;
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::utils::activations::{argmax_rows, softmax_rows};
use log::{debug, info};

/// One row of [`Network::summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub index: usize,
    pub name: &'static str,
    pub output_shape: ActivationShape,
    pub parameters: usize,
}

/// Class probabilities and the winning class for every sample.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// `[batch, classes]`, each row sums to 1.
    pub probabilities: Vec<f32>,
    pub classes: Vec<usize>,
}

/// Layers applied in order, each feeding the next.
pub struct Network {
    input_shape: ActivationShape,
    layers: Vec<Box<dyn Layer>>,
    shapes: Vec<ActivationShape>,
}

impl Network {
    /// `shapes[i]` is the per-sample output shape of `layers[i]`.
    ///
    /// Use [`build_model`](crate::architecture::build_model) rather than
    /// calling this directly; it guarantees that consecutive layer sizes
    /// agree.
    pub fn new(
        input_shape: ActivationShape,
        layers: Vec<Box<dyn Layer>>,
        shapes: Vec<ActivationShape>,
    ) -> Self {
        debug_assert_eq!(layers.len(), shapes.len());
        Self {
            input_shape,
            layers,
            shapes,
        }
    }

    pub fn input_shape(&self) -> ActivationShape {
        self.input_shape
    }

    /// Per-sample output shape of the last layer.
    pub fn output_shape(&self) -> ActivationShape {
        self.shapes.last().copied().unwrap_or(self.input_shape)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn total_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    /// Put every layer in training or inference mode.
    pub fn set_training(&mut self, training: bool) {
        for layer in &mut self.layers {
            layer.set_training(training);
        }
    }

    /// Run `batch_size` samples through every layer.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for an empty batch, `ElementCountMismatch` if `input`
    /// is not `batch_size` samples of the network's input shape.
    pub fn forward(&self, input: &[f32], batch_size: usize) -> Result<Vec<f32>> {
        if batch_size == 0 {
            return Err(Error::config("batch_size must be greater than 0"));
        }
        let expected = batch_size * self.input_shape.len();
        if input.len() != expected {
            return Err(Error::ElementCountMismatch {
                expected,
                got: input.len(),
            });
        }

        let mut current = input.to_vec();
        let mut next = Vec::new();
        for (index, layer) in self.layers.iter().enumerate() {
            next.clear();
            next.resize(batch_size * layer.output_size(), 0.0);
            debug!(
                "layer {} ({}): {} -> {}",
                index,
                layer.name(),
                layer.input_size(),
                layer.output_size()
            );
            layer.forward(&current, &mut next, batch_size);
            std::mem::swap(&mut current, &mut next);
        }

        Ok(current)
    }

    /// Forward pass followed by a row-wise softmax and argmax.
    pub fn predict(&self, input: &[f32], batch_size: usize) -> Result<Prediction> {
        let mut probabilities = self.forward(input, batch_size)?;
        let classes_per_sample = self.output_shape().len();

        softmax_rows(&mut probabilities, batch_size, classes_per_sample);
        let classes = argmax_rows(&probabilities, batch_size, classes_per_sample);

        Ok(Prediction {
            probabilities,
            classes,
        })
    }

    /// Describe every layer and log the table at info level.
    pub fn summary(&self) -> Vec<LayerSummary> {
        let rows: Vec<LayerSummary> = self
            .layers
            .iter()
            .zip(&self.shapes)
            .enumerate()
            .map(|(index, (layer, shape))| LayerSummary {
                index,
                name: layer.name(),
                output_shape: *shape,
                parameters: layer.parameter_count(),
            })
            .collect();

        info!("input: {}", self.input_shape);
        for row in &rows {
            info!(
                "{:>3}  {:<12} {:>12} {:>10}",
                row.index,
                row.name,
                row.output_shape.to_string(),
                row.parameters
            );
        }
        info!("total parameters: {}", self.total_parameters());

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{ActivationLayer, DenseLayer};
    use crate::utils::Activation;

    fn tiny() -> Network {
        let dense =
            DenseLayer::from_weights(2, 2, vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0]).unwrap();
        let relu = ActivationLayer::new(2, Activation::Relu);
        Network::new(
            ActivationShape::Flat(2),
            vec![Box::new(dense), Box::new(relu)],
            vec![ActivationShape::Flat(2), ActivationShape::Flat(2)],
        )
    }

    #[test]
    fn test_forward_applies_layers_in_order() {
        let output = tiny().forward(&[-1.0, 2.0, 3.0, -4.0], 2).unwrap();
        assert_eq!(output, vec![0.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_forward_rejects_wrong_length() {
        let err = tiny().forward(&[1.0, 2.0, 3.0], 2).unwrap_err();
        assert!(matches!(
            err,
            Error::ElementCountMismatch {
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn test_predict_picks_largest_logit() {
        let prediction = tiny().predict(&[0.5, 2.0], 1).unwrap();
        assert_eq!(prediction.classes, vec![1]);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_summary_rows() {
        let summary = tiny().summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "dense");
        assert_eq!(summary[0].parameters, 6);
        assert_eq!(summary[1].name, "relu");
        assert_eq!(summary[1].parameters, 0);
    }
}
