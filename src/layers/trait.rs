//! The contract every layer implements.

/// A layer maps a batch of flat input samples to a batch of flat output
/// samples given its own parameters.
///
/// Buffers are row-major with the batch as the outermost dimension, so
/// `input.len() == batch_size * input_size()` and
/// `output.len() == batch_size * output_size()`. Spatial layers interpret a
/// sample as `channels × height × width`.
///
/// # Example
///
/// ```ignore
/// let mut output = vec![0.0f32; batch_size * layer.output_size()];
/// layer.forward(&input, &mut output, batch_size);
/// ```
pub trait Layer {
    /// Compute the layer output for `batch_size` samples.
    ///
    /// # Panics
    ///
    /// Implementations panic if the buffer lengths do not match
    /// `batch_size × input_size()` and `batch_size × output_size()`.
    /// [`Network`](crate::network::Network) checks the input length before
    /// dispatching, so the check only fires on direct misuse.
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize);

    /// Number of input values per sample.
    fn input_size(&self) -> usize;

    /// Number of output values per sample.
    fn output_size(&self) -> usize;

    /// Count of weights and biases (zero for parameter-free layers).
    fn parameter_count(&self) -> usize;

    /// Short human-readable layer kind, used in summaries and logs.
    fn name(&self) -> &'static str;

    /// Switch between training and inference behaviour.
    ///
    /// Only layers whose forward pass differs between the two modes need to
    /// override this.
    fn set_training(&mut self, _training: bool) {}
}

/// Panic with a uniform message when a forward buffer has the wrong length.
pub(crate) fn check_buffers(
    layer: &dyn Layer,
    input: &[f32],
    output: &[f32],
    batch_size: usize,
) {
    let expected_in = batch_size * layer.input_size();
    let expected_out = batch_size * layer.output_size();
    assert_eq!(
        input.len(),
        expected_in,
        "{} input len mismatch: expected {}, got {}",
        layer.name(),
        expected_in,
        input.len()
    );
    assert_eq!(
        output.len(),
        expected_out,
        "{} output len mismatch: expected {}, got {}",
        layer.name(),
        expected_out,
        output.len()
    );
}
