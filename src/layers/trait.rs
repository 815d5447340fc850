//! Layer trait definition
//!
//! The coordinate network trains on one sample at a time, so the trait is
//! shaped around single-sample vectors rather than batches.

use crate::optimizers::Optimizer;

/// Core trait for network layers.
///
/// # Example
///
/// ```ignore
/// // Forward pass through a layer (affine part only)
/// let mut output = vec![0.0f32; layer.output_size()];
/// layer.forward(&input, &mut output);
///
/// // Propagate an error signal upstream, then apply the update
/// let mut upstream = vec![0.0f32; layer.input_size()];
/// layer.backward(&error, &mut upstream);
/// layer.update_parameters(&input, &error, &optimizer, l2_decay);
/// ```
pub trait Layer {
    /// Affine forward pass: `output = W * input + b`.
    ///
    /// Activations are applied by the caller.
    ///
    /// # Panics
    ///
    /// Implementations may panic if input/output lengths don't match the layer.
    fn forward(&self, input: &[f32], output: &mut [f32]);

    /// Weighted error sum for the layer below: `upstream = Wᵀ * error`.
    ///
    /// The activation derivative of the layer below is applied by the caller.
    fn backward(&self, error: &[f32], upstream: &mut [f32]);

    /// Apply one optimizer step for a single sample.
    ///
    /// Weight gradients are `error[k] * input[j] - l2_decay * w[k][j]`, bias
    /// gradients are `error[k]`.
    fn update_parameters(
        &mut self,
        input: &[f32],
        error: &[f32],
        optimizer: &dyn Optimizer,
        l2_decay: f32,
    );

    /// Get the input size of the layer.
    fn input_size(&self) -> usize;

    /// Get the output size of the layer.
    fn output_size(&self) -> usize;

    /// Get the number of trainable parameters in the layer.
    fn parameter_count(&self) -> usize;
}
