//! Optimizer abstractions for network parameter updates
//!
//! The network keeps its own velocity buffers next to each weight matrix and
//! bias vector, so optimizers here are stateless rules applied to a
//! `(parameters, velocity, gradients)` triple. Snapshots copy parameters
//! only; velocities stay with the model.
//!
//! # Available Optimizers
//!
//! - MomentumSgd: stochastic gradient descent with a momentum accumulator

pub mod sgd;

pub use sgd::MomentumSgd;

/// Core trait for network optimizers.
///
/// Gradients handed to `update` point in the direction that *reduces* the
/// loss (they are `error * activation` terms with `error = target - output`),
/// so implementations add the resulting step to the parameters.
pub trait Optimizer {
    /// Update parameters in place using gradients and the matching velocity buffer.
    ///
    /// # Panics
    ///
    /// Implementations may panic if the three slices have different lengths.
    fn update(&self, parameters: &mut [f32], velocity: &mut [f32], gradients: &[f32]);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;

    /// Set the learning rate for this optimizer.
    ///
    /// Any value is accepted, including zero and negative rates.
    fn set_learning_rate(&mut self, lr: f32);
}
