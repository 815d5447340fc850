//! Momentum SGD optimizer implementation
//!
//! Each update first folds the new gradient into an exponentially decaying
//! velocity and then moves the parameter by that velocity:
//!
//! `v = μ * v + η * g`, then `w = w + v`

use crate::optimizers::Optimizer;

/// Stochastic gradient descent with momentum.
///
/// # Fields
///
/// * `learning_rate` - Step size η; live-tunable, not validated
/// * `momentum` - Velocity retention μ; live-tunable, not validated
///
/// # Example
///
/// ```ignore
/// use neural_canvas::optimizers::{MomentumSgd, Optimizer};
///
/// let optimizer = MomentumSgd::new(0.1, 0.9);
/// let mut weights = vec![1.0];
/// let mut velocity = vec![0.0];
///
/// optimizer.update(&mut weights, &mut velocity, &[1.0]);
/// // velocity = 0.1, weights = 1.1
/// optimizer.update(&mut weights, &mut velocity, &[1.0]);
/// // velocity = 0.9 * 0.1 + 0.1 = 0.19, weights = 1.29
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumSgd {
    learning_rate: f32,
    momentum: f32,
}

impl MomentumSgd {
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
        }
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn set_momentum(&mut self, momentum: f32) {
        self.momentum = momentum;
    }

    /// Single-parameter form of the update rule.
    #[inline]
    pub fn step(&self, parameter: &mut f32, velocity: &mut f32, gradient: f32) {
        *velocity = self.momentum * *velocity + self.learning_rate * gradient;
        *parameter += *velocity;
    }
}

impl Optimizer for MomentumSgd {
    fn update(&self, parameters: &mut [f32], velocity: &mut [f32], gradients: &[f32]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );
        assert_eq!(
            parameters.len(),
            velocity.len(),
            "Parameters and velocity must have the same length"
        );

        for ((param, vel), &grad) in parameters
            .iter_mut()
            .zip(velocity.iter_mut())
            .zip(gradients.iter())
        {
            self.step(param, vel, grad);
        }
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
