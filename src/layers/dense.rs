//! Dense (fully connected) layer implementation
//!
//! Weights are stored as an `outputs × inputs` row-major matrix so one row
//! holds every incoming connection of one neuron. Each parameter buffer has a
//! velocity buffer of the same shape for the momentum optimizer.

use crate::layers::Layer;
use crate::optimizers::Optimizer;
use crate::utils::SimpleRng;

/// Dense layer with weights, biases, and their momentum velocities.
///
/// # Fields
///
/// * `input_size` - Number of input features
/// * `output_size` - Number of output features
/// * `weights` - Row-major `output_size × input_size` matrix
/// * `biases` - One bias per output
/// * `weight_velocity` / `bias_velocity` - Momentum accumulators, start at zero
///
/// # Example
///
/// ```ignore
/// use neural_canvas::layers::DenseLayer;
/// use neural_canvas::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = DenseLayer::new(2, 32, &mut rng);
/// assert_eq!(layer.parameter_count(), 2 * 32 + 32);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    weight_velocity: Vec<f32>,
    bias_velocity: Vec<f32>,
}

impl DenseLayer {
    /// Create a new DenseLayer with He-style uniform initialization.
    ///
    /// Weights are sampled uniformly from `[-scale, scale]` with
    /// `scale = sqrt(2 / input_size)`. Biases and velocities start at zero.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        let scale = (2.0f32 / input_size.max(1) as f32).sqrt();
        let weights = (0..input_size * output_size)
            .map(|_| rng.gen_range_f32(-scale, scale))
            .collect();

        Self {
            input_size,
            output_size,
            weights,
            biases: vec![0.0f32; output_size],
            weight_velocity: vec![0.0f32; input_size * output_size],
            bias_velocity: vec![0.0f32; output_size],
        }
    }

    /// `(outputs, inputs)` of the weight matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.output_size, self.input_size)
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn weight_velocity(&self) -> &[f32] {
        &self.weight_velocity
    }

    pub fn bias_velocity(&self) -> &[f32] {
        &self.bias_velocity
    }

    /// Overwrite weights and biases; velocities are left as they are.
    ///
    /// # Panics
    ///
    /// Panics if the slices do not match the layer shape.
    pub fn load_parameters(&mut self, weights: &[f32], biases: &[f32]) {
        self.weights.copy_from_slice(weights);
        self.biases.copy_from_slice(biases);
    }
}

impl Layer for DenseLayer {
    fn forward(&self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), self.input_size, "input length mismatch");
        assert_eq!(output.len(), self.output_size, "output length mismatch");

        for ((out, row), &bias) in output
            .iter_mut()
            .zip(self.weights.chunks_exact(self.input_size.max(1)))
            .zip(self.biases.iter())
        {
            *out = bias + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
        }
    }

    fn backward(&self, error: &[f32], upstream: &mut [f32]) {
        assert_eq!(error.len(), self.output_size, "error length mismatch");
        assert_eq!(upstream.len(), self.input_size, "upstream length mismatch");

        upstream.fill(0.0);
        for (row, &delta) in self.weights.chunks_exact(self.input_size.max(1)).zip(error) {
            for (acc, &w) in upstream.iter_mut().zip(row) {
                *acc += w * delta;
            }
        }
    }

    fn update_parameters(
        &mut self,
        input: &[f32],
        error: &[f32],
        optimizer: &dyn Optimizer,
        l2_decay: f32,
    ) {
        let stride = self.input_size.max(1);
        let mut gradients = vec![0.0f32; self.input_size];

        for ((row, velocity), &delta) in self
            .weights
            .chunks_exact_mut(stride)
            .zip(self.weight_velocity.chunks_exact_mut(stride))
            .zip(error)
        {
            for ((grad, &x), &w) in gradients.iter_mut().zip(input).zip(row.iter()) {
                *grad = delta * x - l2_decay * w;
            }
            optimizer.update(row, velocity, &gradients);
        }

        optimizer.update(&mut self.biases, &mut self.bias_velocity, error);
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::MomentumSgd;

    fn layer_with(weights: Vec<f32>, biases: Vec<f32>, inputs: usize) -> DenseLayer {
        let outputs = biases.len();
        DenseLayer {
            input_size: inputs,
            output_size: outputs,
            weight_velocity: vec![0.0; weights.len()],
            bias_velocity: vec![0.0; outputs],
            weights,
            biases,
        }
    }

    #[test]
    fn test_dense_layer_creation() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(2, 5, &mut rng);

        assert_eq!(layer.shape(), (5, 2));
        assert_eq!(layer.weights.len(), 10);
        assert_eq!(layer.biases.len(), 5);
        assert!(layer.weight_velocity.iter().all(|&v| v == 0.0));
        assert!(layer.bias_velocity.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_he_initialization_range() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(32, 16, &mut rng);
        let scale = (2.0f32 / 32.0).sqrt();

        for &weight in &layer.weights {
            assert!(
                weight >= -scale && weight <= scale,
                "Weight {} outside He range [{}, {}]",
                weight,
                -scale,
                scale
            );
        }
        assert!(layer.biases.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_forward_row_major() {
        // Row 0: [1, 2], row 1: [3, 4]
        let layer = layer_with(vec![1.0, 2.0, 3.0, 4.0], vec![0.5, -0.5], 2);
        let mut output = vec![0.0; 2];
        layer.forward(&[1.0, 1.0], &mut output);
        assert_eq!(output, vec![3.5, 6.5]);
    }

    #[test]
    fn test_backward_is_transpose_product() {
        let layer = layer_with(vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0], 2);
        let mut upstream = vec![9.0; 2];
        layer.backward(&[1.0, 10.0], &mut upstream);
        assert_eq!(upstream, vec![31.0, 42.0]);
    }

    #[test]
    fn test_update_applies_l2_to_weights_only() {
        let mut layer = layer_with(vec![1.0], vec![1.0], 1);
        let optimizer = MomentumSgd::new(1.0, 0.0);

        // error 0: weight gradient is only the decay term
        layer.update_parameters(&[1.0], &[0.0], &optimizer, 0.1);

        assert!((layer.weights[0] - 0.9).abs() < 1e-6);
        assert_eq!(layer.biases[0], 1.0);
    }

    #[test]
    fn test_load_parameters_keeps_velocity() {
        let mut layer = layer_with(vec![1.0], vec![1.0], 1);
        let optimizer = MomentumSgd::new(0.5, 0.9);
        layer.update_parameters(&[1.0], &[1.0], &optimizer, 0.0);
        let velocity = layer.weight_velocity.clone();

        layer.load_parameters(&[7.0], &[8.0]);

        assert_eq!(layer.weights, vec![7.0]);
        assert_eq!(layer.biases, vec![8.0]);
        assert_eq!(layer.weight_velocity, velocity);
    }
}
