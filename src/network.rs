//! Coordinate-to-color multilayer perceptron
//!
//! The network maps a normalized pixel coordinate `(x, y)` in `[-1, 1]²` to a
//! normalized color `(r, g, b)` in `[0, 1]³`. Hidden layers use ReLU, the
//! output layer is linear and clamped to the unit interval.

use crate::error::{EngineError, Result};
use crate::layers::{DenseLayer, Layer};
use crate::optimizers::{MomentumSgd, Optimizer};
use crate::snapshot::{LayerSnapshot, Snapshot};
use crate::utils::{clamp_unit_inplace, relu_derivative, relu_inplace, SimpleRng};

/// Network input width: normalized x and y.
pub const INPUT_SIZE: usize = 2;
/// Network output width: normalized r, g, b.
pub const OUTPUT_SIZE: usize = 3;

/// Topology and optimizer settings of a network.
///
/// Everything except `learning_rate` and `momentum` is fixed once the model is
/// built; those two are tuned live on the model.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f32,
    pub momentum: f32,
    pub l2_decay: f32,
}

impl NetworkConfig {
    /// Widths of every layer boundary, input first and output last.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(INPUT_SIZE);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(OUTPUT_SIZE);
        sizes
    }
}

/// Maps a pixel coordinate to the network input range: `2 * coord / dimension - 1`.
pub fn normalize_coordinate(coord: usize, dimension: usize) -> f32 {
    2.0 * coord as f32 / dimension as f32 - 1.0
}

/// Fully-connected feed-forward network with momentum SGD state.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    layers: Vec<DenseLayer>,
    optimizer: MomentumSgd,
    l2_decay: f32,
}

impl NetworkModel {
    /// Builds a freshly initialized network.
    ///
    /// # Examples
    ///
    /// ```
    /// use neural_canvas::network::{NetworkConfig, NetworkModel};
    /// use neural_canvas::utils::SimpleRng;
    ///
    /// let config = NetworkConfig {
    ///     hidden_layers: vec![8, 8],
    ///     learning_rate: 0.01,
    ///     momentum: 0.9,
    ///     l2_decay: 0.0,
    /// };
    /// let model = NetworkModel::new(&config, &mut SimpleRng::new(1));
    /// let [r, g, b] = model.forward(0.0, 0.0);
    /// assert!((0.0..=1.0).contains(&r) && (0.0..=1.0).contains(&g) && (0.0..=1.0).contains(&b));
    /// ```
    pub fn new(config: &NetworkConfig, rng: &mut SimpleRng) -> Self {
        let sizes = config.layer_sizes();
        let layers = sizes
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], rng))
            .collect();

        Self {
            layers,
            optimizer: MomentumSgd::new(config.learning_rate, config.momentum),
            l2_decay: config.l2_decay,
        }
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// `(outputs, inputs)` for each layer.
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        self.layers.iter().map(DenseLayer::shape).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.parameter_count()).sum()
    }

    pub fn learning_rate(&self) -> f32 {
        self.optimizer.learning_rate()
    }

    pub fn set_learning_rate(&mut self, lr: f32) {
        self.optimizer.set_learning_rate(lr);
    }

    pub fn momentum(&self) -> f32 {
        self.optimizer.momentum()
    }

    pub fn set_momentum(&mut self, momentum: f32) {
        self.optimizer.set_momentum(momentum);
    }

    pub fn l2_decay(&self) -> f32 {
        self.l2_decay
    }

    /// Evaluates the network; every channel of the result lies in `[0, 1]`.
    pub fn forward(&self, x: f32, y: f32) -> [f32; 3] {
        let mut activation = vec![x, y];
        let last = self.layers.len().saturating_sub(1);

        for (index, layer) in self.layers.iter().enumerate() {
            let mut output = vec![0.0f32; layer.output_size()];
            layer.forward(&activation, &mut output);
            if index == last {
                clamp_unit_inplace(&mut output);
            } else {
                relu_inplace(&mut output);
            }
            activation = output;
        }

        [activation[0], activation[1], activation[2]]
    }

    /// Same as [`NetworkModel::forward`].
    pub fn predict(&self, x: f32, y: f32) -> [f32; 3] {
        self.forward(x, y)
    }

    /// One forward + backward pass and momentum update for a single sample.
    ///
    /// Returns the mean squared error over the three channels, measured
    /// before the update.
    pub fn train_step(&mut self, x: f32, y: f32, target: [f32; 3]) -> f32 {
        let last = self.layers.len() - 1;

        // activations[l] feeds layer l; pre_activations[l] is layer l's affine output.
        let mut activations: Vec<Vec<f32>> = Vec::with_capacity(self.layers.len() + 1);
        let mut pre_activations: Vec<Vec<f32>> = Vec::with_capacity(self.layers.len());
        activations.push(vec![x, y]);

        for (index, layer) in self.layers.iter().enumerate() {
            let mut z = vec![0.0f32; layer.output_size()];
            layer.forward(&activations[index], &mut z);
            let mut a = z.clone();
            if index == last {
                clamp_unit_inplace(&mut a);
            } else {
                relu_inplace(&mut a);
            }
            pre_activations.push(z);
            activations.push(a);
        }

        let output = &activations[last + 1];
        let mut error: Vec<f32> = target
            .iter()
            .zip(output.iter())
            .map(|(t, o)| t - o)
            .collect();
        let loss = error.iter().map(|e| e * e).sum::<f32>() / OUTPUT_SIZE as f32;

        // Every error signal is computed from the pre-update weights.
        let mut errors: Vec<Vec<f32>> = vec![Vec::new(); self.layers.len()];
        for index in (0..self.layers.len()).rev() {
            if index > 0 {
                let layer = &self.layers[index];
                let mut upstream = vec![0.0f32; layer.input_size()];
                layer.backward(&error, &mut upstream);
                for (value, &z) in upstream.iter_mut().zip(&pre_activations[index - 1]) {
                    *value *= relu_derivative(z);
                }
                errors[index] = std::mem::replace(&mut error, upstream);
            } else {
                errors[index] = std::mem::take(&mut error);
            }
        }

        let optimizer = self.optimizer;
        let l2_decay = self.l2_decay;
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.update_parameters(&activations[index], &errors[index], &optimizer, l2_decay);
        }

        loss
    }

    /// Renders the network over a `width × height` grid as opaque RGBA bytes.
    pub fn render_to_buffer(&self, width: usize, height: usize) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(width * height * 4);
        for py in 0..height {
            let y = normalize_coordinate(py, height);
            for px in 0..width {
                let x = normalize_coordinate(px, width);
                let [r, g, b] = self.forward(x, y);
                buffer.push(to_channel(r));
                buffer.push(to_channel(g));
                buffer.push(to_channel(b));
                buffer.push(255);
            }
        }
        buffer
    }

    /// Deep copy of every weight matrix and bias vector.
    pub fn snapshot(&self, iteration: u64) -> Snapshot {
        Snapshot {
            iteration,
            layers: self
                .layers
                .iter()
                .map(|layer| LayerSnapshot {
                    inputs: layer.input_size(),
                    outputs: layer.output_size(),
                    weights: layer.weights().to_vec(),
                    biases: layer.biases().to_vec(),
                })
                .collect(),
        }
    }

    /// Copies snapshot parameters into the live model.
    ///
    /// Velocities are not part of a snapshot and keep their current values,
    /// so training resumed after a restore carries the old momentum.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let expected = self.layer_shapes();
        let found = snapshot.layer_shapes();
        let consistent = snapshot.layers.iter().all(|layer| {
            layer.weights.len() == layer.inputs * layer.outputs
                && layer.biases.len() == layer.outputs
        });
        if expected != found || !consistent {
            return Err(EngineError::SnapshotShape { expected, found });
        }

        for (layer, saved) in self.layers.iter_mut().zip(&snapshot.layers) {
            layer.load_parameters(&saved.weights, &saved.biases);
        }
        Ok(())
    }
}

fn to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
