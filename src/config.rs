//! Configuration structures for the engine
//!
//! This module provides the engine configuration: network topology, the
//! momentum SGD hyperparameters, and the plateau learning-rate decay policy.
//! Every field has a default so a JSON file only needs to list what it changes.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the network, the trainer, and the learning-rate policy.
///
/// # Example
///
/// ```json
/// {
///   "hidden_layers": [32, 32, 32],
///   "learning_rate": 0.01,
///   "momentum": 0.9,
///   "batch_size": 32,
///   "loss_window": 20,
///   "decay_threshold": 0.01,
///   "decay_factor": 0.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Widths of the hidden layers, input side first
    pub hidden_layers: Vec<usize>,

    /// Initial learning rate; not validated, zero or negative values are accepted
    pub learning_rate: f32,

    /// Momentum coefficient; not validated, the caller keeps it well-behaved
    pub momentum: f32,

    /// L2 weight-decay coefficient applied to weight gradients (not biases)
    pub l2_decay: f32,

    /// Floor below which plateau decay never pushes the learning rate
    pub min_learning_rate: f32,

    /// Samples per batch step
    pub batch_size: usize,

    /// Batch steps per scheduler tick
    pub batches_per_tick: usize,

    /// Capacity of the rolling tick-loss window used for plateau detection
    pub loss_window: usize,

    /// Relative improvement across a full window below which the rate decays
    pub decay_threshold: f32,

    /// Multiplier applied to the learning rate on a decay event
    pub decay_factor: f32,

    /// Seed for weight initialization and pixel sampling; time-based when absent
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![32, 32, 32],
            learning_rate: 0.01,
            momentum: 0.9,
            l2_decay: 1e-5,
            min_learning_rate: 1e-5,
            batch_size: 32,
            batches_per_tick: 50,
            loss_window: 20,
            decay_threshold: 0.01,
            decay_factor: 0.5,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Checks the structural fields. Learning rate and momentum are left alone.
    pub fn validate(&self) -> Result<()> {
        if let Some(position) = self.hidden_layers.iter().position(|&width| width == 0) {
            return Err(EngineError::InvalidConfig(format!(
                "hidden layer {} has zero width",
                position
            )));
        }

        if self.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }

        if self.batches_per_tick == 0 {
            return Err(EngineError::InvalidConfig(
                "batches_per_tick must be positive".to_string(),
            ));
        }

        if self.loss_window < 2 {
            return Err(EngineError::InvalidConfig(
                "loss_window must hold at least two losses".to_string(),
            ));
        }

        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "decay_factor must be in (0, 1), got {}",
                self.decay_factor
            )));
        }

        if !self.decay_threshold.is_finite() {
            return Err(EngineError::InvalidConfig(
                "decay_threshold must be finite".to_string(),
            ));
        }

        if self.min_learning_rate < 0.0 {
            return Err(EngineError::InvalidConfig(
                "min_learning_rate must be non-negative".to_string(),
            ));
        }

        if self.l2_decay < 0.0 {
            return Err(EngineError::InvalidConfig(
                "l2_decay must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Loads an engine configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into an `EngineConfig` (missing
/// fields take their defaults) and validates it.
///
/// # Examples
///
/// ```no_run
/// use neural_canvas::config::load_config;
///
/// let cfg = load_config("config/default.json").unwrap();
/// assert_eq!(cfg.batches_per_tick, 50);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig =
        serde_json::from_str(&contents).map_err(|source| EngineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"batch_size": 4}"#).unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.hidden_layers, vec![32, 32, 32]);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_rejects_zero_width_layer() {
        let config = EngineConfig {
            hidden_layers: vec![8, 0],
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_accepts_negative_learning_rate_and_large_momentum() {
        let config = EngineConfig {
            learning_rate: -0.5,
            momentum: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_decay_factor_out_of_range() {
        for factor in [0.0, 1.0, 1.5, -0.1] {
            let config = EngineConfig {
                decay_factor: factor,
                ..EngineConfig::default()
            };
            assert!(config.validate().is_err(), "factor {} accepted", factor);
        }
    }
}
