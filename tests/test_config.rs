//! Tests for configuration parsing
//!
//! This file tests the config module including:
//! - Loading the shipped default config
//! - Handling missing optional fields with defaults
//! - Handling invalid JSON and missing files
//! - Rejecting structurally invalid values

use neural_canvas::config::{load_config, EngineConfig};
use neural_canvas::error::EngineError;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Valid Config Loading Tests
// ============================================================================

mod valid_config_tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = load_config("config/default.json").expect("Failed to load default config");

        assert_eq!(config.hidden_layers, vec![32, 32, 32]);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.batches_per_tick, 50);
        assert_eq!(config.loss_window, 20);
        assert!((config.learning_rate - 0.01).abs() < 1e-6);
        assert!((config.momentum - 0.9).abs() < 1e-6);
        assert!((config.decay_factor - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_default_file_matches_default_struct() {
        let config = load_config("config/default.json").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "partial.json", r#"{ "hidden_layers": [4], "seed": 7 }"#);

        let config = load_config(&path).unwrap();

        assert_eq!(config.hidden_layers, vec![4]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.batches_per_tick, 50);
        assert_eq!(config.min_learning_rate, EngineConfig::default().min_learning_rate);
    }

    #[test]
    fn test_empty_object_is_default() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "empty.json", "{}");
        assert_eq!(load_config(&path).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_no_hidden_layers_is_allowed() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "linear.json", r#"{ "hidden_layers": [] }"#);
        assert!(load_config(&path).unwrap().hidden_layers.is_empty());
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_config("nonexistent_config.json");
        assert!(matches!(result, Err(EngineError::Io { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "broken.json", r#"{ "batch_size": 32,"#);

        match load_config(&path) {
            Err(EngineError::Json { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected JSON error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_type() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "typed.json", r#"{ "batch_size": "large" }"#);
        assert!(matches!(load_config(&path), Err(EngineError::Json { .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        for (name, body) in [
            ("zero_batch.json", r#"{ "batch_size": 0 }"#),
            ("zero_ticks.json", r#"{ "batches_per_tick": 0 }"#),
            ("short_window.json", r#"{ "loss_window": 1 }"#),
            ("factor.json", r#"{ "decay_factor": 1.5 }"#),
            ("floor.json", r#"{ "min_learning_rate": -0.1 }"#),
            ("layer.json", r#"{ "hidden_layers": [16, 0, 16] }"#),
        ] {
            let path = write_config(&dir, name, body);
            assert!(
                matches!(load_config(&path), Err(EngineError::InvalidConfig(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_error_message_names_file() {
        let err = load_config("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("exist.json"));
    }
}
