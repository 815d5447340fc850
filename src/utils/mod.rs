//! Shared utilities for the coordinate network
//!
//! This module provides random number generation, activation functions, and
//! the learning-rate scheduler used by the trainer.

pub mod activations;
pub mod lr_scheduler;
pub mod rng;

pub use activations::{clamp_unit_inplace, relu_derivative, relu_inplace};
pub use lr_scheduler::{LRScheduler, PlateauDecay};
pub use rng::SimpleRng;
