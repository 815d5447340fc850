//! Neural Canvas
//!
//! A small multilayer perceptron that learns to paint an image by mapping
//! pixel coordinates to colors, trained continuously on a background worker.
//!
//! # Modules
//!
//! - `network`: the coordinate-to-color MLP (forward, train step, snapshot/restore)
//! - `layers`: Layer trait and the dense layer with momentum buffers
//! - `optimizers`: Optimizer trait and momentum SGD
//! - `utils`: RNG, activation functions, plateau learning-rate decay
//! - `training`: target image, batch steps, scheduler ticks
//! - `snapshot`: milestone schedule and snapshot capture
//! - `render`: journey (ping-pong animation) assembly
//! - `engine`: command/event protocol, engine state machine, worker thread
//! - `gif`: boundary to an external animation encoder
//! - `config`: engine configuration loaded from JSON
//! - `error`: crate error type
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod engine;
pub mod error;
pub mod gif;
pub mod layers;
pub mod logging;
pub mod network;
pub mod optimizers;
pub mod render;
pub mod snapshot;
pub mod training;
pub mod utils;

pub use config::{load_config, EngineConfig};
pub use engine::{Command, Engine, EngineWorker, Event};
pub use error::{EngineError, Result};
pub use network::{NetworkConfig, NetworkModel};
pub use snapshot::{schedule_milestones, Snapshot, SnapshotManager};
pub use training::TargetImage;
