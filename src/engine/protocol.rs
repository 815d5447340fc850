//! Command and event messages exchanged with the engine
//!
//! Both directions are closed enums. On the wire they are JSON objects tagged
//! by a `type` field with camelCase names, for example
//! `{"type": "setLearningRate", "value": 0.005}`.
//!
//! Pixel buffers travel by value: a command hands its image to the engine,
//! and every event carries a buffer allocated for that event alone.

use serde::{Deserialize, Serialize};

/// Requests from the caller to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Builds a fresh model for `image` and resets training; answered by `Ready`.
    #[serde(rename_all = "camelCase")]
    Init {
        image: Vec<u8>,
        width: usize,
        height: usize,
        learning_rate: f32,
        momentum: f32,
        batch_size: usize,
        min_learning_rate: f32,
    },
    Start,
    Stop,
    /// Asks for one `Render` event at the next tick boundary.
    Render,
    SetLearningRate {
        value: f32,
    },
    SetMomentum {
        value: f32,
    },
    SetBatchSize {
        value: usize,
    },
    /// Stops training and rebuilds the model; answered by `Reset`.
    #[serde(rename_all = "camelCase")]
    Reset {
        #[serde(default)]
        learning_rate: Option<f32>,
        #[serde(default)]
        momentum: Option<f32>,
    },
    /// Swaps in a new target image and rebuilds the model; answered by `Reset`.
    Resize {
        image: Vec<u8>,
        width: usize,
        height: usize,
    },
    #[serde(rename_all = "camelCase")]
    EnableSnapshotCapture {
        max_iterations: u64,
        frame_count: usize,
    },
    DisableSnapshotCapture,
    /// Renders the journey; answered by `GifFrames` or `GifError`.
    GenerateGifFrames,
    RenderSnapshot {
        index: usize,
    },
}

/// Notifications from the engine to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Ready,
    #[serde(rename_all = "camelCase")]
    Progress {
        iteration: u64,
        loss: f32,
        learning_rate: f32,
    },
    Render {
        buffer: Vec<u8>,
        width: usize,
        height: usize,
    },
    Reset,
    SnapshotCaptured {
        count: usize,
        total: usize,
    },
    GifFrames {
        frames: Vec<Vec<u8>>,
        width: usize,
        height: usize,
    },
    GifError {
        message: String,
    },
    SnapshotRendered {
        buffer: Vec<u8>,
        width: usize,
        height: usize,
        index: usize,
        iteration: u64,
    },
}
