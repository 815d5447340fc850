//! Parameter snapshots and the milestone schedule that decides when to take them
//!
//! Snapshots are spaced logarithmically in iterations: early training changes
//! the picture quickly, so early snapshots are dense and later ones sparse.

use crate::error::{EngineError, Result};
use crate::network::NetworkModel;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Weights and biases of one layer at the time of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

/// Deep copy of every layer's parameters at a given iteration.
///
/// Owns its buffers, so later training on the live model never reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub iteration: u64,
    pub layers: Vec<LayerSnapshot>,
}

impl Snapshot {
    /// `(outputs, inputs)` for each layer.
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        self.layers
            .iter()
            .map(|layer| (layer.outputs, layer.inputs))
            .collect()
    }

    /// Writes the snapshot as JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer(BufWriter::new(file), self).map_err(|source| EngineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads a snapshot written by [`Snapshot::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| EngineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Upper bound on snapshots per capture session.
///
/// Every snapshot is a full parameter copy and the journey renders each one
/// twice, so larger requests are clamped to this.
pub const MAX_FRAME_COUNT: usize = 1000;

/// Iterations at which a capture session takes snapshots.
///
/// The schedule starts at 0, ends at `max_iterations`, and is strictly
/// increasing. With `frame_count <= 2` it is `[0, max_iterations]`. Otherwise
/// `base = max_iterations^(1 / (frame_count - 2))`, the interior entries are
/// `floor(base^i)` for `i in 0..frame_count - 2`, and the schedule has exactly
/// `frame_count` entries.
///
/// Rounding can make neighbouring powers collide; a colliding entry is bumped
/// to one past its predecessor (and capped so every later entry still fits
/// below `max_iterations`). When `max_iterations < frame_count - 1` there are
/// not enough distinct iterations and the schedule is every iteration
/// `0..=max_iterations`.
///
/// `frame_count` is clamped to [`MAX_FRAME_COUNT`] first, so the schedule
/// never holds more than `min(frame_count, MAX_FRAME_COUNT, max_iterations + 1)`
/// entries.
///
/// # Examples
///
/// ```
/// use neural_canvas::snapshot::schedule_milestones;
///
/// assert_eq!(schedule_milestones(100, 5), vec![0, 1, 4, 21, 100]);
/// assert_eq!(schedule_milestones(100, 2), vec![0, 100]);
/// ```
pub fn schedule_milestones(max_iterations: u64, frame_count: usize) -> Vec<u64> {
    let frame_count = frame_count.min(MAX_FRAME_COUNT);
    if max_iterations == 0 {
        return vec![0];
    }
    if frame_count <= 2 {
        return vec![0, max_iterations];
    }
    if max_iterations < (frame_count - 1) as u64 {
        return (0..=max_iterations).collect();
    }

    let interior = frame_count - 2;
    let base = (max_iterations as f64).powf(1.0 / interior as f64);
    let mut milestones = Vec::with_capacity(frame_count);
    milestones.push(0u64);

    for i in 0..interior {
        let previous = milestones[milestones.len() - 1];
        // Entries still to come after this one, the final max included.
        let remaining = (interior - i) as u64;
        let raw = base.powi(i as i32).floor() as u64;
        milestones.push(raw.max(previous + 1).min(max_iterations - remaining));
    }

    milestones.push(max_iterations);
    milestones
}

/// Snapshot count after a capture, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProgress {
    pub count: usize,
    pub total: usize,
}

/// Owns the capture session: schedule, enabled flag, and captured snapshots.
#[derive(Debug, Default)]
pub struct SnapshotManager {
    enabled: bool,
    milestones: Vec<u64>,
    snapshots: Vec<Snapshot>,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn milestones(&self) -> &[u64] {
        &self.milestones
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Starts a capture session.
    ///
    /// Prior snapshots are discarded. With a model present, the first
    /// snapshot is taken right away.
    pub fn enable_capture(
        &mut self,
        max_iterations: u64,
        frame_count: usize,
        model: Option<&NetworkModel>,
        iteration: u64,
    ) -> Option<CaptureProgress> {
        self.milestones = schedule_milestones(max_iterations, frame_count);
        self.enabled = true;
        debug!(milestones = ?self.milestones, "snapshot capture enabled");
        self.restart(model, iteration)
    }

    /// Ends the capture session and drops every snapshot.
    pub fn disable_capture(&mut self) {
        self.enabled = false;
        self.milestones.clear();
        self.snapshots.clear();
    }

    /// Discards snapshots but keeps the session; used when the model is rebuilt.
    ///
    /// With capture enabled and a model present, the first milestone is
    /// captured again from the new model.
    pub fn restart(
        &mut self,
        model: Option<&NetworkModel>,
        iteration: u64,
    ) -> Option<CaptureProgress> {
        self.snapshots.clear();
        match model {
            Some(model) if self.enabled => self.capture(model, iteration),
            _ => None,
        }
    }

    /// Captures when `iteration` has reached the next unmet milestone.
    ///
    /// Called once per scheduler tick, so at most one snapshot per call.
    pub fn maybe_capture(
        &mut self,
        model: &NetworkModel,
        iteration: u64,
    ) -> Option<CaptureProgress> {
        if !self.enabled {
            return None;
        }
        let next = *self.milestones.get(self.snapshots.len())?;
        if iteration >= next {
            self.capture(model, iteration)
        } else {
            None
        }
    }

    fn capture(&mut self, model: &NetworkModel, iteration: u64) -> Option<CaptureProgress> {
        if self.snapshots.len() >= self.milestones.len() {
            return None;
        }
        self.snapshots.push(model.snapshot(iteration));
        let progress = CaptureProgress {
            count: self.snapshots.len(),
            total: self.milestones.len(),
        };
        debug!(
            iteration,
            count = progress.count,
            total = progress.total,
            "snapshot captured"
        );
        Some(progress)
    }

    /// Restores snapshot `index` into `model` and renders it.
    ///
    /// The model is left holding the snapshot parameters; putting the live
    /// parameters back is up to the caller.
    pub fn render_snapshot(
        &self,
        index: usize,
        model: &mut NetworkModel,
        width: usize,
        height: usize,
    ) -> Result<Vec<u8>> {
        let snapshot = self
            .snapshots
            .get(index)
            .ok_or(EngineError::SnapshotIndex {
                index,
                count: self.snapshots.len(),
            })?;
        model.restore(snapshot)?;
        Ok(model.render_to_buffer(width, height))
    }
}
