//! Mini-batch training over a target image
//!
//! A tick is the bounded unit of work the worker runs between command
//! checks: a fixed number of batch steps, followed by one loss observation
//! for the plateau scheduler.

use crate::error::{EngineError, Result};
use crate::network::{normalize_coordinate, NetworkModel};
use crate::utils::{LRScheduler, PlateauDecay, SimpleRng};
use tracing::info;

/// RGBA pixels of the image the network learns to reproduce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl TargetImage {
    /// Takes ownership of a `width × height × 4` byte buffer.
    pub fn new(pixels: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        let expected =
            rgba_len(width, height).ok_or(EngineError::ImageTooLarge { width, height })?;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(EngineError::InvalidImage {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Normalized network input and target color for the pixel at `index`.
    pub fn sample(&self, index: usize) -> ([f32; 2], [f32; 3]) {
        let x = index % self.width;
        let y = index / self.width;
        let offset = index * 4;
        let rgb = &self.pixels[offset..offset + 3];
        (
            [
                normalize_coordinate(x, self.width),
                normalize_coordinate(y, self.height),
            ],
            [
                rgb[0] as f32 / 255.0,
                rgb[1] as f32 / 255.0,
                rgb[2] as f32 / 255.0,
            ],
        )
    }
}

/// Byte length of a `width × height` RGBA buffer, `None` on overflow.
pub fn rgba_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(4)
}

/// Summed per-sample losses of one or more batch steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LossAccumulator {
    pub total: f32,
    pub samples: usize,
}

impl LossAccumulator {
    pub fn add(&mut self, loss: f32) {
        self.total += loss;
        self.samples += 1;
    }

    pub fn mean(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.total / self.samples as f32
        }
    }
}

/// Trains on `batch_size` pixels drawn uniformly with replacement.
pub fn train_batch(
    model: &mut NetworkModel,
    target: &TargetImage,
    batch_size: usize,
    rng: &mut SimpleRng,
) -> LossAccumulator {
    let pixel_count = target.width() * target.height();
    let mut losses = LossAccumulator::default();
    for _ in 0..batch_size {
        let ([x, y], color) = target.sample(rng.gen_usize(pixel_count));
        losses.add(model.train_step(x, y, color));
    }
    losses
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Iteration count after the tick
    pub iteration: u64,
    /// Mean per-sample loss across every batch of the tick
    pub loss: f32,
    /// Learning rate after any decay triggered by this tick
    pub learning_rate: f32,
    /// Whether this tick triggered a plateau decay
    pub decayed: bool,
}

/// Iteration counter, running flag, batch size, and learning-rate policy.
#[derive(Debug, Clone)]
pub struct TrainingState {
    iteration: u64,
    running: bool,
    batch_size: usize,
    batches_per_tick: usize,
    scheduler: PlateauDecay,
}

impl TrainingState {
    pub fn new(batch_size: usize, batches_per_tick: usize, scheduler: PlateauDecay) -> Self {
        Self {
            iteration: 0,
            running: false,
            batch_size,
            batches_per_tick,
            scheduler,
        }
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    pub fn batches_per_tick(&self) -> usize {
        self.batches_per_tick
    }

    pub fn learning_rate(&self) -> f32 {
        self.scheduler.get_lr()
    }

    pub fn set_learning_rate(&mut self, lr: f32) {
        self.scheduler.set_lr(lr);
    }

    /// Runs `batches_per_tick` batch steps, then feeds the tick loss to the scheduler.
    ///
    /// The iteration counter moves once per batch step. A decay is pushed
    /// into the model before returning.
    pub fn tick(
        &mut self,
        model: &mut NetworkModel,
        target: &TargetImage,
        rng: &mut SimpleRng,
    ) -> TickReport {
        let mut losses = LossAccumulator::default();
        for _ in 0..self.batches_per_tick {
            let batch = train_batch(model, target, self.batch_size, rng);
            losses.total += batch.total;
            losses.samples += batch.samples;
            self.iteration += 1;
        }

        let loss = losses.mean();
        let decayed = self.scheduler.observe(loss);
        if decayed {
            model.set_learning_rate(self.scheduler.get_lr());
            info!(
                iteration = self.iteration,
                learning_rate = self.scheduler.get_lr(),
                "loss plateaued, learning rate decayed"
            );
        }

        TickReport {
            iteration: self.iteration,
            loss,
            learning_rate: self.scheduler.get_lr(),
            decayed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_image_rejects_wrong_length() {
        let result = TargetImage::new(vec![0; 15], 2, 2);
        assert!(matches!(
            result,
            Err(EngineError::InvalidImage {
                expected: 16,
                actual: 15,
                ..
            })
        ));
    }

    #[test]
    fn test_target_image_rejects_overflowing_size() {
        assert!(matches!(
            TargetImage::new(Vec::new(), 1 << 62, 1),
            Err(EngineError::ImageTooLarge { height: 1, .. })
        ));
        assert!(TargetImage::new(Vec::new(), usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn test_target_image_rejects_empty() {
        assert!(TargetImage::new(Vec::new(), 0, 0).is_err());
    }

    #[test]
    fn test_sample_coordinates_and_color() {
        let mut pixels = vec![0u8; 2 * 2 * 4];
        // pixel (1, 1)
        pixels[12..16].copy_from_slice(&[255, 51, 0, 255]);
        let image = TargetImage::new(pixels, 2, 2).unwrap();

        let ([x, y], [r, g, b]) = image.sample(3);

        assert_eq!((x, y), (0.0, 0.0));
        assert_eq!(r, 1.0);
        assert!((g - 0.2).abs() < 1e-6);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_loss_accumulator_mean() {
        let mut losses = LossAccumulator::default();
        assert_eq!(losses.mean(), 0.0);
        losses.add(1.0);
        losses.add(3.0);
        assert_eq!(losses.mean(), 2.0);
    }
}
