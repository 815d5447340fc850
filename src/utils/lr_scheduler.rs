//! Learning rate scheduler trait and the plateau decay policy
//!
//! The trainer does not decay on a timetable. It watches a rolling window of
//! recent losses and shrinks the learning rate only when progress across that
//! window stalls.

use std::collections::VecDeque;

/// Core trait for learning rate schedulers.
///
/// Schedulers are fed one loss observation per scheduler tick and report
/// whether that observation changed the learning rate.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = PlateauDecay::new(0.01, 1e-5, 20, 0.01, 0.5);
///
/// // After each tick
/// if scheduler.observe(tick_loss) {
///     model.set_learning_rate(scheduler.get_lr());
/// }
/// ```
pub trait LRScheduler {
    /// Get the current learning rate.
    fn get_lr(&self) -> f32;

    /// Overwrite the current learning rate (live tuning from the caller).
    fn set_lr(&mut self, lr: f32);

    /// Record one loss observation.
    ///
    /// Returns `true` when the observation triggered a learning-rate change.
    fn observe(&mut self, loss: f32) -> bool;

    /// Reset the scheduler to its initial learning rate and clear its state.
    fn reset(&mut self);
}

/// Plateau-triggered learning rate decay.
///
/// Keeps the most recent `window` losses in a FIFO (oldest evicted on
/// overflow). Once the window is full the relative improvement
/// `(oldest - newest) / oldest` is checked; when it falls below `threshold`
/// and the rate is still above `min_lr`, the rate becomes
/// `max(lr * factor, min_lr)` and the window is cleared so the new rate gets
/// a fresh observation period.
///
/// The rate only ever moves down through `observe`, and a decay never takes
/// it below `min_lr`.
///
/// # Example
///
/// ```ignore
/// use neural_canvas::utils::lr_scheduler::{LRScheduler, PlateauDecay};
///
/// let mut scheduler = PlateauDecay::new(0.1, 0.01, 2, 0.05, 0.5);
/// scheduler.observe(1.0);
/// assert!(scheduler.observe(1.0)); // no improvement across a full window
/// assert_eq!(scheduler.get_lr(), 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct PlateauDecay {
    initial_lr: f32,
    current_lr: f32,
    min_lr: f32,
    window: usize,
    threshold: f32,
    factor: f32,
    history: VecDeque<f32>,
}

impl PlateauDecay {
    /// Creates a new plateau decay scheduler.
    ///
    /// # Arguments
    ///
    /// * `initial_lr` - Starting learning rate
    /// * `min_lr` - Floor for decayed rates
    /// * `window` - Number of losses compared (oldest vs newest)
    /// * `threshold` - Relative improvement below which the rate decays
    /// * `factor` - Decay multiplier, expected in (0, 1)
    pub fn new(initial_lr: f32, min_lr: f32, window: usize, threshold: f32, factor: f32) -> Self {
        let window = window.max(2);
        Self {
            initial_lr,
            current_lr: initial_lr,
            min_lr,
            window,
            threshold,
            factor,
            history: VecDeque::with_capacity(window),
        }
    }

    pub fn min_lr(&self) -> f32 {
        self.min_lr
    }

    /// Losses currently in the window, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Relative improvement across the full window, `None` until it fills.
    fn relative_improvement(&self) -> Option<f32> {
        if self.history.len() < self.window {
            return None;
        }
        let oldest = *self.history.front()?;
        let newest = *self.history.back()?;
        if oldest > 0.0 {
            Some((oldest - newest) / oldest)
        } else {
            // A zero loss cannot improve further.
            Some(0.0)
        }
    }
}

impl LRScheduler for PlateauDecay {
    fn get_lr(&self) -> f32 {
        self.current_lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.current_lr = lr;
    }

    fn observe(&mut self, loss: f32) -> bool {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(loss);

        let Some(improvement) = self.relative_improvement() else {
            return false;
        };

        if improvement < self.threshold && self.current_lr > self.min_lr {
            self.current_lr = (self.current_lr * self.factor).max(self.min_lr);
            self.history.clear();
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.current_lr = self.initial_lr;
        self.history.clear();
    }
}
