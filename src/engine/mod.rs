//! The engine: one instance owning model, target, training, and snapshot state
//!
//! Commands go in through [`Engine::handle`], training advances through
//! [`Engine::tick`], and both return the events they produced. Nothing here
//! blocks or spawns; [`worker::EngineWorker`] puts an engine on its own thread.

pub mod protocol;
pub mod worker;

pub use protocol::{Command, Event};
pub use worker::{CooperativeTask, EngineWorker};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::network::{NetworkConfig, NetworkModel};
use crate::render::build_journey;
use crate::snapshot::{CaptureProgress, SnapshotManager};
use crate::training::{TargetImage, TrainingState};
use crate::utils::{PlateauDecay, SimpleRng};
use tracing::{debug, info, warn};

/// Hyperparameters of the current session.
///
/// Set by `init`, updated by the live setters and by `reset` overrides, and
/// used whenever the model and training state are rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParameters {
    pub learning_rate: f32,
    pub momentum: f32,
    pub batch_size: usize,
    pub min_learning_rate: f32,
}

impl SessionParameters {
    fn from_config(config: &EngineConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            momentum: config.momentum,
            batch_size: config.batch_size,
            min_learning_rate: config.min_learning_rate,
        }
    }
}

/// Training engine state machine.
///
/// # Example
///
/// ```
/// use neural_canvas::config::EngineConfig;
/// use neural_canvas::engine::{Command, Engine, Event};
///
/// let mut engine = Engine::new(EngineConfig {
///     hidden_layers: vec![8],
///     seed: Some(1),
///     ..EngineConfig::default()
/// })
/// .unwrap();
/// let events = engine.handle(Command::Init {
///     image: vec![255, 0, 0, 255].repeat(4),
///     width: 2,
///     height: 2,
///     learning_rate: 0.01,
///     momentum: 0.9,
///     batch_size: 1,
///     min_learning_rate: 1e-5,
/// });
/// assert_eq!(events, vec![Event::Ready]);
///
/// engine.handle(Command::Start);
/// assert!(matches!(engine.tick()[0], Event::Progress { iteration: 50, .. }));
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    session: SessionParameters,
    rng: SimpleRng,
    model: Option<NetworkModel>,
    target: Option<TargetImage>,
    training: TrainingState,
    snapshots: SnapshotManager,
    render_requested: bool,
}

impl Engine {
    /// Builds an idle engine; fails when `config` does not pass [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let session = SessionParameters::from_config(&config);
        let rng = SimpleRng::from_seed_or_time(config.seed);
        let training = Self::fresh_training(&config, &session);
        Ok(Self {
            config,
            session,
            rng,
            model: None,
            target: None,
            training,
            snapshots: SnapshotManager::new(),
            render_requested: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> SessionParameters {
        self.session
    }

    /// A model and a target image are loaded.
    pub fn is_ready(&self) -> bool {
        self.model.is_some() && self.target.is_some()
    }

    /// Training is active and has something to train on.
    pub fn is_running(&self) -> bool {
        self.training.is_running() && self.is_ready()
    }

    pub fn iteration(&self) -> u64 {
        self.training.iteration()
    }

    pub fn learning_rate(&self) -> f32 {
        self.training.learning_rate()
    }

    pub fn training(&self) -> &TrainingState {
        &self.training
    }

    pub fn model(&self) -> Option<&NetworkModel> {
        self.model.as_ref()
    }

    pub fn target(&self) -> Option<&TargetImage> {
        self.target.as_ref()
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    /// Applies one command and returns the events it produced.
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        match command {
            Command::Init {
                image,
                width,
                height,
                learning_rate,
                momentum,
                batch_size,
                min_learning_rate,
            } => self.init(
                image,
                width,
                height,
                SessionParameters {
                    learning_rate,
                    momentum,
                    batch_size,
                    min_learning_rate,
                },
            ),
            Command::Start => {
                if self.is_ready() {
                    self.training.set_running(true);
                    debug!(iteration = self.iteration(), "training started");
                } else {
                    debug!("start ignored, engine not initialized");
                }
                Vec::new()
            }
            Command::Stop => {
                self.training.set_running(false);
                debug!(iteration = self.iteration(), "training stopped");
                Vec::new()
            }
            Command::Render => self.request_render(),
            Command::SetLearningRate { value } => {
                self.session.learning_rate = value;
                self.training.set_learning_rate(value);
                if let Some(model) = self.model.as_mut() {
                    model.set_learning_rate(value);
                }
                Vec::new()
            }
            Command::SetMomentum { value } => {
                self.session.momentum = value;
                if let Some(model) = self.model.as_mut() {
                    model.set_momentum(value);
                }
                Vec::new()
            }
            Command::SetBatchSize { value } => {
                if value == 0 {
                    warn!("batch size 0 ignored");
                } else {
                    self.session.batch_size = value;
                    self.training.set_batch_size(value);
                }
                Vec::new()
            }
            Command::Reset {
                learning_rate,
                momentum,
            } => self.reset(learning_rate, momentum),
            Command::Resize {
                image,
                width,
                height,
            } => self.resize(image, width, height),
            Command::EnableSnapshotCapture {
                max_iterations,
                frame_count,
            } => {
                let captured = self.snapshots.enable_capture(
                    max_iterations,
                    frame_count,
                    self.model.as_ref(),
                    self.training.iteration(),
                );
                captured.map(captured_event).into_iter().collect()
            }
            Command::DisableSnapshotCapture => {
                self.snapshots.disable_capture();
                debug!("snapshot capture disabled");
                Vec::new()
            }
            Command::GenerateGifFrames => self.generate_gif_frames(),
            Command::RenderSnapshot { index } => self.render_snapshot(index),
        }
    }

    /// Runs one bounded unit of training.
    ///
    /// Emits `Progress`, then `SnapshotCaptured` when a milestone was reached,
    /// then `Render` when one was requested. Does nothing while paused.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.training.is_running() {
            return Vec::new();
        }
        let (Some(model), Some(target)) = (self.model.as_mut(), self.target.as_ref()) else {
            return Vec::new();
        };

        let report = self.training.tick(model, target, &mut self.rng);
        let mut events = vec![Event::Progress {
            iteration: report.iteration,
            loss: report.loss,
            learning_rate: report.learning_rate,
        }];

        if let Some(progress) = self.snapshots.maybe_capture(model, report.iteration) {
            events.push(captured_event(progress));
        }

        if self.render_requested {
            self.render_requested = false;
            events.push(Event::Render {
                buffer: model.render_to_buffer(target.width(), target.height()),
                width: target.width(),
                height: target.height(),
            });
        }

        events
    }

    fn fresh_training(config: &EngineConfig, session: &SessionParameters) -> TrainingState {
        let scheduler = PlateauDecay::new(
            session.learning_rate,
            session.min_learning_rate,
            config.loss_window,
            config.decay_threshold,
            config.decay_factor,
        );
        TrainingState::new(session.batch_size, config.batches_per_tick, scheduler)
    }

    /// New weights, zero iteration, empty loss history; keeps the running flag.
    fn rebuild(&mut self) -> Option<CaptureProgress> {
        let network = NetworkConfig {
            hidden_layers: self.config.hidden_layers.clone(),
            learning_rate: self.session.learning_rate,
            momentum: self.session.momentum,
            l2_decay: self.config.l2_decay,
        };
        let model = NetworkModel::new(&network, &mut self.rng);
        let running = self.training.is_running();
        self.training = Self::fresh_training(&self.config, &self.session);
        self.training.set_running(running);
        self.render_requested = false;
        let captured = self.snapshots.restart(Some(&model), 0);
        self.model = Some(model);
        captured
    }

    fn init(
        &mut self,
        image: Vec<u8>,
        width: usize,
        height: usize,
        session: SessionParameters,
    ) -> Vec<Event> {
        let target = match TargetImage::new(image, width, height) {
            Ok(target) => target,
            Err(err) => {
                warn!(%err, "init ignored");
                return Vec::new();
            }
        };

        self.session = SessionParameters {
            batch_size: session.batch_size.max(1),
            ..session
        };
        self.target = Some(target);
        self.training.set_running(false);
        let captured = self.rebuild();
        info!(
            width,
            height,
            parameters = self.model.as_ref().map_or(0, NetworkModel::parameter_count),
            learning_rate = self.session.learning_rate,
            "engine initialized"
        );

        let mut events = vec![Event::Ready];
        events.extend(captured.map(captured_event));
        events
    }

    fn reset(&mut self, learning_rate: Option<f32>, momentum: Option<f32>) -> Vec<Event> {
        if !self.is_ready() {
            debug!("reset ignored, engine not initialized");
            return Vec::new();
        }
        if let Some(learning_rate) = learning_rate {
            self.session.learning_rate = learning_rate;
        }
        if let Some(momentum) = momentum {
            self.session.momentum = momentum;
        }

        self.training.set_running(false);
        let captured = self.rebuild();
        info!(learning_rate = self.session.learning_rate, "engine reset");

        let mut events = vec![Event::Reset];
        events.extend(captured.map(captured_event));
        events
    }

    fn resize(&mut self, image: Vec<u8>, width: usize, height: usize) -> Vec<Event> {
        if !self.is_ready() {
            debug!("resize ignored, engine not initialized");
            return Vec::new();
        }
        let target = match TargetImage::new(image, width, height) {
            Ok(target) => target,
            Err(err) => {
                warn!(%err, "resize ignored");
                return Vec::new();
            }
        };

        self.target = Some(target);
        let captured = self.rebuild();
        info!(width, height, "target image replaced");

        let mut events = vec![Event::Reset];
        events.extend(captured.map(captured_event));
        events
    }

    fn request_render(&mut self) -> Vec<Event> {
        let (Some(model), Some(target)) = (self.model.as_ref(), self.target.as_ref()) else {
            debug!("render ignored, engine not initialized");
            return Vec::new();
        };
        if self.training.is_running() {
            self.render_requested = true;
            return Vec::new();
        }
        // No tick is coming while paused.
        vec![Event::Render {
            buffer: model.render_to_buffer(target.width(), target.height()),
            width: target.width(),
            height: target.height(),
        }]
    }

    fn generate_gif_frames(&mut self) -> Vec<Event> {
        let was_running = self.training.is_running();
        self.training.set_running(false);
        let event = match self.assemble_journey() {
            Ok(event) => event,
            Err(message) => {
                warn!(%message, "journey not generated");
                Event::GifError { message }
            }
        };
        self.training.set_running(was_running);
        vec![event]
    }

    fn assemble_journey(&mut self) -> std::result::Result<Event, String> {
        if self.snapshots.is_empty() {
            return Err("No snapshots captured. Enable snapshot capture and train first.".into());
        }
        let Some(target) = self.target.as_ref() else {
            return Err("No target image loaded.".into());
        };
        let Some(model) = self.model.as_mut() else {
            return Err(EngineError::NotReady.to_string());
        };

        let (width, height) = (target.width(), target.height());
        let frames = build_journey(model, self.snapshots.snapshots(), width, height)
            .map_err(|err| err.to_string())?;
        info!(frames = frames.len(), "journey frames generated");
        Ok(Event::GifFrames {
            frames,
            width,
            height,
        })
    }

    fn render_snapshot(&mut self, index: usize) -> Vec<Event> {
        let was_running = self.training.is_running();
        self.training.set_running(false);
        let result = self.render_snapshot_frame(index);
        self.training.set_running(was_running);

        match result {
            Ok(event) => vec![event],
            Err(err) => {
                warn!(%err, "renderSnapshot ignored");
                Vec::new()
            }
        }
    }

    fn render_snapshot_frame(&mut self, index: usize) -> Result<Event> {
        let (Some(model), Some(target)) = (self.model.as_mut(), self.target.as_ref()) else {
            return Err(EngineError::NotReady);
        };

        let live = model.snapshot(self.training.iteration());
        let rendered =
            self.snapshots
                .render_snapshot(index, model, target.width(), target.height());
        model.restore(&live)?;

        Ok(Event::SnapshotRendered {
            buffer: rendered?,
            width: target.width(),
            height: target.height(),
            index,
            iteration: self.snapshots.snapshots()[index].iteration,
        })
    }
}

fn captured_event(progress: CaptureProgress) -> Event {
    Event::SnapshotCaptured {
        count: progress.count,
        total: progress.total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            hidden_layers: vec![6, 6],
            batches_per_tick: 5,
            seed: Some(11),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn init_command() -> Command {
        Command::Init {
            image: vec![10, 200, 30, 255].repeat(9),
            width: 3,
            height: 3,
            learning_rate: 0.01,
            momentum: 0.9,
            batch_size: 2,
            min_learning_rate: 1e-4,
        }
    }

    #[test]
    fn test_commands_before_init_are_silent() {
        let mut engine = engine();
        for command in [
            Command::Start,
            Command::Render,
            Command::Reset {
                learning_rate: None,
                momentum: None,
            },
            Command::RenderSnapshot { index: 0 },
        ] {
            assert!(engine.handle(command).is_empty());
        }
        assert!(engine.tick().is_empty());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Engine::new(EngineConfig {
            batches_per_tick: 0,
            ..EngineConfig::default()
        });
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_init_image_is_ignored() {
        let mut engine = engine();
        let events = engine.handle(Command::Init {
            image: vec![0; 7],
            width: 3,
            height: 3,
            learning_rate: 0.01,
            momentum: 0.9,
            batch_size: 2,
            min_learning_rate: 1e-4,
        });
        assert!(events.is_empty());
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_render_while_paused_is_immediate() {
        let mut engine = engine();
        engine.handle(init_command());

        let events = engine.handle(Command::Render);

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Render { buffer, width: 3, height: 3 } if buffer.len() == 36));
    }

    #[test]
    fn test_render_while_running_waits_for_tick() {
        let mut engine = engine();
        engine.handle(init_command());
        engine.handle(Command::Start);

        assert!(engine.handle(Command::Render).is_empty());
        let events = engine.tick();

        assert!(matches!(events[0], Event::Progress { .. }));
        assert!(matches!(events.last(), Some(Event::Render { .. })));
        assert!(!engine.tick().iter().any(|e| matches!(e, Event::Render { .. })));
    }

    #[test]
    fn test_live_setters_reach_model() {
        let mut engine = engine();
        engine.handle(init_command());

        engine.handle(Command::SetLearningRate { value: 0.5 });
        engine.handle(Command::SetMomentum { value: 0.1 });
        engine.handle(Command::SetBatchSize { value: 7 });
        engine.handle(Command::SetBatchSize { value: 0 });

        let model = engine.model().unwrap();
        assert_eq!(model.learning_rate(), 0.5);
        assert_eq!(model.momentum(), 0.1);
        assert_eq!(engine.learning_rate(), 0.5);
        assert_eq!(engine.training().batch_size(), 7);
    }

    #[test]
    fn test_stop_takes_effect_at_tick_boundary() {
        let mut engine = engine();
        engine.handle(init_command());
        engine.handle(Command::Start);
        engine.tick();
        engine.handle(Command::Stop);

        assert!(engine.tick().is_empty());
        assert_eq!(engine.iteration(), 5);
    }
}
