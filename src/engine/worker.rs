//! Background worker running an engine on its own thread
//!
//! The loop interleaves command handling with bounded units of training work.
//! While the task wants more work, every queued command is handled before the
//! next unit runs, so `stop`, parameter changes, and `render` are never
//! starved. While it is idle the loop blocks on the command channel.

use super::{Command, Engine, Event};
use crate::error::{EngineError, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// A task driven by a message loop.
///
/// `run_unit` must do a bounded amount of work and return; cancellation is
/// whatever state `wants_more` reads, checked between units.
pub trait CooperativeTask {
    type Message;
    type Output;

    /// Handles one incoming message.
    fn handle(&mut self, message: Self::Message) -> Vec<Self::Output>;

    /// Performs one bounded unit of work.
    fn run_unit(&mut self) -> Vec<Self::Output>;

    /// Whether the loop should keep calling `run_unit` without waiting.
    fn wants_more(&self) -> bool;
}

impl CooperativeTask for Engine {
    type Message = Command;
    type Output = Event;

    fn handle(&mut self, message: Command) -> Vec<Event> {
        Engine::handle(self, message)
    }

    fn run_unit(&mut self) -> Vec<Event> {
        self.tick()
    }

    fn wants_more(&self) -> bool {
        self.is_running()
    }
}

/// Drives `task` until the message channel closes or the output receiver is dropped.
pub fn run_loop<T: CooperativeTask>(
    mut task: T,
    messages: Receiver<T::Message>,
    outputs: Sender<T::Output>,
) {
    loop {
        let message = if task.wants_more() {
            match messages.try_recv() {
                Ok(message) => Some(message),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match messages.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            }
        };

        let produced = match message {
            Some(message) => task.handle(message),
            None => task.run_unit(),
        };

        if produced.into_iter().any(|output| outputs.send(output).is_err()) {
            debug!("output receiver dropped");
            break;
        }
    }
}

/// Handle to an engine running on a background thread.
///
/// Dropping the handle closes the command channel and joins the thread.
///
/// # Example
///
/// ```no_run
/// use neural_canvas::config::EngineConfig;
/// use neural_canvas::engine::{Command, Engine, EngineWorker};
///
/// let engine = Engine::new(EngineConfig::default()).unwrap();
/// let worker = EngineWorker::spawn(engine).unwrap();
/// worker.send(Command::Start);
/// while let Some(event) = worker.recv() {
///     println!("{:?}", event);
/// }
/// ```
pub struct EngineWorker {
    commands: Option<Sender<Command>>,
    events: Receiver<Event>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EngineWorker {
    pub fn spawn(engine: Engine) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("neural-canvas-engine".to_string())
            .spawn(move || {
                info!("engine worker started");
                run_loop(engine, command_rx, event_tx);
                info!("engine worker stopped");
            })
            .map_err(EngineError::Spawn)?;

        Ok(Self {
            commands: Some(command_tx),
            events: event_rx,
            handle: Some(handle),
        })
    }

    /// Queues a command. Returns `false` once the worker has exited.
    pub fn send(&self, command: Command) -> bool {
        self.commands
            .as_ref()
            .is_some_and(|commands| commands.send(command).is_ok())
    }

    /// Blocks for the next event; `None` once the worker has exited.
    pub fn recv(&self) -> Option<Event> {
        self.events.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        self.commands.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
