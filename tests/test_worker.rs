//! Integration tests for the background engine worker
//!
//! These run a real engine thread and talk to it only through commands and
//! events, the way a front end would.

use neural_canvas::config::EngineConfig;
use neural_canvas::engine::{Command, Engine, EngineWorker, Event};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

fn spawn() -> EngineWorker {
    let engine = Engine::new(EngineConfig {
        hidden_layers: vec![8],
        batch_size: 4,
        batches_per_tick: 10,
        seed: Some(7),
        ..EngineConfig::default()
    })
    .expect("valid config");
    EngineWorker::spawn(engine).expect("worker thread")
}

fn init(worker: &EngineWorker) {
    assert!(worker.send(Command::Init {
        image: [30, 140, 220, 255].repeat(16),
        width: 4,
        height: 4,
        learning_rate: 0.01,
        momentum: 0.9,
        batch_size: 4,
        min_learning_rate: 1e-5,
    }));
    assert_eq!(worker.recv_timeout(TIMEOUT), Some(Event::Ready));
}

/// Reads events until one matches, failing after `TIMEOUT` of silence.
fn wait_for(worker: &EngineWorker, matches: impl Fn(&Event) -> bool) -> Event {
    loop {
        match worker.recv_timeout(TIMEOUT) {
            Some(event) if matches(&event) => return event,
            Some(_) => continue,
            None => panic!("worker went quiet"),
        }
    }
}

// ============================================================================
// Worker Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_progress_flows_while_running() {
        let worker = spawn();
        init(&worker);
        worker.send(Command::Start);

        let mut iterations = Vec::new();
        while iterations.len() < 3 {
            if let Event::Progress { iteration, .. } = wait_for(&worker, |e| {
                matches!(e, Event::Progress { .. })
            }) {
                iterations.push(iteration);
            }
        }

        assert_eq!(iterations, vec![10, 20, 30]);
    }

    #[test]
    fn test_stop_halts_progress() {
        let worker = spawn();
        init(&worker);
        worker.send(Command::Start);
        wait_for(&worker, |e| matches!(e, Event::Progress { .. }));

        worker.send(Command::Stop);
        // Commands are handled in order; once paused, render answers at once.
        worker.send(Command::Render);
        wait_for(&worker, |e| matches!(e, Event::Render { .. }));

        assert_eq!(worker.recv_timeout(Duration::from_millis(200)), None);
    }

    #[test]
    fn test_render_while_running_arrives_after_progress() {
        let worker = spawn();
        init(&worker);
        worker.send(Command::Start);
        worker.send(Command::Render);

        let event = wait_for(&worker, |e| matches!(e, Event::Render { .. }));

        assert!(matches!(
            event,
            Event::Render { buffer, width: 4, height: 4 } if buffer.len() == 64
        ));
        worker.send(Command::Stop);
    }

    #[test]
    fn test_gif_error_over_the_channel() {
        let worker = spawn();
        init(&worker);
        worker.send(Command::GenerateGifFrames);

        let event = wait_for(&worker, |e| matches!(e, Event::GifError { .. }));

        assert!(matches!(event, Event::GifError { message } if message.contains("No snapshots")));
    }

    #[test]
    fn test_full_capture_session() {
        let worker = spawn();
        init(&worker);
        worker.send(Command::EnableSnapshotCapture {
            max_iterations: 30,
            frame_count: 4,
        });
        worker.send(Command::Start);

        wait_for(&worker, |e| {
            matches!(e, Event::SnapshotCaptured { count: 4, total: 4 })
        });
        worker.send(Command::Stop);
        worker.send(Command::GenerateGifFrames);

        let event = wait_for(&worker, |e| matches!(e, Event::GifFrames { .. }));
        assert!(matches!(event, Event::GifFrames { frames, .. } if frames.len() == 6));
    }

    #[test]
    fn test_oversized_init_keeps_worker_alive() {
        let worker = spawn();
        assert!(worker.send(Command::Init {
            image: Vec::new(),
            width: 1 << 62,
            height: 1,
            learning_rate: 0.01,
            momentum: 0.9,
            batch_size: 4,
            min_learning_rate: 1e-5,
        }));

        // Ignored without an event; the next valid init still answers
        init(&worker);
        worker.send(Command::Start);
        wait_for(&worker, |e| matches!(e, Event::Progress { .. }));
        assert!(worker.send(Command::Stop));
    }

    #[test]
    fn test_drop_joins_running_worker() {
        let worker = spawn();
        init(&worker);
        worker.send(Command::Start);
        wait_for(&worker, |e| matches!(e, Event::Progress { .. }));

        drop(worker);
    }
}
