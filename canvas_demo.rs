use neural_canvas::config::{load_config, EngineConfig};
use neural_canvas::engine::{Command, Engine, EngineWorker, Event};
use neural_canvas::logging;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

// Target image size.
const WIDTH: usize = 64;
const HEIGHT: usize = 64;

// Capture session: snapshots up to this iteration, this many frames.
const MAX_ITERATIONS: u64 = 20_000;
const FRAME_COUNT: usize = 24;

// Print every Nth progress event.
const REPORT_EVERY: usize = 20;

const DEFAULT_CONFIG: &str = "config/default.json";
const OUTPUT_FILE: &str = "canvas_demo.ppm";

/// Diagonal red/blue blend with a green ring, so the network has both smooth
/// regions and an edge to learn.
fn synthesize_target(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / (width - 1).max(1) as f32;
            let v = y as f32 / (height - 1).max(1) as f32;
            let radius = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
            let ring = if (0.25..0.32).contains(&radius) { 1.0 } else { 0.0 };
            pixels.push((255.0 * (u + v) / 2.0) as u8);
            pixels.push((255.0 * ring) as u8);
            pixels.push((255.0 * (1.0 - (u + v) / 2.0)) as u8);
            pixels.push(255);
        }
    }
    pixels
}

/// Loads the config named on the command line, or the default file when present.
fn resolve_config() -> Result<EngineConfig, Box<dyn Error>> {
    if let Some(path) = std::env::args().nth(1) {
        return Ok(load_config(path)?);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        return Ok(load_config(DEFAULT_CONFIG)?);
    }
    warn!(path = DEFAULT_CONFIG, "config not found, using built-in defaults");
    Ok(EngineConfig::default())
}

/// Writes RGBA pixels as a binary PPM (alpha dropped).
fn save_ppm(path: &str, buffer: &[u8], width: usize, height: usize) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write!(writer, "P6\n{} {}\n255\n", width, height)?;
    for pixel in buffer.chunks_exact(4) {
        writer.write_all(&pixel[..3])?;
    }
    writer.flush()
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Err(err) = logging::init_tracing() {
        eprintln!("logging disabled: {}", err);
    }

    let config = resolve_config()?;
    println!(
        "Network: 2 -> {:?} -> 3, lr={}, momentum={}, batch={}",
        config.hidden_layers, config.learning_rate, config.momentum, config.batch_size
    );

    let init = Command::Init {
        image: synthesize_target(WIDTH, HEIGHT),
        width: WIDTH,
        height: HEIGHT,
        learning_rate: config.learning_rate,
        momentum: config.momentum,
        batch_size: config.batch_size,
        min_learning_rate: config.min_learning_rate,
    };
    let worker = EngineWorker::spawn(Engine::new(config)?)?;

    worker.send(init);
    worker.send(Command::EnableSnapshotCapture {
        max_iterations: MAX_ITERATIONS,
        frame_count: FRAME_COUNT,
    });
    worker.send(Command::Start);

    let mut progress_events = 0usize;
    let mut final_render = None;
    let mut journey_done = false;

    while final_render.is_none() || !journey_done {
        let Some(event) = worker.recv() else {
            return Err("engine worker exited early".into());
        };
        match event {
            Event::Ready => println!("Engine ready ({}x{} target)", WIDTH, HEIGHT),
            Event::Progress {
                iteration,
                loss,
                learning_rate,
            } => {
                if progress_events % REPORT_EVERY == 0 {
                    println!(
                        "Iteration {:6} | loss {:.6} | lr {:.6}",
                        iteration, loss, learning_rate
                    );
                }
                progress_events += 1;
            }
            Event::SnapshotCaptured { count, total } => {
                println!("Snapshot {}/{}", count, total);
                if count == total {
                    worker.send(Command::Stop);
                    worker.send(Command::Render);
                    worker.send(Command::GenerateGifFrames);
                }
            }
            Event::Render {
                buffer,
                width,
                height,
            } => final_render = Some((buffer, width, height)),
            Event::GifFrames { frames, .. } => {
                println!("Journey assembled: {} frames", frames.len());
                journey_done = true;
            }
            Event::GifError { message } => {
                warn!(%message, "journey not available");
                journey_done = true;
            }
            Event::Reset | Event::SnapshotRendered { .. } => {}
        }
    }

    if let Some((buffer, width, height)) = final_render {
        save_ppm(OUTPUT_FILE, &buffer, width, height)?;
        info!(path = OUTPUT_FILE, "final render written");
        println!("Final render written to {}", OUTPUT_FILE);
    }

    Ok(())
}
