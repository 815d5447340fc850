//! Error type shared by the engine, its configuration loader, and snapshot persistence.

use std::path::PathBuf;

/// Everything that can go wrong inside the crate.
///
/// Most of these never reach the caller of the worker protocol: commands whose
/// preconditions are not met are dropped (and logged) instead. They surface
/// from the library-level APIs (`load_config`, `TargetImage::new`,
/// `NetworkModel::restore`, `build_journey`, snapshot persistence).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("image buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    InvalidImage {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("image size {width}x{height} overflows the address space")]
    ImageTooLarge { width: usize, height: usize },
    #[error("snapshot layer shapes {found:?} do not match model shapes {expected:?}")]
    SnapshotShape {
        expected: Vec<(usize, usize)>,
        found: Vec<(usize, usize)>,
    },
    #[error("journey needs at least two snapshots, have {0}")]
    NotEnoughSnapshots(usize),
    #[error("snapshot index {index} out of range ({count} captured)")]
    SnapshotIndex { index: usize, count: usize },
    #[error("engine is not initialized")]
    NotReady,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
