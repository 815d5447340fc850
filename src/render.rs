//! Frame rendering for the live model and for captured snapshots
//!
//! The journey is a ping-pong animation: every snapshot oldest to newest,
//! then back again without repeating either endpoint, so a looping player
//! returns to the first frame without a stutter.

use crate::error::{EngineError, Result};
use crate::network::NetworkModel;
use crate::snapshot::Snapshot;

/// Number of journey frames for `snapshots` snapshots: `2S - 2` for `S >= 2`.
pub fn journey_frame_count(snapshots: usize) -> Option<usize> {
    (snapshots >= 2).then(|| 2 * snapshots - 2)
}

/// Renders the journey frames for `snapshots`.
///
/// Each snapshot is restored into `model` and rendered; the live parameters
/// are put back afterwards (velocities are never touched). Every frame is its
/// own allocation, mirrored frames included, so each can be handed off
/// independently.
pub fn build_journey(
    model: &mut NetworkModel,
    snapshots: &[Snapshot],
    width: usize,
    height: usize,
) -> Result<Vec<Vec<u8>>> {
    let total = journey_frame_count(snapshots.len())
        .ok_or(EngineError::NotEnoughSnapshots(snapshots.len()))?;

    let live = model.snapshot(0);
    let mut frames = Vec::with_capacity(total);
    for snapshot in snapshots {
        if let Err(err) = model.restore(snapshot) {
            model.restore(&live)?;
            return Err(err);
        }
        frames.push(model.render_to_buffer(width, height));
    }
    model.restore(&live)?;

    let mirrored: Vec<Vec<u8>> = frames[1..frames.len() - 1].iter().rev().cloned().collect();
    frames.extend(mirrored);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journey_frame_count() {
        assert_eq!(journey_frame_count(0), None);
        assert_eq!(journey_frame_count(1), None);
        assert_eq!(journey_frame_count(2), Some(2));
        assert_eq!(journey_frame_count(5), Some(8));
    }
}
