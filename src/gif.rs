//! Boundary to an external animated-image encoder
//!
//! The engine produces raw RGBA frames; turning them into an animation file
//! (palette quantization, container bytes) is the job of a [`FrameEncoder`]
//! supplied from outside. [`spawn_encoder`] runs one on its own thread and
//! reports back through a channel, turning encoder failures and panics into
//! [`EncoderMessage::Error`] so the caller never goes down with it.

use crate::training::rgba_len;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::warn;

/// Colors available to the encoder's quantizer.
pub const PALETTE_SIZE: usize = 256;

/// Frames to encode, all `width × height` RGBA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifRequest {
    pub frames: Vec<Vec<u8>>,
    pub width: usize,
    pub height: usize,
    pub fps: u32,
}

impl GifRequest {
    /// Per-frame delay in milliseconds: `floor(1000 / fps)`.
    pub fn frame_delay_ms(&self) -> u32 {
        1000 / self.fps.max(1)
    }

    /// Checks the request before an encoder sees it.
    pub fn validate(&self) -> Result<(), String> {
        if self.fps == 0 {
            return Err("fps must be positive".to_string());
        }
        if self.frames.is_empty() {
            return Err("no frames to encode".to_string());
        }
        let expected = rgba_len(self.width, self.height).ok_or_else(|| {
            format!("frame size {}x{} is too large", self.width, self.height)
        })?;
        if let Some(index) = self.frames.iter().position(|frame| frame.len() != expected) {
            return Err(format!(
                "frame {} has {} bytes, expected {}",
                index,
                self.frames[index].len(),
                expected
            ));
        }
        Ok(())
    }
}

/// Messages from a running encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EncoderMessage {
    Progress { current: usize, total: usize },
    Complete { data: Vec<u8> },
    Error { message: String },
}

/// Encodes a frame sequence into an animation.
///
/// `progress(current, total)` should be called as frames are consumed.
pub trait FrameEncoder {
    fn encode(
        &mut self,
        request: &GifRequest,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Vec<u8>, String>;
}

/// Runs `encoder` on a background thread.
///
/// The receiver yields any number of `Progress` messages followed by exactly
/// one `Complete` or `Error`.
pub fn spawn_encoder<E>(mut encoder: E, request: GifRequest) -> Receiver<EncoderMessage>
where
    E: FrameEncoder + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let error_tx = tx.clone();
    let spawned = thread::Builder::new()
        .name("neural-canvas-encoder".to_string())
        .spawn(move || {
            let outcome = run_encoder(&mut encoder, &request, &tx);
            let _ = tx.send(outcome);
        });

    if let Err(err) = spawned {
        let _ = error_tx.send(EncoderMessage::Error {
            message: format!("failed to start encoder: {}", err),
        });
    }
    rx
}

fn run_encoder<E: FrameEncoder>(
    encoder: &mut E,
    request: &GifRequest,
    tx: &Sender<EncoderMessage>,
) -> EncoderMessage {
    if let Err(message) = request.validate() {
        return EncoderMessage::Error { message };
    }

    let mut report = |current: usize, total: usize| {
        let _ = tx.send(EncoderMessage::Progress { current, total });
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| encoder.encode(request, &mut report)));

    match result {
        Ok(Ok(data)) => EncoderMessage::Complete { data },
        Ok(Err(message)) => EncoderMessage::Error { message },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "encoder panicked");
            EncoderMessage::Error { message }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("encoder panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("encoder panicked: {}", message)
    } else {
        "encoder panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(fps: u32) -> GifRequest {
        GifRequest {
            frames: vec![vec![0; 16]; 3],
            width: 2,
            height: 2,
            fps,
        }
    }

    #[test]
    fn test_frame_delay_floors() {
        assert_eq!(request(30).frame_delay_ms(), 33);
        assert_eq!(request(10).frame_delay_ms(), 100);
        assert_eq!(request(7).frame_delay_ms(), 142);
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        assert!(request(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflowing_size() {
        let req = GifRequest {
            width: usize::MAX,
            height: 2,
            ..request(10)
        };
        assert!(req.validate().unwrap_err().contains("too large"));
    }

    #[test]
    fn test_validate_rejects_short_frame() {
        let mut req = request(10);
        req.frames[1].pop();
        let err = req.validate().unwrap_err();
        assert!(err.contains("frame 1"));
    }
}
