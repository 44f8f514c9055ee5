//! Frame payload and synthetic capture source.

use std::time::Duration;

/// Bytes at the start of the pixel buffer carrying the stamped frame index.
const STAMP_LEN: usize = 8;

/// One RGB video frame. Allocated once per slot and reused for every fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Capture time relative to pipeline start
    pub time_code: Duration,
    /// Monotonic index assigned by the capture source
    pub frame_index: u64,
    pub width: usize,
    pub height: usize,
    /// Packed RGB, `width * height * 3` bytes
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    /// Allocates a black frame.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            time_code: Duration::ZERO,
            frame_index: 0,
            width,
            height,
            pixels: vec![0; width * height * 3],
        }
    }

    /// Returns true if the pixels carry the pattern and stamp that
    /// [`SyntheticCapture`] wrote for `frame_index`.
    pub fn is_intact(&self) -> bool {
        if self.pixels.len() < STAMP_LEN {
            return false;
        }
        let (stamp, body) = self.pixels.split_at(STAMP_LEN);
        let shade = shade_for(self.frame_index);
        stamp == self.frame_index.to_le_bytes() && body.iter().all(|&b| b == shade)
    }
}

/// Deterministic stand-in for a camera: paints a flat shade per frame and
/// overlays the frame index into the first pixels.
#[derive(Debug, Default)]
pub struct SyntheticCapture {
    next_index: u64,
}

impl SyntheticCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index the next captured frame will get.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Skips one index, as a camera does when its buffer was not ready.
    pub fn skip(&mut self) {
        self.next_index += 1;
    }

    /// Renders the next frame directly into `frame`.
    pub fn capture_into(&mut self, frame: &mut VideoFrame, time_code: Duration) {
        let index = self.next_index;
        self.next_index += 1;

        frame.time_code = time_code;
        frame.frame_index = index;
        frame.pixels.fill(shade_for(index));

        // Overlay
        let stamp = index.to_le_bytes();
        let len = STAMP_LEN.min(frame.pixels.len());
        frame.pixels[..len].copy_from_slice(&stamp[..len]);
    }
}

fn shade_for(index: u64) -> u8 {
    (index % 251) as u8
}
