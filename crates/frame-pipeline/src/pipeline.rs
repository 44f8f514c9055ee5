//! Two-thread capture → display pipeline over a [`SlotRing`].

use crate::frame::{SyntheticCapture, VideoFrame};
use framering::{CancelToken, MetricsSnapshot, RingConfig, RingError, SlotRing};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that stop the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of frame slots in the ring.
    ///
    /// Default: 5
    pub capacity: usize,
    /// Stop after this many capture attempts; run until cancelled when `None`.
    pub frame_limit: Option<u64>,
    pub width: usize,
    pub height: usize,
    /// Pause between capture attempts.
    ///
    /// Default: 11ms (~90 fps)
    pub capture_interval: Duration,
    /// Time the display spends on each frame.
    ///
    /// Default: 5ms
    pub display_interval: Duration,
    pub ring: RingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            frame_limit: None,
            width: 640,
            height: 480,
            capture_interval: Duration::from_millis(11),
            display_interval: Duration::from_millis(5),
            ring: RingConfig::default().with_metrics(true),
        }
    }
}

impl PipelineConfig {
    /// Sets the capture attempt limit.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Sets the number of ring slots.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the frame dimensions.
    pub fn with_dimensions(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the capture and display pacing.
    pub fn with_intervals(mut self, capture: Duration, display: Duration) -> Self {
        self.capture_interval = capture;
        self.display_interval = display;
        self
    }

    /// Sets the ring configuration.
    pub fn with_ring(mut self, ring: RingConfig) -> Self {
        self.ring = ring;
        self
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.capacity == 0 {
            return Err(PipelineError::InvalidConfig("capacity must be at least 1"));
        }
        if self.width * self.height * 3 < 9 {
            return Err(PipelineError::InvalidConfig("frame too small to carry an index stamp"));
        }
        Ok(())
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Frames written into the ring
    pub captured: u64,
    /// Capture attempts skipped because the ring stayed full
    pub dropped: u64,
    /// Frames read back out of the ring
    pub displayed: u64,
    /// Displayed frames whose index did not increase
    pub out_of_order: u64,
    /// Displayed frames whose pixels did not match their stamp
    pub corrupted: u64,
    /// Whether the run ended through cancellation
    pub cancelled: bool,
    pub ring: MetricsSnapshot,
}

#[derive(Debug, Default)]
struct CaptureStats {
    captured: u64,
    dropped: u64,
}

#[derive(Debug, Default)]
struct DisplayStats {
    displayed: u64,
    out_of_order: u64,
    corrupted: u64,
}

/// Runs capture and display on two threads until the frame limit is reached
/// and the ring is drained, or `cancel` is set.
pub fn run_pipeline(
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<PipelineReport, PipelineError> {
    config.validate()?;

    // One slot per frame buffer
    let frames = (0..config.capacity).map(|_| VideoFrame::blank(config.width, config.height));
    let mut ring = SlotRing::from_frames(config.ring, frames);
    ring.set_cancel_token(cancel.clone());

    info!(
        capacity = config.capacity,
        width = config.width,
        height = config.height,
        limit = ?config.frame_limit,
        "starting frame pipeline"
    );

    let capture_done = AtomicBool::new(false);
    let started = Instant::now();

    let (capture, display) = thread::scope(|s| {
        let display = s.spawn(|| display_loop(&ring, config, cancel, &capture_done));
        let capture = capture_loop(&ring, config, cancel, started);
        capture_done.store(true, Ordering::Release);
        (capture, display.join())
    });

    let capture = capture?;
    let display = display.map_err(|_| PipelineError::ThreadPanicked("display"))??;

    let report = PipelineReport {
        captured: capture.captured,
        dropped: capture.dropped,
        displayed: display.displayed,
        out_of_order: display.out_of_order,
        corrupted: display.corrupted,
        cancelled: cancel.is_cancelled(),
        ring: ring.metrics(),
    };

    info!(
        captured = report.captured,
        dropped = report.dropped,
        displayed = report.displayed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "frame pipeline finished"
    );
    ring.clear()?;
    Ok(report)
}

fn capture_loop(
    ring: &SlotRing<VideoFrame>,
    config: &PipelineConfig,
    cancel: &CancelToken,
    started: Instant,
) -> Result<CaptureStats, PipelineError> {
    let mut source = SyntheticCapture::new();
    let mut stats = CaptureStats::default();

    while !cancel.is_cancelled() {
        if config
            .frame_limit
            .is_some_and(|limit| source.next_index() >= limit)
        {
            break;
        }

        match ring.begin_produce() {
            Ok(mut frame) => {
                source.capture_into(&mut frame, started.elapsed());
                frame.end_produce()?;
                stats.captured += 1;
            }
            Err(err) if err.is_recoverable() => {
                debug!(frame = source.next_index(), error = %err, "dropping frame");
                source.skip();
                stats.dropped += 1;
            }
            Err(RingError::Cancelled) => break,
            Err(err) => return Err(err.into()),
        }

        if !config.capture_interval.is_zero() {
            thread::sleep(config.capture_interval);
        }
    }

    Ok(stats)
}

fn display_loop(
    ring: &SlotRing<VideoFrame>,
    config: &PipelineConfig,
    cancel: &CancelToken,
    capture_done: &AtomicBool,
) -> Result<DisplayStats, PipelineError> {
    let mut stats = DisplayStats::default();
    let mut last_index = None;

    while !cancel.is_cancelled() {
        match ring.begin_consume() {
            Ok(frame) => {
                if last_index.is_some_and(|last| frame.frame_index <= last) {
                    stats.out_of_order += 1;
                }
                if !frame.is_intact() {
                    stats.corrupted += 1;
                }
                last_index = Some(frame.frame_index);
                if !config.display_interval.is_zero() {
                    thread::sleep(config.display_interval);
                }
                frame.end_consume()?;
                stats.displayed += 1;
            }
            Err(err) if err.is_recoverable() => {
                if capture_done.load(Ordering::Acquire) && ring.is_empty() {
                    break;
                }
            }
            Err(RingError::Cancelled) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(stats)
}
