//! Capture → display frame pipeline built on [`framering::SlotRing`].
//!
//! A capture thread renders synthetic frames straight into ring slots while a
//! display thread drains them. When the display falls behind, the ring stays
//! full and capture drops frames instead of blocking the camera.
//!
//! ```no_run
//! use frame_pipeline::{run_pipeline, PipelineConfig};
//! use framering::CancelToken;
//!
//! let config = PipelineConfig::default().with_frame_limit(100);
//! let report = run_pipeline(&config, &CancelToken::new()).unwrap();
//! assert_eq!(report.captured + report.dropped, 100);
//! ```

mod frame;
mod pipeline;

pub use frame::{SyntheticCapture, VideoFrame};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineError, PipelineReport};
