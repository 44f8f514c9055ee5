//! Runs the synthetic capture → display pipeline and prints its report.
//!
//! ```text
//! cargo run -p frame-pipeline --bin demo -- --frames 500 --display-ms 15
//! ```
//!
//! Ctrl-C cancels the run; both threads unwind within one wait timeout.

use anyhow::Context;
use clap::Parser;
use frame_pipeline::{run_pipeline, PipelineConfig};
use framering::{CancelToken, RingConfig};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Frame ring capture/display demo")]
struct Args {
    /// Number of frame slots in the ring
    #[arg(short, long, default_value_t = 5)]
    capacity: usize,

    /// Capture attempts before stopping (0 runs until Ctrl-C)
    #[arg(short, long, default_value_t = 0)]
    frames: u64,

    #[arg(long, default_value_t = 640)]
    width: usize,

    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Pause between capture attempts, in milliseconds
    #[arg(long, default_value_t = 11)]
    capture_ms: u64,

    /// Time spent displaying each frame, in milliseconds
    #[arg(long, default_value_t = 5)]
    display_ms: u64,

    /// Bounded wait on each lock and signal, in milliseconds
    #[arg(short, long, default_value_t = 20)]
    wait_ms: u64,

    /// Consecutive timeouts before a stall warning
    #[arg(long, default_value_t = 10)]
    stall_warn_after: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let args = Args::parse();

    let ring = RingConfig::default()
        .with_wait_timeout(Duration::from_millis(args.wait_ms))
        .with_stall_warn_after(args.stall_warn_after)
        .with_metrics(true);

    let mut config = PipelineConfig::default()
        .with_capacity(args.capacity)
        .with_dimensions(args.width, args.height)
        .with_intervals(
            Duration::from_millis(args.capture_ms),
            Duration::from_millis(args.display_ms),
        )
        .with_ring(ring);
    if args.frames > 0 {
        config = config.with_frame_limit(args.frames);
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    let report = run_pipeline(&config, &cancel).context("pipeline failed")?;

    info!(
        captured = report.captured,
        dropped = report.dropped,
        displayed = report.displayed,
        out_of_order = report.out_of_order,
        corrupted = report.corrupted,
        cancelled = report.cancelled,
        "report"
    );
    info!(
        produce_timeouts = report.ring.produce_timeouts,
        consume_timeouts = report.ring.consume_timeouts,
        stall_warnings = report.ring.stall_warnings,
        "ring metrics"
    );

    if report.out_of_order > 0 || report.corrupted > 0 {
        anyhow::bail!(
            "{} out-of-order and {} corrupted frames",
            report.out_of_order,
            report.corrupted
        );
    }
    Ok(())
}
