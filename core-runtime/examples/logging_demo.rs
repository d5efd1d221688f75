//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run --example logging_demo -- compact "core_runtime=trace"
//! ```

use core_runtime::config::{PipelineConfig, SourcePacing};
use core_runtime::latency::LatencyLogger;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};

use std::env;
use std::time::Duration;
use tracing::{debug, error, info, info_span, instrument, warn};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config)?;
    info!(format = ?format, "Logging initialized");

    let pipeline = PipelineConfig::builder()
        .pacing(SourcePacing::RealTime)
        .refresh_rate_hz(60)
        .build()?;
    info!(
        sample_rate = pipeline.sample_rate,
        frame_size = pipeline.frame_size(),
        "Pipeline configured"
    );

    match PipelineConfig::builder().fft_window_size(1023).build() {
        Ok(_) => warn!("Odd FFT window was accepted"),
        Err(e) => error!(error = %e, "Rejected pipeline config"),
    }

    let span = info_span!("render_loop", refresh_rate_hz = pipeline.refresh_rate_hz);
    let _entered = span.enter();
    for frame in 0..3 {
        render_frame(frame);
    }

    Ok(())
}

#[instrument]
fn render_frame(frame: u64) {
    let _latency = LatencyLogger::new(format!("frame {}", frame));
    debug!("Drawing columns");
    std::thread::sleep(Duration::from_millis(5));
}
