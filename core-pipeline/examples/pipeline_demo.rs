//! Level meter over a simulated frequency sweep.
//!
//! Run with:
//! ```bash
//! cargo run -p core-pipeline --example pipeline_demo
//!
//! # With a JSON pipeline config
//! cargo run -p core-pipeline --example pipeline_demo -- pipeline.json
//! ```

use core_coro::AsyncGenerator;
use core_pipeline::{
    chunked, interpolate, levels, paced_frames, ramp_source, RampSourceOptions, Rational,
};
use core_runtime::config::{PipelineConfig, RampConfig, SourcePacing};
use core_runtime::latency::LatencyLogger;
use core_runtime::logging::{init_logging, LogLevel, LoggingConfig};

use std::env;
use std::fs;
use tracing::info;

const DISPLAY_FRAMES: usize = 120;

fn load_config() -> anyhow::Result<PipelineConfig> {
    match env::args().nth(1) {
        Some(path) => Ok(PipelineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(PipelineConfig::builder()
            .pacing(SourcePacing::RealTime)
            .ramp(RampConfig {
                period_ms: 10_000,
                frequency_min: 100.0,
                frequency_max: 5_000.0,
            })
            .build()?),
    }
}

#[core_coro::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_level(LogLevel::Debug))?;
    let config = load_config()?;
    info!(?config, "Starting level meter");

    let window = config.fft_window_size;
    let analysis_period = Rational::new(window as i64, config.sample_rate as i64);
    let refresh_period = Rational::new(1, config.refresh_rate_hz as i64);

    let mut display: AsyncGenerator<f64> = ramp_source(RampSourceOptions::from_config(&config))
        .pipe(|frames| chunked(frames, window))
        .pipe(levels)
        .pipe(|levels| {
            interpolate(levels, analysis_period, refresh_period, |t, a, b| {
                a + (b - a) * t
            })
        })
        .pipe(|frames| paced_frames(refresh_period, frames));

    for _ in 0..DISPLAY_FRAMES {
        let _latency = LatencyLogger::new("display frame");
        let Some(level) = display.next().await? else {
            break;
        };
        let width = (level * 60.0).round() as usize;
        println!("{:>6.3} {}", level, "#".repeat(width));
    }

    Ok(())
}
