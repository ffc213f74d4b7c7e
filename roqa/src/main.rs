// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use roqa_common::{HarnessSettings, LinkTiming};
use roqa_session::Session;
use roqa_sim::DeviceModel;
use roqa_verify::checker;
use roqa_verify::vectors;

/// roqa - conformance harness for the quantized-audio decoder core
#[derive(Parser, Debug)]
#[command(
    name = "roqa",
    version,
    about = "Bit-serial conformance harness for the quantized-audio decoder core"
)]
struct Args {
    /// Path to the test-vector file
    #[arg(short = 'f', long)]
    vectors: PathBuf,

    /// Processing window after a sample push, in link cycles
    #[arg(long, default_value_t = 60)]
    latency: u32,

    /// Clock half-period settle time, in link cycles
    #[arg(long, default_value_t = 3)]
    settle: u32,

    /// Emit a progress line every this many sample vectors
    #[arg(long, default_value_t = 1000)]
    progress: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("roqa - decoder core conformance harness");
    info!("=======================================");

    let vectors = vectors::load_vector_file(&args.vectors)
        .with_context(|| format!("Failed to load vector file: {}", args.vectors.display()))?;
    info!(
        "Loaded {} test vectors from {}",
        vectors.len(),
        args.vectors.display()
    );

    let settings = HarnessSettings {
        timing: LinkTiming {
            settle_cycles: args.settle,
            frame_gap_cycles: args.settle,
            processing_cycles: args.latency,
        },
        progress_interval: args.progress,
    };
    info!(
        "Link timing: settle={} cycles, processing window={} cycles",
        settings.timing.settle_cycles, settings.timing.processing_cycles
    );

    let mut session = Session::new(DeviceModel::new(), settings.timing);
    session.open();

    let report = checker::run_vectors(&mut session, &vectors, settings.progress_interval);

    let device = session.into_bus();
    info!("Link active for {} cycles", device.cycles());

    if report.passed() {
        info!("All {} vectors passed", report.total());
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} vectors failed (first failure at vector {})",
            report.failures(),
            report.total(),
            report.first_failure().unwrap_or(0)
        );
    }
}
