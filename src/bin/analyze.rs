//! # sublink-analyze
//!
//! Size analyzer for sublink message schemas.
//!
//! ## Usage
//!
//! ```bash
//! # Break down every message in a schema file
//! sublink-analyze schemas/vehicle.json
//!
//! # Estimate airtime at a different acoustic data rate
//! sublink-analyze schemas/vehicle.json --data-rate 200
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use sublink::{analyze, parse_schema_file};

/// sublink schema size analyzer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON schema file (one message object or an array of them)
    schema: PathBuf,

    /// Acoustic data rate in bits per second for airtime estimates
    #[arg(long, default_value = "80")]
    data_rate: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.schema)
        .map_err(|e| format!("cannot read {}: {}", args.schema.display(), e))?;
    let descriptors = parse_schema_file(&source).map_err(|e| e.to_string())?;

    info!(
        "loaded {} message(s) from {}",
        descriptors.len(),
        args.schema.display()
    );
    if descriptors.is_empty() {
        return Err(format!("no messages defined in {}", args.schema.display()));
    }

    for descriptor in &descriptors {
        let report = analyze(descriptor);
        print!("{}", report);
        if args.data_rate != sublink::analyzer::DEFAULT_DATA_RATE {
            println!(
                "airtime @ {} bps:       {:.1} s",
                args.data_rate,
                report.airtime_secs(args.data_rate)
            );
        }
        println!();
    }
    Ok(())
}
