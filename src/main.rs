//! Occupant signal entry point: CLI wiring, logging, and output.

mod cli;

use std::process;

use anyhow::{Context, bail};
use clap::Parser;
use occupant_signal::io::export::export_csv;
use occupant_signal::runner::{SignalRun, run_scenario};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, OutputFormat};

/// JSON output document.
#[derive(Serialize)]
struct Report<'a> {
    day: usize,
    start_sample: usize,
    signal: &'a occupant_signal::signal::Signal,
    reallocation_kwh: &'a [f64],
    objective: f64,
    summary: &'a occupant_signal::summary::RunSummary,
}

fn print_report(run: &SignalRun, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("hour  sample  signal");
            for (h, value) in run.signal.values().iter().enumerate() {
                println!("{h:>4}  {:>6}  {value:>9.6}", run.window.start + h);
            }
            println!("\n{}", run.summary);
        }
        OutputFormat::Json => {
            let report = Report {
                day: run.window.day,
                start_sample: run.window.start,
                signal: &run.signal,
                reallocation_kwh: &run.result.x,
                objective: run.result.objective,
                summary: &run.summary,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.scenario_config()?;
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid scenario ({} errors)", errors.len());
    }

    let run = run_scenario(&config)
        .with_context(|| format!("failed to compute signal for day {}", config.window.day))?;
    if args.require_convergence && !run.result.is_success() {
        bail!("solver did not converge: {}", run.result.status);
    }

    print_report(&run, args.format)?;

    if let Some(path) = &args.export {
        export_csv(&run, path)
            .with_context(|| format!("failed to write \"{}\"", path.display()))?;
        info!(path = %path.display(), "window series exported");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("occupant_signal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
