use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rep_counter::driver::{FrameDriver, JsonLinesSink, ReplaySource};
use rep_counter::fixtures::{ExpectationDiff, FixtureCatalog, FixtureProcessor, ReplayOutcome};
use rep_counter::session::{ExerciseTotals, Session};
use rep_counter::telemetry::{self, drain_metrics, TelemetryAggregator};
use rep_counter::AppConfig;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "rep_cli",
    about = "Deterministic replay harness for the repetition counters"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to ./fixtures in the crate)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a fixture and optionally compare final counters against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Counter configuration JSON (defaults to assets/counter_config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Stream one JSON frame report per observation to stdout
    Stream {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Replay a fixture and summarize the telemetry it published
    Telemetry {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = TelemetryFormat::Json)]
        format: TelemetryFormat,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TelemetryFormat {
    Json,
    Table,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    rep_counter::init_logging(&cli.log_level);

    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
            config,
        } => run_replay(&catalog, &fixture, expect, output, config.as_deref()),
        Commands::Stream { fixture, config } => run_stream(&catalog, &fixture, config.as_deref()),
        Commands::Telemetry {
            fixture,
            config,
            format,
        } => run_telemetry(&catalog, &fixture, config.as_deref(), format),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::read_from_file(path)?,
        None => AppConfig::load(),
    };
    config.validate().context("validating counter configuration")?;
    Ok(config)
}

fn run_replay(
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let processor = FixtureProcessor::new(load_config(config_path)?);
    let data = catalog.load(fixture, override_expect)?;
    let outcome = processor
        .run(&data)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    emit_report(&data.metadata.name, &outcome, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&outcome) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(
    catalog: &FixtureCatalog,
    fixture: &str,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let data = catalog.load(fixture, None)?;
    let session = Session::from_config(&config)?;

    let mut driver = FrameDriver::new(session, config.driver.clone());
    let mut source = ReplaySource::new(data.frames);
    let mut sink = JsonLinesSink::new(io::stdout().lock());
    driver.run(&mut source, &mut sink);

    if sink.write_errors() > 0 {
        anyhow::bail!("{} frame reports could not be written", sink.write_errors());
    }
    Ok(ExitCode::from(0))
}

fn run_telemetry(
    catalog: &FixtureCatalog,
    fixture: &str,
    config_path: Option<&Path>,
    format: TelemetryFormat,
) -> Result<ExitCode> {
    let processor = FixtureProcessor::new(load_config(config_path)?);
    let data = catalog.load(fixture, None)?;

    let mut telemetry_rx = telemetry::hub().subscribe();
    let mut aggregator = TelemetryAggregator::default();
    processor
        .run(&data)
        .with_context(|| format!("replaying fixture {}", fixture))?;
    drain_metrics(&mut telemetry_rx, &mut aggregator);

    let report = aggregator.into_report(&telemetry::hub().snapshot());
    match format {
        TelemetryFormat::Json => report.print_json()?,
        TelemetryFormat::Table => report.print_table(),
    }
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_report(
    fixture: &str,
    outcome: &ReplayOutcome,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let report = ReplayReportPayload {
        fixture,
        frames: outcome.frames,
        skipped_frames: outcome.skipped_frames,
        repetitions: outcome.reports.iter().map(|r| r.repetitions().count()).sum(),
        counters: &outcome.totals,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct ReplayReportPayload<'a> {
    fixture: &'a str,
    frames: u64,
    skipped_frames: u64,
    repetitions: usize,
    counters: &'a [ExerciseTotals],
}
