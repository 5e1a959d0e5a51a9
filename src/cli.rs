//! Command-line surface.

use std::path::PathBuf;

use clap::{
    CommandFactory, Parser,
    builder::RangedU64ValueParser,
    error::{ContextKind, ErrorKind},
};
use tracing::info;

use crate::{
    common::DEFAULT_OUTPUT_PATH,
    config::{Accounting, Exclusivity, Policy, RetryCap, SimConfig},
    error::{Error, Result},
    report::{self, SweepPoint},
    simulation::{Simulation, SimulationReport},
};

/// CSMA contention simulator
///
/// Reads a tagged parameter file, simulates the shared channel, and writes
/// the utilization rate with two decimals to the output file.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "csma-sim")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Parameter file with N, L, M, T and R entries
    pub input: PathBuf,

    /// Result file
    #[arg(short, long, env = "CSMA_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// How productive channel use is counted
    #[arg(long, env = "CSMA_ACCOUNTING", value_enum, default_value_t = Accounting::Occupancy)]
    pub accounting: Accounting,

    /// Whether a busy channel blocks contention
    #[arg(long, env = "CSMA_EXCLUSIVITY", value_enum, default_value_t = Exclusivity::Exclusive)]
    pub exclusivity: Exclusivity,

    /// Behaviour once a station exceeds M retries
    #[arg(long, env = "CSMA_RETRY_CAP", value_enum, default_value_t = RetryCap::Reset)]
    pub retry_cap: RetryCap,

    /// Print the run counters to stdout
    #[arg(long)]
    pub stats: bool,

    /// Also simulate every station count from 1 to this value and print a
    /// utilization table
    #[arg(long, value_name = "MAX_STATIONS", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub sweep: Option<usize>,
}

impl Args {
    /// Policy selected by the flags.
    pub fn policy(&self) -> Policy {
        Policy {
            accounting: self.accounting,
            exclusivity: self.exclusivity,
            retry_cap: self.retry_cap,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, PartialEq)]
pub struct Outcome {
    /// Report for the file's own parameters
    pub report: SimulationReport,
    /// Sweep rows, when requested
    pub sweep: Option<Vec<SweepPoint>>,
}

/// Loads the parameters, simulates, and writes the result file.
pub fn execute(args: &Args) -> Result<Outcome> {
    let config = SimConfig::from_file(&args.input)?;
    let policy = args.policy();

    info!(
        stations = config.stations,
        transmission_ticks = config.transmission_ticks,
        max_retries = config.max_retries,
        horizon = config.horizon,
        windows = ?config.backoff_windows.as_slice(),
        "Configuration loaded"
    );

    let sweep = args
        .sweep
        .map(|max_stations| report::sweep(&config, policy, max_stations))
        .transpose()?;

    let report = Simulation::new(config, policy).run();
    report::write_output(&args.output, report.utilization)?;

    Ok(Outcome { report, sweep })
}

/// Exit status of every failed run.
pub static FAILURE_EXIT_CODE: u8 = 1;

/// Turns a clap parse failure into a usage error naming the offending
/// argument.
pub fn usage_error(e: &clap::Error) -> Error {
    let arg = e.get(ContextKind::InvalidArg);
    let value = e.get(ContextKind::InvalidValue);

    let reason = match (e.kind(), arg, value) {
        (ErrorKind::MissingRequiredArgument, Some(arg), _) => format!("missing required argument {arg}"),
        (ErrorKind::UnknownArgument, Some(arg), _) => format!("unexpected argument '{arg}'"),
        (ErrorKind::InvalidValue | ErrorKind::ValueValidation, Some(arg), Some(value)) => {
            format!("invalid value '{value}' for {arg}")
        }
        (kind, _, _) => kind.as_str().unwrap_or("invalid arguments").to_string(),
    };

    let usage = Args::command().render_usage().to_string();
    let usage = usage.trim().trim_start_matches("Usage: ");
    Error::Usage(format!("{reason} (usage: {usage})"))
}

/// Exit status and single-line stderr diagnostic for a failed run.
pub fn failure(e: &Error) -> (u8, String) {
    let message = e.to_string();
    let message = message.lines().map(str::trim).collect::<Vec<_>>().join(" ");

    (FAILURE_EXIT_CODE, format!("error: {message}"))
}
