use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use csma_sim::{
    cli::{self, Args},
    error::Error,
    report::{format_utilization, sweep_table},
};
use dotenvy::dotenv;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=error", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return fail(cli::usage_error(&e)),
    };

    let outcome = match cli::execute(&args) {
        Ok(outcome) => outcome,
        Err(e) => return fail(e),
    };

    if let Some(points) = &outcome.sweep {
        print!("{}", sweep_table(points));
    }

    if args.stats {
        let report = &outcome.report;
        println!("ticks          {}", report.ticks);
        println!("successes      {}", report.successes);
        println!("collisions     {}", report.collisions);
        println!("deferrals      {}", report.deferrals);
        println!("occupied ticks {}", report.occupied_ticks);
        println!("utilization    {}", format_utilization(report.utilization));
    }

    ExitCode::SUCCESS
}

fn fail(e: Error) -> ExitCode {
    debug!(error = ?e, "Run aborted");

    let (code, line) = cli::failure(&e);
    eprintln!("{line}");
    ExitCode::from(code)
}
