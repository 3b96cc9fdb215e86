mod logging;
mod replay;
mod scenario;
mod scripted;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use station_fsm::StationPolicy;

use scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "station_replay")]
#[command(about = "Replays Wi-Fi station scenarios against scripted collaborators")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Run(RunArgs),
    Check(CheckArgs),
    States,
    Policy(PolicyArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    scenarios: Vec<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    scenarios: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct PolicyArgs {
    path: Option<PathBuf>,
}

fn run_scenarios(args: RunArgs) -> Result<()> {
    if args.scenarios.is_empty() {
        bail!("no scenario files given");
    }
    logging::install(logging::parse_level(&args.log_level)?)?;

    let mut failed = Vec::new();
    let mut reports = Vec::with_capacity(args.scenarios.len());
    for path in &args.scenarios {
        let scenario = Scenario::load(path)?;
        let report = replay::run_scenario(&scenario)?;
        println!(
            "{}: {} ({} steps, final {}, {} teardowns)",
            path.display(),
            if report.passed { "PASS" } else { "FAIL" },
            report.steps.len(),
            report.final_state,
            report.teardowns
        );
        if !report.passed {
            failed.push(path.display().to_string());
        }
        reports.push(report);
    }

    if let Some(path) = &args.report {
        logging::write_report(path, &reports)?;
    }
    if !failed.is_empty() {
        bail!("{} scenario(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn check_scenarios(args: CheckArgs) -> Result<()> {
    for path in &args.scenarios {
        let scenario = Scenario::load(path)?;
        println!("{}: ok ({} steps)", path.display(), scenario.steps.len());
    }
    Ok(())
}

fn print_policy(args: PolicyArgs) -> Result<()> {
    let policy = match args.path {
        Some(path) => StationPolicy::load(&path)?,
        None => StationPolicy::defaults(),
    };
    println!("{policy:#?}");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_scenarios(args),
        Commands::Check(args) => check_scenarios(args),
        Commands::States => {
            for line in replay::state_tree() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Policy(args) => print_policy(args),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
