use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;
mod reduce;
mod report;
mod runner;
mod scenario;
mod session;
mod signal;
mod trace;
mod util;
mod verify;

use cli::{CgiArgs, Command, CommonArgs, HuntArgs, RootArgs, SignalsArgs};
use runner::{resolve_subject, SubjectRunner};

fn main() -> Result<()> {
    // Logging stays on stderr; stdout carries only the grading contract.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = RootArgs::parse();
    match cli.command {
        Command::Signals(args) => cmd_signals(args),
        Command::Hunt(args) => cmd_hunt(args),
        Command::Cgi(args) => cmd_cgi(args),
    }
}

fn cmd_signals(args: SignalsArgs) -> Result<()> {
    let specs = scenario::select(scenario::signal_registry(&args.killer), args.scenario)?;
    scenario::validate_registry(&specs)?;
    let runner = build_runner(&args.common, Path::new("./signals"))?;
    finish_session("signals", &specs, &runner, &args.common)
}

fn cmd_hunt(args: HuntArgs) -> Result<()> {
    let specs = scenario::hunt_registry(&args.server, args.port, args.level)?;
    scenario::validate_registry(&specs)?;
    let runner = build_runner(&args.common, Path::new("./treasure_hunter"))?;
    finish_session("hunt", &specs, &runner, &args.common)
}

fn cmd_cgi(args: CgiArgs) -> Result<()> {
    let specs = scenario::select(scenario::cgi_registry(), args.scenario)?;
    scenario::validate_registry(&specs)?;
    let runner = build_runner(&args.common, Path::new("./cgiprog"))?;
    finish_session("cgi", &specs, &runner, &args.common)
}

fn build_runner(common: &CommonArgs, default_subject: &Path) -> Result<SubjectRunner> {
    let subject = common
        .subject
        .clone()
        .unwrap_or_else(|| default_subject.to_path_buf());
    let subject = resolve_subject(&subject)?;
    let tracer = parse_tracer(&common.tracer)?;
    let kill_after = common.kill_after.map(Duration::from_secs);
    Ok(SubjectRunner::new(
        subject,
        tracer,
        kill_after,
        common.verbose,
    ))
}

fn parse_tracer(tracer: &str) -> Result<Vec<String>> {
    let words =
        shell_words::split(tracer).with_context(|| format!("parse tracer command {tracer:?}"))?;
    if words.is_empty() {
        bail!("tracer command is empty");
    }
    Ok(words)
}

fn finish_session(
    family: &str,
    specs: &[scenario::ScenarioSpec],
    runner: &SubjectRunner,
    common: &CommonArgs,
) -> Result<()> {
    let report = session::run(family, specs, runner);
    if let Some(path) = &common.report {
        report.write(path)?;
        tracing::info!(path = %path.display(), "session report written");
    }
    Ok(())
}
