//! CLI argument parsing for the grading harness.
//!
//! One subcommand per scenario family; identifier and level validation
//! happens against the registries before any subject launches.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "tracegrade",
    version,
    about = "Syscall-trace-backed grading harness for systems programming exercises",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Scenario families.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grade the signal-delivery scenarios (ordered kill sequences)
    Signals(SignalsArgs),
    /// Grade the treasure-hunt network scenarios against a running server
    Hunt(HuntArgs),
    /// Grade the CGI query-string scenarios (stdout digest only)
    Cgi(CgiArgs),
}

/// Options shared by every family.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Subject binary to grade (bare names resolve through PATH)
    #[arg(long)]
    pub subject: Option<PathBuf>,

    /// Tracer command wrapped around traced subjects, shell-style
    #[arg(long, default_value = "strace")]
    pub tracer: String,

    /// Kill a hung subject after this many seconds
    #[arg(long, value_name = "SECS")]
    pub kill_after: Option<u64>,

    /// Write a JSON session report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Echo each subject command line to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct SignalsArgs {
    /// Scenario identifier; omitted runs all scenarios
    pub scenario: Option<u32>,

    /// Killer binary handed to the subject as its first argument
    #[arg(long, default_value = "./killer")]
    pub killer: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct HuntArgs {
    /// Treasure server host
    pub server: String,

    /// Treasure server port
    pub port: u16,

    /// Restrict the session to one level; omitted runs every level
    pub level: Option<u32>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct CgiArgs {
    /// Scenario identifier; omitted runs all scenarios
    pub scenario: Option<u32>,

    #[command(flatten)]
    pub common: CommonArgs,
}
