//! `mun`: offline CLI over the simulator.
//!
//! Exit codes: 0 OK, 2 validation/usage, 4 I/O, 5 simulation (a ballot
//! could not be resolved with the given round-2 configuration).

mod args;
mod commands;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 4;
    pub const SIMULATION: i32 = 5;
}

use std::fmt;
use std::io::IsTerminal;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args};
use mun_algo::AlgoError;
use mun_io::IoError;
use mun_pipeline::PipelineError;

/// Error buckets of the exit-code table.
#[derive(Debug)]
pub enum MainError {
    /// Malformed or out-of-domain input: fix the scenario, rules or flags.
    Validation(String),
    Io(String),
    /// Well-formed scenario whose run-off cannot be resolved.
    Simulation(String),
}

impl MainError {
    fn code(&self) -> i32 {
        match self {
            MainError::Validation(_) => exitcodes::VALIDATION,
            MainError::Io(_) => exitcodes::IO,
            MainError::Simulation(_) => exitcodes::SIMULATION,
        }
    }
}

impl fmt::Display for MainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Simulation(m) => write!(f, "simulation: {m}"),
        }
    }
}

impl From<IoError> for MainError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Path(_) => MainError::Io(e.to_string()),
            IoError::Json { .. } | IoError::Hash(_) | IoError::Invalid(_) => MainError::Validation(e.to_string()),
        }
    }
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        if e.is_simulation_fault() {
            MainError::Simulation(e.to_string())
        } else {
            MainError::Validation(e.to_string())
        }
    }
}

impl From<AlgoError> for MainError {
    fn from(e: AlgoError) -> Self {
        MainError::Validation(e.to_string())
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            // --help / --version go to stdout with status 0
            let code = if e.use_stderr() { exitcodes::VALIDATION } else { exitcodes::OK };
            let _ = e.print();
            return ExitCode::from(code as u8);
        }
    };
    init_tracing(&args);

    if let Err(e) = args.validate() {
        eprintln!("mun: error: {e}");
        return ExitCode::from(exitcodes::VALIDATION as u8);
    }

    let rc = match commands::dispatch(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("mun: error: {e}");
            e.code()
        }
    };
    ExitCode::from(rc as u8)
}

/// Logs go to stderr; stdout carries only JSON results.
fn init_tracing(args: &Args) {
    let default = if args.quiet {
        "warn"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
