//! Handoff Snake entry point
//!
//! Parses arguments, maps the shared region and runs the session loop.

use std::fs::File;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use clap::error::ErrorKind;

use handoff_snake::cli::Cli;
use handoff_snake::platform::{KeyboardInput, ShutdownSignal, TerminalGuard, TerminalRenderer};
use handoff_snake::snapshot::StatusReport;
use handoff_snake::{Result, Session, Settings, SharedStateStore};

fn setup_logging(cli: &Cli) {
    let mut builder = match &cli.log_file {
        Some(path) => {
            let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
            match File::create(path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
            }
            builder
        }
        // The terminal is in raw mode while playing; keep stderr quiet
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")),
    };
    builder.init();
}

fn seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos ^ u64::from(std::process::id()).rotate_left(32)
}

fn print_status(cli: &Cli, offset: u64) -> Result<()> {
    let state = SharedStateStore::inspect(&cli.path, offset)?;
    log::info!("Status of {} at {offset:#x}", cli.path.display());
    let report = StatusReport::capture(&state);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Serializing status failed: {}", e),
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let offset = cli.offset()?;
    let settings = Settings::load(cli.settings.as_deref())?;

    if cli.status {
        return print_status(cli, offset);
    }

    let (store, status) = SharedStateStore::open(&cli.path, offset)?;
    let id = std::process::id();
    log::info!("Instance {} starting on {} ({status:?})", id, cli.path.display());

    let signals = ShutdownSignal::install()?;
    let _terminal = TerminalGuard::acquire()?;
    let mut session = Session::new(store, settings, id, seed(), KeyboardInput::new(), TerminalRenderer::new())
        .with_signals(signals);
    session.run()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    setup_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
