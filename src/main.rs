use anyhow::Result;
use clap::Parser;
use depshift::cli::{Cli, Commands};
use depshift::commands::{init_config, run_project, RunConfig};
use depshift::errors::DepshiftError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.command.verbosity());

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<DepshiftError>()
                .map(DepshiftError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            path,
            config,
            set,
            dry_run,
            format,
            output,
            verbosity: _,
            jobs,
        } => {
            run_project(RunConfig {
                path,
                config,
                overrides: set,
                dry_run,
                format,
                output,
                jobs,
            })?;
            Ok(())
        }
        Commands::Init { path, force } => init_config(&path, force),
    }
}

// RUST_LOG wins over -v when set.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "depshift=warn",
        1 => "depshift=info",
        2 => "depshift=debug",
        _ => "depshift=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
