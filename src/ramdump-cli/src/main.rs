mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use ramdump::AcquireError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;
use commands::acquire::SessionBusy;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Acquire(args) => {
            commands::acquire::handle(&args)?;
        }

        Commands::Ranges {
            label,
            iomem,
            chunk_size,
        } => {
            commands::ranges::handle(label, iomem, chunk_size)?;
        }

        Commands::Configure {
            output,
            chunk_size,
            label,
            gap_policy,
            show,
        } => {
            commands::configure::handle(output, chunk_size, label, gap_policy, show)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "ramdump=debug" } else { "ramdump=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Process exit status for a failed command
///
/// Acquisition failures exit with their errno completion code so callers can
/// tell allocation, output, and open failures apart.
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(acquire) = cause.downcast_ref::<AcquireError>() {
            return acquire.code();
        }
        if cause.downcast_ref::<SessionBusy>().is_some() {
            return libc::EBUSY;
        }
    }
    1
}
