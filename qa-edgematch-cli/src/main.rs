mod cli;
mod commands;
mod error;
mod input;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use error::exit_with_error;

fn init_tracing(cli: &Cli) {
    // --quiet always silences logs. --verbose honours RUST_LOG and falls
    // back to "info". Without either flag logs stay off so findings on
    // stdout are never interleaved with diagnostics.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,qa_edgematch=debug".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    let ansi = !(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    init_tracing(&cli);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => exit_with_error(e),
    }
}

fn run(cli: Cli) -> error::CliResult<i32> {
    match cli.command {
        Commands::Run {
            check,
            data,
            tile_size,
            extent,
            format,
            fail_on_issues,
        } => commands::run::run(
            &check,
            &data,
            tile_size,
            extent.as_deref(),
            format,
            fail_on_issues,
            cli.quiet,
        ),
        Commands::Codes { check } => {
            commands::codes::run(check);
            Ok(error::EXIT_SUCCESS)
        }
    }
}
