//! # Officedesk CLI
//!
//! The binary is intentionally thin: the CLI lives in `cli/`, while this file
//! sets up logging, invokes `cli::run()` and handles process termination.

use clap::Parser;
use colored::Colorize;
use officedesk::error::DeskError;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = cli::run(cli.command).await {
        report(&e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(error: &DeskError) {
    match error {
        DeskError::Unauthorized { login_route } => {
            eprintln!("{}", "Your session has expired or you are not logged in.".red());
            eprintln!(
                "Run `officedesk login <token>` to sign in again (login route: {}).",
                login_route
            );
        }
        DeskError::Request(_) | DeskError::Rejected { .. } => {
            eprintln!("{} {}", "Error:".red(), error.user_message());
        }
        other => eprintln!("{} {}", "Error:".red(), other),
    }
}
