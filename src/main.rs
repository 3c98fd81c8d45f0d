//! nidx CLI entry point
//!
//! Installs the log subscriber and delegates to the CLI module. Logs go to
//! stderr, stdout carries JSON output only.

use nidx::cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
