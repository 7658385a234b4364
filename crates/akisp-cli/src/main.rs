// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

mod board;
mod bringup;
mod error;
mod pins;
mod status;
mod utils;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// akisp CLI - Anyka ISP bring-up traces and diagnostics
#[derive(Parser)]
#[command(name = "akisp")]
#[command(version)]
#[command(about = "akisp CLI - Anyka ISP bring-up traces and diagnostics")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=debug for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pin-control state names the driver selects
    Pins(pins::Args),

    /// Run a full capture bring-up on a simulated board and print the trace
    Bringup(bringup::Args),

    /// Dump ISP statistics from the vendor library
    Status(status::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Pins(args) => pins::execute(args, cli.json),
        Commands::Bringup(args) => bringup::execute(args, cli.json),
        Commands::Status(args) => status::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        // bring-up traces are printed on stdout, keep stderr for warnings
        env.default_filter_or("warn")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::debug!("Logging initialized");
}
