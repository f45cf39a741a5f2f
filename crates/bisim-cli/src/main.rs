use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cmd;
mod error;

#[derive(Parser)]
#[command(
    name = "bisim",
    about = "Cycle-tolerant structural comparison of JSON documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deeply compare two JSON documents and report every mismatch
    Compare {
        /// Path to the expected document
        #[arg(value_name = "EXPECTED")]
        expected: PathBuf,
        /// Path to the actual document
        #[arg(value_name = "ACTUAL")]
        actual: PathBuf,
        /// Emit the comparison result as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Print the bisim-core library version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Compare {
            expected,
            actual,
            json,
        } => cmd::compare::run(&expected, &actual, json),
        Command::Version => {
            println!("{}", bisim_core::version());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e.message());
        process::exit(e.exit_code());
    }
}
