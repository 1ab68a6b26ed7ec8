//! # dcard CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dcard_cli::import::{run_import, run_list, ImportArgs, ListArgs};
use dcard_cli::inspect::{run_fingerprint, run_verify, FingerprintArgs, VerifyArgs};
use dcard_cli::signing::{run_keygen, run_sign, KeygenArgs, SignArgs};

/// dcard: signed, content-addressed collectible cards.
///
/// Issues and signs card files, verifies them against a trust registry, and
/// imports shared cards into a local collection.
#[derive(Parser, Debug)]
#[command(name = "dcard", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 issuer keypair.
    Keygen(KeygenArgs),

    /// Fingerprint and sign a card file.
    Sign(SignArgs),

    /// Print the computed fingerprint of a card file.
    Fingerprint(FingerprintArgs),

    /// Verify a card file offline and print the verdict.
    Verify(VerifyArgs),

    /// Import a card reference into the local collection.
    Import(ImportArgs),

    /// List the cards in the local collection.
    List(ListArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Sign(args) => run_sign(&args),
        Commands::Fingerprint(args) => run_fingerprint(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Import(args) => run_import(&args),
        Commands::List(args) => run_list(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
