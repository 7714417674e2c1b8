//! A bitmap font builder: pixel-grid glyph sources in, vector fonts out.

use anyhow::Result;
use clap::Parser;
use gridfont::core::{self, cli::CliArgs};

/// Run one build with the given CLI arguments.
fn run_app(cli_args: CliArgs) -> Result<()> {
    core::runner::run(cli_args)
}

fn main() {
    let cli_args = CliArgs::parse();
    gridfont::logging::init(cli_args.verbose, cli_args.quiet);
    if let Err(message) = cli_args.validate() {
        eprintln!("{message}");
        std::process::exit(2);
    }
    match run_app(cli_args) {
        Ok(()) => {}
        Err(error) => {
            eprintln!();
            eprintln!("Error: {error:#}");
            eprintln!();
            eprintln!("Try running with --help for usage information.");
            std::process::exit(1);
        }
    }
}
