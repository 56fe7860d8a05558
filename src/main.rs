//! # lipidann
//!
//! Command-line front end of the lipid annotation cascade.
//!
//! ## Usage
//!
//! ```bash
//! # Full cascade
//! lipidann annotate features.csv out/ --library library.csv --class-model class.json
//!
//! # Database search only, 10 ppm MS1 window
//! lipidann search features.csv out/ --library library.csv --ms1-tol 10 --ppm
//!
//! # Formula branch
//! lipidann formula features.csv out/
//!
//! # Validate a config file
//! lipidann check-config lipidann.toml
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
