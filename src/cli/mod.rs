use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use lipidann::similarity::SimilarityMethod;

mod annotate;
mod check_config;
mod formula;
mod search;
mod settings;

/// lipidann - Lipid annotation of LC-MS/MS features
#[derive(Parser)]
#[command(name = "lipidann")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads features
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reference library table (overrides `artifacts.reference`)
    #[arg(short = 'l', long, value_name = "FILE")]
    library: Option<PathBuf>,

    /// MS1 tolerance (Da unless --ppm)
    #[arg(long)]
    ms1_tol: Option<f64>,

    /// Interpret --ms1-tol as ppm
    #[arg(long)]
    ppm: bool,

    /// MS2 peak-matching tolerance in Da
    #[arg(long)]
    ms2_tol: Option<f64>,

    /// Minimum similarity for a library match
    #[arg(long)]
    ms2_threshold: Option<f64>,

    /// Similarity method
    #[arg(long)]
    method: Option<SimilarityMethod>,

    /// Worker threads (0 = all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full cascade: search, class and chain prediction, naming
    Annotate {
        /// Input feature table (CSV, or TSV by extension)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(value_name = "OUTPUT", default_value = "lipidann_out")]
        output: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// Skip the rule stage; every class comes from the model
        #[arg(long)]
        no_rules: bool,

        /// Class model JSON (overrides `artifacts.class_model`)
        #[arg(long, value_name = "FILE")]
        class_model: Option<PathBuf>,

        /// Adduct model JSON (overrides `artifacts.adduct_model`)
        #[arg(long, value_name = "FILE")]
        adduct_model: Option<PathBuf>,

        /// Also run the formula branch with class hints
        #[arg(long)]
        formulas: bool,
    },

    /// Database search only: matched and dark tables
    Search {
        /// Input feature table
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(value_name = "OUTPUT", default_value = "lipidann_out")]
        output: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Formula decomposition and re-ranking without class hints
    Formula {
        /// Input feature table
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(value_name = "OUTPUT", default_value = "lipidann_out")]
        output: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Validate a config file and the artifacts it names
    CheckConfig {
        /// Config file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Annotate {
            input,
            output,
            run,
            no_rules,
            class_model,
            adduct_model,
            formulas,
        } => annotate::run(
            input,
            output,
            run,
            annotate::Overrides {
                no_rules,
                class_model,
                adduct_model,
                formulas,
            },
        ),
        Commands::Search { input, output, run } => search::run(input, output, run),
        Commands::Formula { input, output, run } => formula::run(input, output, run),
        Commands::CheckConfig { file } => check_config::run(file),
    }
}
