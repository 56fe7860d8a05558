use anyhow::{Context, Result};
use std::path::PathBuf;

use lipidann::output::OutputDir;
use lipidann::pipeline::Pipeline;

use super::{settings, RunArgs};

/// Database search only
pub fn run(input: PathBuf, output: PathBuf, run: RunArgs) -> Result<()> {
    let config = settings::load_config(&run)?;
    let store = settings::load_store(&config)?;
    let table = settings::load_features(&input)?;

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let report = pipeline.search(&store, &table.features);

    let mut out = OutputDir::create(&output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    out.write_search(&report)?;
    out.write_ingestion_errors(&table.errors)?;
    out.finish();

    println!(
        "{} matched, {} dark, {} failed{}",
        report.matched.len(),
        report.unmatched.len(),
        report.failures.len(),
        if report.cancelled { " [cancelled]" } else { "" }
    );
    Ok(())
}
