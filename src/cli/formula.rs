use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

use lipidann::output::OutputDir;
use lipidann::pipeline::Pipeline;

use super::{settings, RunArgs};

/// Formula branch on raw features, without class hints
pub fn run(input: PathBuf, output: PathBuf, run: RunArgs) -> Result<()> {
    let config = settings::load_config(&run)?;
    let decomposer = settings::decomposer(&config)?;
    let table = settings::load_features(&input)?;

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let report = pipeline.resolve_formulas(decomposer.as_ref(), &table.features, &HashMap::new());

    let mut out = OutputDir::create(&output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    out.write_formulas(&report)?;
    out.write_ingestion_errors(&table.errors)?;
    out.finish();

    println!(
        "{} features resolved, {} failed",
        report.annotations.len(),
        report.failures.len()
    );
    Ok(())
}
