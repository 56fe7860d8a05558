use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use lipidann::output::OutputDir;
use lipidann::pipeline::{formula_constraints, AnnotationContext, Pipeline, RunSummary};

use super::{settings, RunArgs};

/// Flags only the annotate command has
pub struct Overrides {
    pub no_rules: bool,
    pub class_model: Option<PathBuf>,
    pub adduct_model: Option<PathBuf>,
    pub formulas: bool,
}

/// Run the full annotation cascade
pub fn run(input: PathBuf, output: PathBuf, run: RunArgs, overrides: Overrides) -> Result<()> {
    let started_at = Utc::now();
    let start = Instant::now();

    let mut config = settings::load_config(&run)?;
    if overrides.no_rules {
        config.rules.no_rules = true;
    }
    if let Some(path) = overrides.class_model {
        config.artifacts.class_model = Some(path);
    }
    if let Some(path) = overrides.adduct_model {
        config.artifacts.adduct_model = Some(path);
    }

    let store = settings::load_store(&config)?;
    let prediction = settings::load_prediction(&config)?;
    let context = AnnotationContext {
        store: Arc::new(store),
        prediction,
    };
    let table = settings::load_features(&input)?;

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let report = pipeline.annotate(&context, &table.features);

    let mut out = OutputDir::create(&output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    out.write_annotation(&report)?;
    out.write_ingestion_errors(&table.errors)?;

    let mut summary = RunSummary::new(
        started_at,
        pipeline.config().search.method,
        table.errors.len(),
        &report,
    );
    if overrides.formulas {
        let decomposer = settings::decomposer(pipeline.config())?;
        let constraints = formula_constraints(&report.records);
        let formulas =
            pipeline.resolve_formulas(decomposer.as_ref(), &table.features, &constraints);
        out.write_formulas(&formulas)?;
        summary = summary.with_formulas(&formulas);
    }
    out.write_summary(&summary)?;
    let stats = out.finish();

    info!("{stats}");
    println!("{summary}");
    println!(
        "Output written to {} in {:.2}s",
        output.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
