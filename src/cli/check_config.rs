use anyhow::Result;
use std::path::PathBuf;

use super::{settings, RunArgs};

/// Validate a config file and load every artifact it names
pub fn run(file: PathBuf) -> Result<()> {
    let run = RunArgs {
        config: Some(file.clone()),
        ..RunArgs::default()
    };
    let config = settings::load_config(&run)?;

    println!("Configuration: {}", file.display());
    for line in settings::describe(&config) {
        println!("  {line}");
    }

    let rules = settings::load_rules(&config)?;
    println!("  rule table: {} rules", rules.len());

    if config.artifacts.reference.is_some() {
        let store = settings::load_store(&config)?;
        println!("  reference library: {} entries", store.entries().len());
    }
    if config.artifacts.class_model.is_some() {
        let prediction = settings::load_prediction(&config)?;
        println!(
            "  models: class{}",
            if prediction.adduct_model.is_some() { ", adduct" } else { "" }
        );
    }
    settings::decomposer(&config)?;

    println!("OK");
    Ok(())
}
