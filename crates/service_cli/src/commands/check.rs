//! Check command implementation
//!
//! Loads a configuration and builds every input without valuing anything.

use std::path::Path;

use storage_pricing::basis::{BasisFunctions, BasisVariables};
use tracing::info;

use super::load_config;
use crate::config::Inputs;
use crate::{CliError, Result};

/// Run the check command
pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let inputs = Inputs::build(&config)?;

    let variables = BasisVariables::for_model(&inputs.model);
    BasisFunctions::parse(&config.valuation.basis, &variables)
        .map_err(|e| CliError::InvalidArgument(format!("basis: {}", e)))?;
    let decision_dates = inputs.storage.decision_dates(config.valuation.date);

    info!("Configuration OK");
    info!("  Facility: {} to {}", inputs.storage.start(), inputs.storage.end());
    info!("  Decision dates from {}: {}", config.valuation.date, decision_dates.len());
    info!("  Model factors: {}", inputs.model.factor_names().join(", "));
    info!("  Paths: {}, seed {}", config.numerics.num_paths, config.numerics.seed);
    println!("OK");
    Ok(())
}
