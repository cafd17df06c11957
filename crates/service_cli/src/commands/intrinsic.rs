//! Intrinsic command implementation
//!
//! Values the facility against the forward curve alone.

use std::path::Path;

use storage_pricing::intrinsic_value;
use tracing::info;

use super::{emit, load_config, request, OutputFormat};
use crate::config::{ConfigError, Inputs};
use crate::Result;

/// Run the intrinsic command
pub fn run(config_path: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let lsmc = config.numerics.lsmc(false).map_err(ConfigError::from)?;
    let inputs = Inputs::build(&config)?;

    let result = intrinsic_value(&request(&config, &inputs), &lsmc)?;
    info!(npv = result.npv, "Intrinsic valuation complete");
    emit(&result, format, output)
}
