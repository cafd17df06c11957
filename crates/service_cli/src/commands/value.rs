//! Value command implementation
//!
//! Runs the full LSMC valuation described by a configuration file.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use storage_pricing::value_storage;
use tracing::{debug, info};

use super::{emit, load_config, request, OutputFormat};
use crate::config::Inputs;
use crate::Result;

/// Options for the value command
#[derive(Debug, Clone)]
pub struct ValueOptions<'a> {
    pub format: OutputFormat,
    pub output: Option<&'a Path>,
    pub num_paths: Option<usize>,
    pub seed: Option<u64>,
    pub panels: bool,
}

/// Run the value command
pub fn run(config_path: &Path, options: &ValueOptions<'_>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(num_paths) = options.num_paths {
        config.numerics.num_paths = num_paths;
    }
    if let Some(seed) = options.seed {
        config.numerics.seed = seed;
    }
    let lsmc = config.numerics.lsmc(options.panels).map_err(crate::config::ConfigError::from)?;
    let inputs = Inputs::build(&config)?;

    info!(
        config = %config_path.display(),
        valuation_date = %config.valuation.date,
        num_paths = lsmc.num_paths(),
        "Starting valuation"
    );

    let last_decile = AtomicU32::new(0);
    let progress = move |fraction: f64| -> ControlFlow<()> {
        let decile = (fraction * 10.0).floor() as u32;
        if last_decile.fetch_max(decile, Ordering::Relaxed) < decile {
            debug!("valuation {:.0}% complete", fraction * 100.0);
        }
        ControlFlow::Continue(())
    };

    let result = value_storage(&request(&config, &inputs), &lsmc, Some(&progress))?;
    info!(npv = result.npv, std_error = result.npv_std_error, "Valuation complete");
    emit(&result, options.format, options.output)
}
