//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod check;
pub mod intrinsic;
pub mod value;

use std::io::Write;
use std::path::Path;

use clap::ValueEnum;
use storage_pricing::{ValuationRequest, ValuationResult};

use crate::config::{Inputs, ValuerConfig};
use crate::Result;

/// How a valuation result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary table
    Table,
    /// Full result as JSON
    Json,
}

/// Borrow a valuation request from loaded inputs
pub(crate) fn request<'a>(config: &'a ValuerConfig, inputs: &'a Inputs) -> ValuationRequest<'a> {
    ValuationRequest {
        storage: &inputs.storage,
        valuation_date: config.valuation.date,
        inventory: config.valuation.inventory,
        forward_curve: &inputs.forward_curve,
        interest_rates: &inputs.interest_rates,
        settlement_rule: inputs.settlement.as_ref(),
        model: &inputs.model,
        basis: &config.valuation.basis,
    }
}

/// Write `result` to `output`, or stdout when absent
pub(crate) fn emit(result: &ValuationResult, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Table => render_table(result),
    };
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
        }
    }
    Ok(())
}

fn render_table(result: &ValuationResult) -> String {
    let mut out = String::new();
    out.push_str("┌──────────────────┬──────────────────┐\n");
    out.push_str(&format!("│ {:<16} │ {:>16.4} │\n", "NPV", result.npv));
    out.push_str(&format!("│ {:<16} │ {:>16.4} │\n", "Std error", result.npv_std_error));
    out.push_str(&format!("│ {:<16} │ {:>16.4} │\n", "Intrinsic", result.intrinsic_npv));
    out.push_str(&format!("│ {:<16} │ {:>16.4} │\n", "Extrinsic", result.extrinsic_npv));
    out.push_str(&format!("│ {:<16} │ {:>16} │\n", "Decision dates", result.dates.len()));
    out.push_str("└──────────────────┴──────────────────┘\n");

    if !result.dates.is_empty() {
        out.push_str(&format!(
            "\n{:<10} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "Date", "Inventory", "Net volume", "Delta", "Inject at", "Withdraw at"
        ));
        for (i, date) in result.dates.iter().enumerate() {
            let trigger = result.trigger_prices.get(i).copied().unwrap_or_default();
            out.push_str(&format!(
                "{:<10} {:>12.3} {:>12.3} {:>12.3} {:>12} {:>12}\n",
                date.to_string(),
                result.expected_profile.inventory[i],
                result.expected_profile.net_volume[i],
                result.deltas[i],
                price_cell(trigger.inject_price),
                price_cell(trigger.withdraw_price),
            ));
        }
    }
    out
}

fn price_cell(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{:.4}", p))
}

/// Load, override and validate a configuration file
pub(crate) fn load_config(path: &Path) -> Result<ValuerConfig> {
    if !path.exists() {
        return Err(crate::CliError::FileNotFound(path.display().to_string()));
    }
    let mut config = ValuerConfig::from_file(path)?;
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
