//! Inputs of a single valuation call.

use storage_core::market_data::{ForwardCurve, InterestRateCurve};
use storage_core::types::Date;
use storage_models::models::MultiFactorModel;
use storage_models::storage::StorageSpecification;

use super::error::ValuationError;
use super::settlement::SettlementRule;

/// Everything describing what is valued, borrowed for the duration of a call.
///
/// Numerical settings live separately in [`LsmcConfig`](super::LsmcConfig)
/// so the same request can be valued at several path counts or grid sizes.
#[derive(Clone, Copy)]
pub struct ValuationRequest<'a> {
    /// Facility being valued.
    pub storage: &'a StorageSpecification,
    /// Date cash flows are discounted to and the simulation starts from.
    pub valuation_date: Date,
    /// Inventory held on the valuation date.
    pub inventory: f64,
    /// Forward prices by delivery date.
    pub forward_curve: &'a ForwardCurve,
    /// Discounting curve.
    pub interest_rates: &'a InterestRateCurve,
    /// Maps delivery dates to cash settlement dates.
    pub settlement_rule: &'a dyn SettlementRule,
    /// Spot price dynamics.
    pub model: &'a MultiFactorModel,
    /// Regression basis, e.g. `"1 + x_st + x_lt + s + s**2"`.
    pub basis: &'a str,
}

impl ValuationRequest<'_> {
    /// Checks values that cannot be caught by the types.
    ///
    /// # Errors
    ///
    /// `ValuationError::InvalidRequest` for a negative or non-finite inventory.
    pub fn validate(&self) -> Result<(), ValuationError> {
        if !self.inventory.is_finite() || self.inventory < 0.0 {
            return Err(ValuationError::InvalidRequest(format!(
                "starting inventory must be finite and non-negative, got {}",
                self.inventory
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ValuationRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationRequest")
            .field("storage", self.storage)
            .field("valuation_date", &self.valuation_date)
            .field("inventory", &self.inventory)
            .field("basis", &self.basis)
            .finish_non_exhaustive()
    }
}
