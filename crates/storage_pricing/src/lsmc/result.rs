//! Valuation outputs.

use storage_core::types::Date;

/// Result of a storage valuation.
///
/// All money amounts are discounted to the valuation date.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValuationResult {
    /// Full (intrinsic plus extrinsic) value.
    pub npv: f64,
    /// Standard error of `npv` across paths.
    pub npv_std_error: f64,
    /// Value of the optimal schedule against the forward curve.
    pub intrinsic_npv: f64,
    /// `npv - intrinsic_npv`.
    pub extrinsic_npv: f64,
    /// Decision dates the series below are indexed by.
    pub dates: Vec<Date>,
    /// Sensitivity of `npv` to the forward price of each decision date.
    pub deltas: Vec<f64>,
    /// Expected operation along the simulated paths.
    pub expected_profile: StorageProfile,
    /// Operation along the forward curve.
    pub intrinsic_profile: StorageProfile,
    /// Inject/withdraw trigger prices at the expected inventory.
    pub trigger_prices: Vec<TriggerPrices>,
    /// Per-path detail, when requested.
    pub panels: Option<SimulationPanels>,
}

impl ValuationResult {
    /// Result for a valuation date after the storage end: nothing is left to value.
    pub fn expired() -> Self {
        Self {
            npv: 0.0,
            npv_std_error: 0.0,
            intrinsic_npv: 0.0,
            extrinsic_npv: 0.0,
            dates: Vec::new(),
            deltas: Vec::new(),
            expected_profile: StorageProfile::default(),
            intrinsic_profile: StorageProfile::default(),
            trigger_prices: Vec::new(),
            panels: None,
        }
    }

    /// Half-width of the 95% confidence interval of `npv`.
    #[inline]
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.npv_std_error
    }
}

/// Per-decision-date averages of how the facility is operated.
///
/// Volumes are positive; `net_volume` is injected minus withdrawn.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageProfile {
    /// Inventory at the start of each period.
    pub inventory: Vec<f64>,
    /// Volume injected.
    pub injected: Vec<f64>,
    /// Volume withdrawn.
    pub withdrawn: Vec<f64>,
    /// Commodity burnt as fuel by injection and withdrawal.
    pub consumed: Vec<f64>,
    /// Inventory lost over the period.
    pub loss: Vec<f64>,
    /// Injected minus withdrawn.
    pub net_volume: Vec<f64>,
    /// Discounted cash flow of the period.
    pub pv: Vec<f64>,
    /// Inventory left on the end date.
    pub end_inventory: f64,
}

impl StorageProfile {
    pub(crate) fn with_len(n: usize) -> Self {
        Self {
            inventory: vec![0.0; n],
            injected: vec![0.0; n],
            withdrawn: vec![0.0; n],
            consumed: vec![0.0; n],
            loss: vec![0.0; n],
            net_volume: vec![0.0; n],
            pv: vec![0.0; n],
            end_inventory: 0.0,
        }
    }

    /// Number of decision dates covered.
    pub fn len(&self) -> usize {
        self.inventory.len()
    }

    /// True if the profile covers no dates.
    pub fn is_empty(&self) -> bool {
        self.inventory.is_empty()
    }
}

/// Spot levels at which it pays to inject or withdraw on one date.
///
/// Injecting the full `inject_volume` is optimal below `inject_price`;
/// withdrawing `withdraw_volume` is optimal above `withdraw_price`. A side is
/// `None` when no volume can be moved in that direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerPrices {
    /// Injection trigger price.
    pub inject_price: Option<f64>,
    /// Maximum injection at the expected inventory.
    pub inject_volume: Option<f64>,
    /// Withdrawal trigger price.
    pub withdraw_price: Option<f64>,
    /// Maximum withdrawal at the expected inventory.
    pub withdraw_volume: Option<f64>,
}

/// A date by path matrix.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Panel {
    num_paths: usize,
    values: Vec<f64>,
}

impl Panel {
    pub(crate) fn zeros(num_dates: usize, num_paths: usize) -> Self {
        Self {
            num_paths,
            values: vec![0.0; num_dates * num_paths],
        }
    }

    pub(crate) fn set(&mut self, date_index: usize, path: usize, value: f64) {
        self.values[date_index * self.num_paths + path] = value;
    }

    /// Value on one date for one path.
    pub fn get(&self, date_index: usize, path: usize) -> f64 {
        self.values[date_index * self.num_paths + path]
    }

    /// All paths on one date.
    pub fn row(&self, date_index: usize) -> &[f64] {
        &self.values[date_index * self.num_paths..(date_index + 1) * self.num_paths]
    }

    /// Number of paths.
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }
}

/// Per-path detail of the forward pass.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationPanels {
    /// Simulated spot prices.
    pub spot: Panel,
    /// Inventory at the start of each period.
    pub inventory: Panel,
    /// Volume injected.
    pub injected: Panel,
    /// Volume withdrawn.
    pub withdrawn: Panel,
    /// Commodity consumed as fuel.
    pub consumed: Panel,
    /// Inventory lost.
    pub loss: Panel,
    /// Injected minus withdrawn.
    pub net_volume: Panel,
}

impl SimulationPanels {
    pub(crate) fn zeros(num_dates: usize, num_paths: usize) -> Self {
        let panel = Panel::zeros(num_dates, num_paths);
        Self {
            spot: panel.clone(),
            inventory: panel.clone(),
            injected: panel.clone(),
            withdrawn: panel.clone(),
            consumed: panel.clone(),
            loss: panel.clone(),
            net_volume: panel,
        }
    }
}
