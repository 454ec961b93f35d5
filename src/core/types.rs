use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of Monte Carlo trials used when the caller does not override it.
pub const DEFAULT_TRIALS: u32 = 1000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationMode {
    Simple,
    MonteCarlo,
    Pessimistic,
    Optimistic,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("simulation failed: {0}")]
    Internal(String),
}

/// Fully-resolved simulation inputs. Allocation percentages are expressed
/// out of 100 and keyed by lower-cased asset class name.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    pub time_horizon_years: u32,
    pub asset_allocations: BTreeMap<String, f64>,
    pub include_inflation: bool,
    pub inflation_rate: f64,
    pub include_rebalancing: bool,
    pub rebalancing_frequency_months: u32,
    pub simulation_mode: SimulationMode,
    pub trials: u32,
    pub seed: Option<u64>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            initial_investment: 10_000.0,
            monthly_contribution: 0.0,
            time_horizon_years: 10,
            asset_allocations: BTreeMap::from([
                ("stocks".to_string(), 60.0),
                ("bonds".to_string(), 30.0),
                ("cash".to_string(), 10.0),
            ]),
            include_inflation: true,
            inflation_rate: 3.0,
            include_rebalancing: true,
            rebalancing_frequency_months: 12,
            simulation_mode: SimulationMode::Simple,
            trials: DEFAULT_TRIALS,
            seed: None,
        }
    }
}

/// Year-end snapshot emitted by the deterministic projection path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyProjection {
    pub year: u32,
    pub portfolio_value: f64,
    pub cumulative_contributions: f64,
    pub cumulative_returns: f64,
    pub real_value: f64,
    pub asset_breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatistics {
    pub best_case_value: f64,
    pub worst_case_value: f64,
    pub median_value: f64,
    pub standard_deviation: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    /// Chance of doubling the initial investment, in percent.
    /// Only populated by the Monte Carlo path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_of_success: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub final_value: f64,
    pub total_contributions: f64,
    pub total_returns: f64,
    pub real_return_after_inflation: f64,
    pub average_annual_return: f64,
    /// Empty in Monte Carlo mode; per-trial trajectories are not retained.
    pub yearly_projections: Vec<YearlyProjection>,
    pub final_asset_breakdown: BTreeMap<String, f64>,
    pub statistics: SimulationStatistics,
    pub simulation_mode: SimulationMode,
}
