use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use super::allocation::{distribute, rebalance, rebalance_due, weighted_expected_return};
use super::assets::{AssetReturnModel, historical_model};
use super::stats::{percentile, population_std_dev, portfolio_volatility, sharpe_ratio};
use super::types::{
    SimulationError, SimulationMode, SimulationRequest, SimulationResult, SimulationStatistics,
    YearlyProjection,
};

const ALLOCATION_SUM_TOLERANCE: f64 = 0.01;
const PESSIMISTIC_RETURN_SCALE: f64 = 0.6;
const OPTIMISTIC_RETURN_SCALE: f64 = 1.3;
/// A trial counts as a success when it at least doubles the initial investment.
const SUCCESS_GOAL_MULTIPLE: f64 = 2.0;

/// Validates and runs a simulation against the historical asset table.
pub fn run_simulation(request: &SimulationRequest) -> Result<SimulationResult, SimulationError> {
    run_simulation_with_model(request, historical_model())
}

/// Same as [`run_simulation`] but with a caller-supplied asset table.
pub fn run_simulation_with_model(
    request: &SimulationRequest,
    model: &AssetReturnModel,
) -> Result<SimulationResult, SimulationError> {
    validate_request(request)?;

    match request.simulation_mode {
        SimulationMode::Simple => Ok(run_deterministic(request, model, 1.0, SimulationMode::Simple)),
        SimulationMode::MonteCarlo => run_monte_carlo(request, model),
        SimulationMode::Pessimistic => Ok(run_banded(
            request,
            model,
            PESSIMISTIC_RETURN_SCALE,
            0.8,
            1.1,
            SimulationMode::Pessimistic,
        )),
        SimulationMode::Optimistic => Ok(run_banded(
            request,
            model,
            OPTIMISTIC_RETURN_SCALE,
            0.9,
            1.2,
            SimulationMode::Optimistic,
        )),
    }
}

/// Pure request check; no simulation work happens when this fails.
pub fn validate_request(request: &SimulationRequest) -> Result<(), SimulationError> {
    if !request.initial_investment.is_finite() || request.initial_investment < 0.0 {
        return Err(SimulationError::InvalidRequest(
            "initial investment must be zero or positive".to_string(),
        ));
    }

    if !request.monthly_contribution.is_finite() || request.monthly_contribution < 0.0 {
        return Err(SimulationError::InvalidRequest(
            "monthly contribution must be zero or positive".to_string(),
        ));
    }

    if request.time_horizon_years < 1 {
        return Err(SimulationError::InvalidRequest(
            "time horizon must be at least 1 year".to_string(),
        ));
    }

    if request.asset_allocations.is_empty() {
        return Err(SimulationError::InvalidRequest(
            "asset allocations are required".to_string(),
        ));
    }

    let total: f64 = request.asset_allocations.values().sum();
    if !total.is_finite() || (total - 100.0).abs() > ALLOCATION_SUM_TOLERANCE {
        return Err(SimulationError::InvalidRequest(format!(
            "asset allocations must sum to 100% (got {total})"
        )));
    }

    if request.simulation_mode == SimulationMode::MonteCarlo && request.trials < 1 {
        return Err(SimulationError::InvalidRequest(
            "at least one Monte Carlo trial is required".to_string(),
        ));
    }

    Ok(())
}

fn run_deterministic(
    request: &SimulationRequest,
    model: &AssetReturnModel,
    return_scale: f64,
    mode: SimulationMode,
) -> SimulationResult {
    let yearly_contribution = request.monthly_contribution * 12.0;
    let inflation_rate = if request.include_inflation {
        request.inflation_rate / 100.0
    } else {
        0.0
    };
    let expected_return = weighted_expected_return(model, &request.asset_allocations, return_scale);

    let mut asset_values = distribute(request.initial_investment, &request.asset_allocations);
    let mut total_contributions = request.initial_investment;
    let mut portfolio_value = request.initial_investment;
    let mut projections = Vec::with_capacity(request.time_horizon_years as usize);

    for year in 1..=request.time_horizon_years {
        total_contributions += yearly_contribution;
        for (asset, share) in distribute(yearly_contribution, &request.asset_allocations) {
            *asset_values.entry(asset).or_insert(0.0) += share;
        }

        for (asset, value) in asset_values.iter_mut() {
            let rate = model.params(asset).expected_return * return_scale / 100.0;
            *value *= 1.0 + rate;
        }

        if request.include_rebalancing && rebalance_due(year, request.rebalancing_frequency_months)
        {
            asset_values = rebalance(&asset_values, &request.asset_allocations);
        }

        portfolio_value = asset_values.values().sum();
        let real_value = portfolio_value / (1.0 + inflation_rate).powi(year as i32);

        projections.push(YearlyProjection {
            year,
            portfolio_value,
            cumulative_contributions: total_contributions,
            cumulative_returns: portfolio_value - total_contributions,
            real_value,
            asset_breakdown: asset_values.clone(),
        });
    }

    let final_real_value = projections
        .last()
        .map(|p| p.real_value)
        .unwrap_or(portfolio_value);
    let volatility = portfolio_volatility(model, &request.asset_allocations);

    SimulationResult {
        final_value: portfolio_value,
        total_contributions,
        total_returns: portfolio_value - total_contributions,
        real_return_after_inflation: final_real_value - total_contributions,
        average_annual_return: expected_return,
        yearly_projections: projections,
        final_asset_breakdown: asset_values,
        statistics: SimulationStatistics {
            best_case_value: portfolio_value * 1.5,
            worst_case_value: portfolio_value * 0.7,
            median_value: portfolio_value,
            standard_deviation: volatility,
            sharpe_ratio: sharpe_ratio(expected_return, volatility),
            max_drawdown: volatility * 2.0,
            probability_of_success: None,
        },
        simulation_mode: mode,
    }
}

/// Pessimistic/optimistic pseudomodes: the deterministic path with scaled
/// expected returns, then fixed multiplicative bands around the point
/// estimate. The bands are heuristic labels, not statistical bounds.
fn run_banded(
    request: &SimulationRequest,
    model: &AssetReturnModel,
    return_scale: f64,
    worst_band: f64,
    best_band: f64,
    mode: SimulationMode,
) -> SimulationResult {
    let mut result = run_deterministic(request, model, return_scale, mode);
    result.statistics.worst_case_value = result.final_value * worst_band;
    result.statistics.best_case_value = result.final_value * best_band;
    result.statistics.median_value = result.final_value;
    result
}

struct TrialOutcome {
    final_value: f64,
    total_contributions: f64,
    asset_breakdown: BTreeMap<String, f64>,
}

fn run_trial(
    request: &SimulationRequest,
    model: &AssetReturnModel,
    rng: &mut SmallRng,
) -> TrialOutcome {
    let yearly_contribution = request.monthly_contribution * 12.0;
    let mut asset_values = distribute(request.initial_investment, &request.asset_allocations);
    let mut total_contributions = request.initial_investment;

    for year in 1..=request.time_horizon_years {
        total_contributions += yearly_contribution;
        for (asset, share) in distribute(yearly_contribution, &request.asset_allocations) {
            *asset_values.entry(asset).or_insert(0.0) += share;
        }

        // Independent draw per asset per year; ordered map iteration keeps
        // the draw sequence stable for a given seed.
        for (asset, value) in asset_values.iter_mut() {
            let params = model.params(asset);
            let z: f64 = rng.sample(StandardNormal);
            let sampled_return = params.expected_return / 100.0 + z * params.volatility / 100.0;
            // A worse-than-total-loss year floors at zero; leveraged losses
            // are not representable.
            *value = (*value * (1.0 + sampled_return)).max(0.0);
        }

        if request.include_rebalancing && rebalance_due(year, request.rebalancing_frequency_months)
        {
            asset_values = rebalance(&asset_values, &request.asset_allocations);
        }
    }

    TrialOutcome {
        final_value: asset_values.values().sum(),
        total_contributions,
        asset_breakdown: asset_values,
    }
}

fn run_monte_carlo(
    request: &SimulationRequest,
    model: &AssetReturnModel,
) -> Result<SimulationResult, SimulationError> {
    let trials = request.trials as usize;
    let base_seed = request.seed.unwrap_or_else(rand::random);

    let mut outcomes: Vec<TrialOutcome> = (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = SmallRng::seed_from_u64(derive_seed(base_seed, trial as u64));
            run_trial(request, model, &mut rng)
        })
        .collect();

    let mut final_values: Vec<f64> = outcomes.iter().map(|o| o.final_value).collect();
    if final_values.iter().any(|v| !v.is_finite()) {
        return Err(SimulationError::Internal(
            "a trial produced a non-finite portfolio value".to_string(),
        ));
    }

    let worst_case = percentile(&mut final_values, 5.0);
    let median = percentile(&mut final_values, 50.0);
    let best_case = percentile(&mut final_values, 95.0);
    let standard_deviation = population_std_dev(&final_values);

    let goal = request.initial_investment * SUCCESS_GOAL_MULTIPLE;
    let successes = final_values.iter().filter(|v| **v >= goal).count();
    let probability_of_success = successes as f64 / trials as f64 * 100.0;

    // The median-indexed trial stands in for the non-statistical fields.
    // It is illustrative only and carries no yearly trajectory.
    let representative = outcomes.swap_remove(trials / 2);

    let expected_return = weighted_expected_return(model, &request.asset_allocations, 1.0);
    let volatility = portfolio_volatility(model, &request.asset_allocations);
    let inflation_rate = if request.include_inflation {
        request.inflation_rate / 100.0
    } else {
        0.0
    };
    let real_final_value = median / (1.0 + inflation_rate).powi(request.time_horizon_years as i32);

    Ok(SimulationResult {
        final_value: median,
        total_contributions: representative.total_contributions,
        total_returns: median - representative.total_contributions,
        real_return_after_inflation: real_final_value - representative.total_contributions,
        average_annual_return: expected_return,
        yearly_projections: Vec::new(),
        final_asset_breakdown: representative.asset_breakdown,
        statistics: SimulationStatistics {
            best_case_value: best_case,
            worst_case_value: worst_case,
            median_value: median,
            standard_deviation,
            sharpe_ratio: sharpe_ratio(expected_return, volatility),
            max_drawdown: volatility * 2.0,
            probability_of_success: Some(probability_of_success),
        },
        simulation_mode: SimulationMode::MonteCarlo,
    })
}

fn derive_seed(base_seed: u64, trial: u64) -> u64 {
    splitmix64(base_seed ^ trial.wrapping_mul(0x9E3779B97F4A7C15))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
