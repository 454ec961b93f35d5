use std::collections::BTreeMap;

use super::assets::AssetReturnModel;

/// Splits a cash amount across asset classes by target percentage. Used for
/// the initial seeding and for each year's new contribution, so new money
/// follows target weights rather than the portfolio's drifted weights.
pub fn distribute(cash_amount: f64, targets: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    targets
        .iter()
        .map(|(asset, percent)| (asset.clone(), cash_amount * (percent / 100.0)))
        .collect()
}

/// Redistributes the portfolio's current total back to target percentages,
/// discarding any drift.
pub fn rebalance(
    current_values: &BTreeMap<String, f64>,
    targets: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let total_value: f64 = current_values.values().sum();
    distribute(total_value, targets)
}

/// Whether a rebalance triggers at the end of the given year. The engine
/// steps in whole years, so the monthly frequency floors to whole years and
/// anything under 12 months triggers annually.
pub fn rebalance_due(year: u32, frequency_months: u32) -> bool {
    let every_years = (frequency_months / 12).max(1);
    year % every_years == 0
}

/// Allocation-weighted expected annual return in percent. `return_scale`
/// lets the pessimistic/optimistic pseudomodes shade every asset's mean.
pub fn weighted_expected_return(
    model: &AssetReturnModel,
    allocations: &BTreeMap<String, f64>,
    return_scale: f64,
) -> f64 {
    allocations
        .iter()
        .map(|(asset, percent)| {
            (percent / 100.0) * model.params(asset).expected_return * return_scale
        })
        .sum()
}
