use std::collections::BTreeMap;

use super::assets::AssetReturnModel;

/// Annual risk-free rate in percent used by the Sharpe-like ratio.
pub const RISK_FREE_RATE: f64 = 3.0;

/// Floor applied to portfolio volatility before dividing, so an all-cash-like
/// allocation cannot turn the Sharpe computation into a division by zero.
pub const MIN_PORTFOLIO_VOLATILITY: f64 = 0.01;

/// Linearly interpolated percentile over an unsorted sample; sorts in place.
pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}

/// Population standard deviation (divides by N, not N-1).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Allocation-weighted portfolio volatility in percent. Asset classes are
/// treated as uncorrelated, so the weighted variances sum in quadrature.
pub fn portfolio_volatility(model: &AssetReturnModel, allocations: &BTreeMap<String, f64>) -> f64 {
    allocations
        .iter()
        .map(|(asset, percent)| {
            let weighted = (percent / 100.0) * model.params(asset).volatility;
            weighted * weighted
        })
        .sum::<f64>()
        .sqrt()
}

/// Sharpe-like risk-adjusted return: excess return over the fixed risk-free
/// rate per unit of (floored) portfolio volatility.
pub fn sharpe_ratio(expected_return: f64, volatility: f64) -> f64 {
    (expected_return - RISK_FREE_RATE) / volatility.max(MIN_PORTFOLIO_VOLATILITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let mut values = vec![40.0, 10.0, 20.0, 30.0];
        assert!((percentile(&mut values, 0.0) - 10.0).abs() <= EPS);
        assert!((percentile(&mut values, 50.0) - 25.0).abs() <= EPS);
        assert!((percentile(&mut values, 100.0) - 40.0).abs() <= EPS);
        assert!((percentile(&mut values, 25.0) - 17.5).abs() <= EPS);
    }

    #[test]
    fn percentile_of_empty_and_singleton_samples() {
        assert_eq!(percentile(&mut [], 50.0), 0.0);
        assert!((percentile(&mut [42.0], 95.0) - 42.0).abs() <= EPS);
    }

    #[test]
    fn population_std_dev_matches_hand_computation() {
        // Mean 5, deviations ±3 and ±1 -> variance (9+1+1+9)/4 = 5.
        let values = [2.0, 4.0, 6.0, 8.0];
        assert!((population_std_dev(&values) - 5.0_f64.sqrt()).abs() <= EPS);
        assert_eq!(population_std_dev(&[]), 0.0);
        assert_eq!(population_std_dev(&[7.0]), 0.0);
    }

    #[test]
    fn portfolio_volatility_sums_in_quadrature() {
        let model = AssetReturnModel::historical();
        let single = BTreeMap::from([("stocks".to_string(), 100.0)]);
        assert!((portfolio_volatility(&model, &single) - 18.0).abs() <= EPS);

        let mixed = BTreeMap::from([
            ("stocks".to_string(), 60.0),
            ("bonds".to_string(), 40.0),
        ]);
        let expected = ((0.6_f64 * 18.0).powi(2) + (0.4_f64 * 6.0).powi(2)).sqrt();
        assert!((portfolio_volatility(&model, &mixed) - expected).abs() <= EPS);
    }

    #[test]
    fn sharpe_ratio_survives_zero_volatility() {
        let ratio = sharpe_ratio(7.0, 0.0);
        assert!(ratio.is_finite());
        assert!((ratio - (7.0 - RISK_FREE_RATE) / MIN_PORTFOLIO_VOLATILITY).abs() <= EPS);
    }
}
