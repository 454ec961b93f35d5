use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Assumed annual return and volatility for one asset class, both in percent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AssetClassParams {
    pub expected_return: f64,
    pub volatility: f64,
}

/// Fallback for asset classes the reference table does not know about.
pub const DEFAULT_ASSET_PARAMS: AssetClassParams = AssetClassParams {
    expected_return: 7.0,
    volatility: 15.0,
};

/// Read-only table of per-asset-class return assumptions. Built once at
/// startup and shared; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AssetReturnModel {
    entries: BTreeMap<String, AssetClassParams>,
}

impl AssetReturnModel {
    /// Long-run historical averages for the supported asset classes.
    pub fn historical() -> Self {
        Self::from_entries([
            ("stocks", 10.0, 18.0),
            ("bonds", 5.0, 6.0),
            ("reits", 8.0, 15.0),
            ("crypto", 25.0, 80.0),
            ("cash", 3.0, 0.5),
            ("commodities", 6.0, 20.0),
            ("international", 9.0, 22.0),
        ])
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, f64, f64)>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(asset, expected_return, volatility)| {
                    (
                        asset.to_ascii_lowercase(),
                        AssetClassParams {
                            expected_return,
                            volatility,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Looks up an asset class case-insensitively, falling back to
    /// [`DEFAULT_ASSET_PARAMS`] for unknown names.
    pub fn params(&self, asset: &str) -> AssetClassParams {
        self.entries
            .get(&asset.to_ascii_lowercase())
            .copied()
            .unwrap_or(DEFAULT_ASSET_PARAMS)
    }
}

static HISTORICAL: LazyLock<AssetReturnModel> = LazyLock::new(AssetReturnModel::historical);

/// The process-wide historical reference table.
pub fn historical_model() -> &'static AssetReturnModel {
    &HISTORICAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let model = AssetReturnModel::historical();
        assert_eq!(model.params("Stocks"), model.params("stocks"));
        assert_eq!(model.params("STOCKS").expected_return, 10.0);
        assert_eq!(model.params("STOCKS").volatility, 18.0);
    }

    #[test]
    fn unknown_asset_falls_back_to_default() {
        let model = AssetReturnModel::historical();
        assert_eq!(model.params("beanie-babies"), DEFAULT_ASSET_PARAMS);
    }

    #[test]
    fn historical_table_covers_reference_classes() {
        let model = AssetReturnModel::historical();
        for asset in [
            "stocks",
            "bonds",
            "reits",
            "crypto",
            "cash",
            "commodities",
            "international",
        ] {
            assert_ne!(model.params(asset), DEFAULT_ASSET_PARAMS, "missing {asset}");
        }
    }
}
