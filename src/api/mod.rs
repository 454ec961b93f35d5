use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_TRIALS, SimulationError, SimulationMode, SimulationRequest, SimulationResult,
    run_simulation,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSimulationMode {
    Simple,
    MonteCarlo,
    Pessimistic,
    Optimistic,
}

impl From<CliSimulationMode> for SimulationMode {
    fn from(value: CliSimulationMode) -> Self {
        match value {
            CliSimulationMode::Simple => SimulationMode::Simple,
            CliSimulationMode::MonteCarlo => SimulationMode::MonteCarlo,
            CliSimulationMode::Pessimistic => SimulationMode::Pessimistic,
            CliSimulationMode::Optimistic => SimulationMode::Optimistic,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    /// Lenient parse for the HTTP surface; anything unrecognized falls back
    /// to moderate.
    fn from_api_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "conservative" => RiskTolerance::Conservative,
            "aggressive" => RiskTolerance::Aggressive,
            _ => RiskTolerance::Moderate,
        }
    }

    fn allocation_menu(self) -> BTreeMap<String, f64> {
        let entries: &[(&str, f64)] = match self {
            RiskTolerance::Conservative => &[
                ("bonds", 50.0),
                ("stocks", 25.0),
                ("reits", 15.0),
                ("cash", 10.0),
            ],
            RiskTolerance::Moderate => &[
                ("stocks", 50.0),
                ("bonds", 30.0),
                ("reits", 10.0),
                ("international", 7.0),
                ("cash", 3.0),
            ],
            RiskTolerance::Aggressive => &[
                ("stocks", 60.0),
                ("international", 20.0),
                ("reits", 10.0),
                ("crypto", 5.0),
                ("bonds", 5.0),
            ],
        };
        entries
            .iter()
            .map(|(asset, percent)| (asset.to_string(), *percent))
            .collect()
    }

    fn rationale(self) -> &'static str {
        match self {
            RiskTolerance::Conservative => {
                "Your conservative portfolio prioritizes capital preservation with 50% bonds \
                 and minimal exposure to volatile assets. Expected steady returns with low risk."
            }
            RiskTolerance::Moderate => {
                "Your balanced portfolio offers 50/30/20 allocation across stocks, bonds, and \
                 alternative assets for optimal risk-adjusted returns."
            }
            RiskTolerance::Aggressive => {
                "Your aggressive portfolio maximizes growth potential with 60% stocks and \
                 emerging asset classes. Higher volatility but strong long-term returns expected."
            }
        }
    }
}

/// Lenient mode parse for JSON payloads; unknown strings run the simple
/// projection rather than rejecting the request.
fn parse_simulation_mode(value: &str) -> SimulationMode {
    match value.to_ascii_lowercase().as_str() {
        "montecarlo" | "monte-carlo" | "monte_carlo" => SimulationMode::MonteCarlo,
        "pessimistic" => SimulationMode::Pessimistic,
        "optimistic" => SimulationMode::Optimistic,
        _ => SimulationMode::Simple,
    }
}

/// Loosely-typed JSON surface: numeric fields may arrive as numbers or
/// numeric strings; anything uncoercible falls back to the documented
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    #[serde(deserialize_with = "lenient_f64")]
    initial_investment: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    monthly_contribution: Option<f64>,
    #[serde(alias = "timeHorizonYears", deserialize_with = "lenient_u32")]
    time_horizon: Option<u32>,
    #[serde(deserialize_with = "lenient_allocations")]
    asset_allocations: Option<BTreeMap<String, f64>>,
    #[serde(deserialize_with = "lenient_bool")]
    include_inflation: Option<bool>,
    #[serde(deserialize_with = "lenient_f64")]
    inflation_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_bool")]
    include_rebalancing: Option<bool>,
    #[serde(
        alias = "rebalancingFrequencyMonths",
        deserialize_with = "lenient_u32"
    )]
    rebalancing_frequency: Option<u32>,
    simulation_mode: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    trials: Option<u32>,
    #[serde(deserialize_with = "lenient_u64")]
    seed: Option<u64>,
}

fn coerce_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_f64)
        .filter(|v| v.is_finite() && (0.0..=u32::MAX as f64).contains(v))
        .map(|v| v as u32))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }))
}

fn lenient_allocations<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(value.map(|entries| {
        entries
            .into_iter()
            .map(|(asset, raw)| (asset, coerce_f64(&raw).unwrap_or(0.0)))
            .collect()
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    scenarios: Vec<SimulatePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptimizePayload {
    risk_tolerance: Option<String>,
    time_horizon: Option<u32>,
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct RunResponse {
    success: bool,
    result: SimulationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonSummary {
    max_final_value: f64,
    min_final_value: f64,
    average_final_value: f64,
    total_scenarios: usize,
}

#[derive(Debug, Serialize)]
struct CompareResponse {
    success: bool,
    scenarios: Vec<SimulationResult>,
    comparison: ComparisonSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeResponse {
    success: bool,
    optimal_allocation: BTreeMap<String, f64>,
    projected_result: SimulationResult,
    risk_level: RiskTolerance,
    rationale: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Parser, Debug)]
#[command(
    name = "portsim",
    about = "Portfolio projection and Monte Carlo simulation engine"
)]
pub struct Cli {
    #[arg(long, default_value_t = 10_000.0)]
    initial_investment: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_contribution: f64,
    #[arg(long, default_value_t = 10, help = "Projection horizon in years")]
    time_horizon: u32,
    #[arg(
        long,
        default_value = "stocks=60,bonds=30,cash=10",
        help = "Comma-separated asset=percent pairs; percents must sum to 100"
    )]
    allocation: String,
    #[arg(long, help = "Skip the inflation adjustment on real values")]
    no_inflation: bool,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(long, help = "Let allocations drift instead of rebalancing")]
    no_rebalancing: bool,
    #[arg(
        long,
        default_value_t = 12,
        help = "Months between rebalances; sub-annual cadences rebalance every year"
    )]
    rebalancing_frequency: u32,
    #[arg(long, value_enum, default_value_t = CliSimulationMode::Simple)]
    mode: CliSimulationMode,
    #[arg(long, default_value_t = DEFAULT_TRIALS, help = "Monte Carlo trial count")]
    trials: u32,
    #[arg(long, help = "Monte Carlo seed; omit for a random run")]
    seed: Option<u64>,
}

fn parse_allocations(arg: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut allocations = BTreeMap::new();
    for pair in arg.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((asset, percent)) = pair.split_once('=') else {
            return Err(format!("expected asset=percent, got '{pair}'"));
        };
        let percent: f64 = percent
            .trim()
            .parse()
            .map_err(|_| format!("invalid percentage '{}' for '{}'", percent.trim(), asset))?;
        allocations.insert(asset.trim().to_string(), percent);
    }
    Ok(allocations)
}

fn build_request(cli: Cli) -> Result<SimulationRequest, String> {
    let asset_allocations = parse_allocations(&cli.allocation)?;

    Ok(SimulationRequest {
        initial_investment: cli.initial_investment,
        monthly_contribution: cli.monthly_contribution,
        time_horizon_years: cli.time_horizon,
        asset_allocations,
        include_inflation: !cli.no_inflation,
        inflation_rate: cli.inflation_rate,
        include_rebalancing: !cli.no_rebalancing,
        rebalancing_frequency_months: cli.rebalancing_frequency,
        simulation_mode: cli.mode.into(),
        trials: cli.trials,
        seed: cli.seed,
    })
}

pub fn run_cli(cli: Cli) -> Result<SimulationResult, String> {
    let request = build_request(cli)?;
    run_simulation(&request).map_err(|e| e.to_string())
}

fn request_from_payload(payload: SimulatePayload) -> SimulationRequest {
    let mut request = SimulationRequest::default();

    if let Some(v) = payload.initial_investment {
        request.initial_investment = v;
    }
    if let Some(v) = payload.monthly_contribution {
        request.monthly_contribution = v;
    }
    if let Some(v) = payload.time_horizon {
        request.time_horizon_years = v;
    }
    if let Some(v) = payload.asset_allocations {
        request.asset_allocations = v;
    }
    if let Some(v) = payload.include_inflation {
        request.include_inflation = v;
    }
    if let Some(v) = payload.inflation_rate {
        request.inflation_rate = v;
    }
    if let Some(v) = payload.include_rebalancing {
        request.include_rebalancing = v;
    }
    if let Some(v) = payload.rebalancing_frequency {
        request.rebalancing_frequency_months = v;
    }
    if let Some(v) = payload.simulation_mode {
        request.simulation_mode = parse_simulation_mode(&v);
    }
    if let Some(v) = payload.trials {
        request.trials = v;
    }
    if let Some(v) = payload.seed {
        request.seed = Some(v);
    }

    request
}

fn comparison_summary(results: &[SimulationResult]) -> ComparisonSummary {
    let max_final_value = results.iter().map(|r| r.final_value).fold(0.0, f64::max);
    let min_final_value = results
        .iter()
        .map(|r| r.final_value)
        .fold(f64::INFINITY, f64::min);

    ComparisonSummary {
        max_final_value,
        min_final_value: if results.is_empty() {
            0.0
        } else {
            min_final_value
        },
        average_final_value: if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.final_value).sum::<f64>() / results.len() as f64
        },
        total_scenarios: results.len(),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/simulator/health", get(health_handler))
        .route("/api/simulator/run", post(run_handler))
        .route("/api/simulator/compare", post(compare_handler))
        .route("/api/simulator/optimize", post(optimize_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("simulator API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            service: "Investment Simulator API",
            status: "UP",
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn run_handler(Json(payload): Json<SimulatePayload>) -> Response {
    let request = request_from_payload(payload);
    match run_simulation(&request) {
        Ok(result) => json_response(
            StatusCode::OK,
            RunResponse {
                success: true,
                result,
            },
        ),
        Err(err) => failure_response(&err),
    }
}

async fn compare_handler(Json(payload): Json<ComparePayload>) -> Response {
    if payload.scenarios.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "At least one scenario is required");
    }

    let mut results = Vec::with_capacity(payload.scenarios.len());
    for scenario in payload.scenarios {
        let request = request_from_payload(scenario);
        match run_simulation(&request) {
            Ok(result) => results.push(result),
            Err(err) => return failure_response(&err),
        }
    }

    let comparison = comparison_summary(&results);
    json_response(
        StatusCode::OK,
        CompareResponse {
            success: true,
            scenarios: results,
            comparison,
        },
    )
}

async fn optimize_handler(Json(payload): Json<OptimizePayload>) -> Response {
    let risk_level = payload
        .risk_tolerance
        .as_deref()
        .map(RiskTolerance::from_api_str)
        .unwrap_or(RiskTolerance::Moderate);
    let optimal_allocation = risk_level.allocation_menu();

    let request = SimulationRequest {
        initial_investment: payload.initial_investment.unwrap_or(10_000.0),
        monthly_contribution: payload.monthly_contribution.unwrap_or(500.0),
        time_horizon_years: payload.time_horizon.unwrap_or(10),
        asset_allocations: optimal_allocation.clone(),
        ..SimulationRequest::default()
    };

    match run_simulation(&request) {
        Ok(result) => json_response(
            StatusCode::OK,
            OptimizeResponse {
                success: true,
                optimal_allocation,
                projected_result: result,
                risk_level,
                rationale: risk_level.rationale(),
            },
        ),
        Err(err) => failure_response(&err),
    }
}

fn failure_response(err: &SimulationError) -> Response {
    let status = match err {
        SimulationError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        SimulationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(%err, "simulation request rejected");
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            success: false,
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<SimulationRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(request_from_payload(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_payload_gets_full_defaults() {
        let request = api_request_from_json("{}").expect("json should parse");
        assert_approx(request.initial_investment, 10_000.0);
        assert_approx(request.monthly_contribution, 0.0);
        assert_eq!(request.time_horizon_years, 10);
        assert_eq!(request.asset_allocations.len(), 3);
        assert_approx(request.asset_allocations["stocks"], 60.0);
        assert_approx(request.asset_allocations["bonds"], 30.0);
        assert_approx(request.asset_allocations["cash"], 10.0);
        assert!(request.include_inflation);
        assert_approx(request.inflation_rate, 3.0);
        assert!(request.include_rebalancing);
        assert_eq!(request.rebalancing_frequency_months, 12);
        assert_eq!(request.simulation_mode, SimulationMode::Simple);
        assert_eq!(request.trials, DEFAULT_TRIALS);
        assert_eq!(request.seed, None);
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "initialInvestment": 50000,
          "monthlyContribution": 750,
          "timeHorizon": 25,
          "assetAllocations": {"stocks": 80, "bonds": 20},
          "includeInflation": false,
          "includeRebalancing": false,
          "simulationMode": "montecarlo",
          "trials": 500,
          "seed": 99
        }"#;
        let request = api_request_from_json(json).expect("json should parse");

        assert_approx(request.initial_investment, 50_000.0);
        assert_approx(request.monthly_contribution, 750.0);
        assert_eq!(request.time_horizon_years, 25);
        assert_eq!(request.asset_allocations.len(), 2);
        assert!(!request.include_inflation);
        assert!(!request.include_rebalancing);
        assert_eq!(request.simulation_mode, SimulationMode::MonteCarlo);
        assert_eq!(request.trials, 500);
        assert_eq!(request.seed, Some(99));
    }

    #[test]
    fn numeric_strings_coerce_and_garbage_falls_back_to_defaults() {
        let json = r#"{
          "initialInvestment": "25000",
          "monthlyContribution": "not a number",
          "timeHorizon": "15",
          "includeInflation": "false",
          "includeRebalancing": "TRUE",
          "assetAllocations": {"stocks": "70", "bonds": 30, "cash": []},
          "trials": 250.9,
          "seed": "17"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");

        assert_approx(request.initial_investment, 25_000.0);
        // Uncoercible value falls back to the default, not an error.
        assert_approx(request.monthly_contribution, 0.0);
        assert_eq!(request.time_horizon_years, 15);
        assert!(!request.include_inflation);
        assert!(request.include_rebalancing);
        assert_approx(request.asset_allocations["stocks"], 70.0);
        assert_approx(request.asset_allocations["bonds"], 30.0);
        assert_approx(request.asset_allocations["cash"], 0.0);
        assert_eq!(request.trials, 250);
        assert_eq!(request.seed, Some(17));
    }

    #[test]
    fn simulation_mode_string_parsing_is_lenient() {
        assert_eq!(parse_simulation_mode("simple"), SimulationMode::Simple);
        assert_eq!(
            parse_simulation_mode("MonteCarlo"),
            SimulationMode::MonteCarlo
        );
        assert_eq!(
            parse_simulation_mode("monte-carlo"),
            SimulationMode::MonteCarlo
        );
        assert_eq!(
            parse_simulation_mode("PESSIMISTIC"),
            SimulationMode::Pessimistic
        );
        assert_eq!(
            parse_simulation_mode("optimistic"),
            SimulationMode::Optimistic
        );
        assert_eq!(parse_simulation_mode("nonsense"), SimulationMode::Simple);
        assert_eq!(parse_simulation_mode(""), SimulationMode::Simple);
    }

    #[test]
    fn risk_tolerance_parsing_defaults_to_moderate() {
        assert_eq!(
            RiskTolerance::from_api_str("Conservative"),
            RiskTolerance::Conservative
        );
        assert_eq!(
            RiskTolerance::from_api_str("AGGRESSIVE"),
            RiskTolerance::Aggressive
        );
        assert_eq!(
            RiskTolerance::from_api_str("moderate"),
            RiskTolerance::Moderate
        );
        assert_eq!(
            RiskTolerance::from_api_str("yolo"),
            RiskTolerance::Moderate
        );
    }

    #[test]
    fn allocation_menus_sum_to_one_hundred() {
        for risk in [
            RiskTolerance::Conservative,
            RiskTolerance::Moderate,
            RiskTolerance::Aggressive,
        ] {
            let total: f64 = risk.allocation_menu().values().sum();
            assert_approx(total, 100.0);
        }
    }

    #[test]
    fn parse_allocations_accepts_pairs_with_whitespace() {
        let allocations =
            parse_allocations("stocks=60, bonds = 30 ,cash=10").expect("should parse");
        assert_eq!(allocations.len(), 3);
        assert_approx(allocations["stocks"], 60.0);
        assert_approx(allocations["bonds"], 30.0);
        assert_approx(allocations["cash"], 10.0);
    }

    #[test]
    fn parse_allocations_rejects_malformed_pairs() {
        let err = parse_allocations("stocks:60").expect_err("must reject missing '='");
        assert!(err.contains("asset=percent"));

        let err = parse_allocations("stocks=lots").expect_err("must reject non-numeric percent");
        assert!(err.contains("invalid percentage"));
    }

    #[test]
    fn cli_defaults_build_the_default_request() {
        let cli = Cli::parse_from(["portsim"]);
        let request = build_request(cli).expect("defaults should build");
        assert_eq!(request, SimulationRequest::default());
    }

    #[test]
    fn cli_flags_disable_inflation_and_rebalancing() {
        let cli = Cli::parse_from([
            "portsim",
            "--no-inflation",
            "--no-rebalancing",
            "--mode",
            "monte-carlo",
            "--trials",
            "200",
            "--seed",
            "5",
        ]);
        let request = build_request(cli).expect("should build");
        assert!(!request.include_inflation);
        assert!(!request.include_rebalancing);
        assert_eq!(request.simulation_mode, SimulationMode::MonteCarlo);
        assert_eq!(request.trials, 200);
        assert_eq!(request.seed, Some(5));
    }

    #[test]
    fn run_cli_surfaces_validation_errors() {
        let cli = Cli::parse_from(["portsim", "--allocation", "stocks=55,bonds=30"]);
        let err = run_cli(cli).expect_err("85% allocation must fail");
        assert!(err.contains("sum to 100"));
    }

    #[test]
    fn comparison_summary_tracks_extremes_and_average() {
        let conservative = request_for_scenario(5);
        let aggressive = request_for_scenario(20);
        let results = vec![
            run_simulation(&conservative).expect("valid request"),
            run_simulation(&aggressive).expect("valid request"),
        ];

        let summary = comparison_summary(&results);
        assert_eq!(summary.total_scenarios, 2);
        assert_approx(
            summary.max_final_value,
            results[0].final_value.max(results[1].final_value),
        );
        assert_approx(
            summary.min_final_value,
            results[0].final_value.min(results[1].final_value),
        );
        assert_approx(
            summary.average_final_value,
            (results[0].final_value + results[1].final_value) / 2.0,
        );
    }

    fn request_for_scenario(years: u32) -> SimulationRequest {
        SimulationRequest {
            time_horizon_years: years,
            ..SimulationRequest::default()
        }
    }

    #[test]
    fn run_response_serializes_with_expected_fields() {
        let result = run_simulation(&SimulationRequest::default()).expect("valid request");
        let json = serde_json::to_string(&RunResponse {
            success: true,
            result,
        })
        .expect("response should serialize");

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"finalValue\""));
        assert!(json.contains("\"totalContributions\""));
        assert!(json.contains("\"yearlyProjections\""));
        assert!(json.contains("\"finalAssetBreakdown\""));
        assert!(json.contains("\"bestCaseValue\""));
        assert!(json.contains("\"sharpeRatio\""));
        assert!(json.contains("\"maxDrawdown\""));
        assert!(json.contains("\"simulationMode\":\"simple\""));
        // Simple mode carries no success probability.
        assert!(!json.contains("probabilityOfSuccess"));
    }

    #[test]
    fn monte_carlo_response_includes_probability() {
        let request = SimulationRequest {
            simulation_mode: SimulationMode::MonteCarlo,
            trials: 64,
            seed: Some(1),
            ..SimulationRequest::default()
        };
        let result = run_simulation(&request).expect("valid request");
        let json = serde_json::to_string(&result).expect("result should serialize");
        assert!(json.contains("\"probabilityOfSuccess\""));
        assert!(json.contains("\"simulationMode\":\"monte-carlo\""));
    }

    #[test]
    fn error_envelope_serializes_with_success_false() {
        let json = serde_json::to_string(&ErrorResponse {
            success: false,
            error: "asset allocations must sum to 100%".to_string(),
        })
        .expect("should serialize");
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\""));
    }

    #[test]
    fn optimize_response_echoes_risk_level_and_rationale() {
        let risk = RiskTolerance::Aggressive;
        let request = SimulationRequest {
            asset_allocations: risk.allocation_menu(),
            monthly_contribution: 500.0,
            ..SimulationRequest::default()
        };
        let result = run_simulation(&request).expect("menus are valid allocations");
        let json = serde_json::to_string(&OptimizeResponse {
            success: true,
            optimal_allocation: risk.allocation_menu(),
            projected_result: result,
            risk_level: risk,
            rationale: risk.rationale(),
        })
        .expect("should serialize");

        assert!(json.contains("\"riskLevel\":\"aggressive\""));
        assert!(json.contains("\"optimalAllocation\""));
        assert!(json.contains("\"projectedResult\""));
        assert!(json.contains("\"rationale\""));
    }
}
