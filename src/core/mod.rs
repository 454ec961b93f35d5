pub mod allocation;
pub mod assets;
pub mod engine;
pub mod stats;
pub mod types;

pub use assets::{AssetClassParams, AssetReturnModel, historical_model};
pub use engine::{run_simulation, run_simulation_with_model, validate_request};
pub use types::{
    DEFAULT_TRIALS, SimulationError, SimulationMode, SimulationRequest, SimulationResult,
    SimulationStatistics, YearlyProjection,
};
