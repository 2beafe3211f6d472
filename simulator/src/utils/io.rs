use dgpe_common::TomlParameters;

use super::error::RuntimeError;
use crate::simulation_object::SimulationParameters;

/// Expands a toml file into one set of parameters per stream.
///
/// With `[sampling]` present every seed becomes its own stream named
/// `{sim_name}-stream{seed:05}`. Without it a single unseeded stream
/// carrying `sim_name` is returned.
pub fn parameters_from_toml(
    toml: TomlParameters,
) -> Result<Vec<SimulationParameters>, RuntimeError> {
    let seeds: Vec<u64> = toml
        .sampling
        .as_ref()
        .map(|sp| sp.seeds.clone())
        .unwrap_or_default();

    if seeds.is_empty() {
        return Ok(vec![SimulationParameters::from_toml(&toml, None)?]);
    }

    seeds
        .into_iter()
        .map(|seed| SimulationParameters::from_toml(&toml, Some(seed)))
        .collect()
}
