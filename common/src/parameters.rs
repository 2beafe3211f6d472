use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    constants::*,
    error::CommonError,
    ics::{DissipationParameters, InitialConditions, PotentialParameters, Scheme},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlParameters {
    /// Name of simulation (used for stream names)
    pub sim_name: String,
    /// Time step
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Uniform dissipation in the bulk
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Fail with an error as soon as a step produces NaN or Inf
    #[serde(default = "default_true")]
    pub check_finite: bool,
    /// Grid Parameters
    pub grid: GridParameters,
    /// Initial Conditions
    pub initial_conditions: InitialConditions,
    /// External potential (defaults to zero)
    pub potential: Option<PotentialParameters>,
    /// Spatially varying dissipation (defaults to uniform `gamma`)
    pub dissipation: Option<DissipationParameters>,
    /// What to run
    #[serde(default)]
    pub run: RunParameters,
    /// Vortex extraction parameters
    #[serde(default)]
    pub defects: DefectParameters,
    /// Sampling Parameters
    pub sampling: Option<TomlSamplingParameters>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridParameters {
    /// Number of grid cells per axis. Its length is the dimension of the system.
    pub resolution: Vec<usize>,
    /// Cell size per axis (defaults to 1)
    pub spacing: Option<Vec<f64>>,
    /// Lower corner of the box (defaults to the origin)
    pub origin: Option<Vec<f64>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunParameters {
    /// Imaginary-time relaxation steps taken before the evolution
    #[serde(default)]
    pub relax_steps: usize,
    /// Real-time steps
    #[serde(default)]
    pub steps: usize,
    /// Must stay ETD4RK when `comoving_velocity` is set
    #[serde(default)]
    pub scheme: Scheme,
    /// If set, evolve in the frame comoving with a stirrer moving along x
    pub comoving_velocity: Option<f64>,
}

impl Default for RunParameters {
    fn default() -> Self {
        RunParameters {
            relax_steps: 0,
            steps: 0,
            scheme: Scheme::default(),
            comoving_velocity: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefectParameters {
    #[serde(default = "default_charge_tolerance")]
    pub charge_tolerance: f64,
    #[serde(default = "default_ball_radius")]
    pub ball_radius: f64,
}

impl Default for DefectParameters {
    fn default() -> Self {
        DefectParameters {
            charge_tolerance: DEFAULT_CHARGE_TOLERANCE,
            ball_radius: DEFAULT_BALL_RADIUS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlSamplingParameters {
    #[serde(deserialize_with = "deserialize_seeds")]
    pub seeds: Vec<u64>,
}

/// This function reads toml files
pub fn read_toml(path: &str) -> Result<TomlParameters, CommonError> {
    // Read toml config file
    let toml_contents: &str =
        &std::fs::read_to_string(path).map_err(|_| CommonError::TomlReadError {
            path: path.to_string(),
        })?;

    parse_toml(toml_contents)
}

/// Parses the contents of a toml file
pub fn parse_toml(toml_contents: &str) -> Result<TomlParameters, CommonError> {
    toml::from_str(toml_contents).map_err(|e| CommonError::TomlParseError {
        msg: format!("{e}"),
    })
}

fn deserialize_seeds<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let parsed_string = String::deserialize(deserializer)?;
    parse_seeds(&parsed_string).map_err(serde::de::Error::custom)
}

/// Accepts `low..=high`, `low to high`, or a comma separated list (optionally bracketed).
///
/// NOTE: this compiles the regex internally,
/// so if we ever use this multiple times it will be slow/inefficient.
pub fn parse_seeds(s: &str) -> Result<Vec<u64>, CommonError> {
    let invalid = |msg: &str| CommonError::InvalidSeeds {
        msg: format!("{msg} (got {s:?})"),
    };
    let range_inclusive = Regex::new(r"^\s*(\d+)\s*\.\.=\s*(\d+)\s*$")
        .map_err(|e| invalid(&e.to_string()))?;
    let range_to = Regex::new(r"^\s*(\d+)\s+to\s+(\d+)\s*$").map_err(|e| invalid(&e.to_string()))?;
    let list = Regex::new(r"^\s*\[?\s*\d+(\s*,\s*\d+)*\s*,?\s*\]?\s*$")
        .map_err(|e| invalid(&e.to_string()))?;
    let digits = Regex::new(r"\d+").map_err(|e| invalid(&e.to_string()))?;

    let parse = |m: &str| {
        m.parse::<u64>()
            .map_err(|_| invalid("seed does not fit in a u64"))
    };

    if let Some(caps) = range_inclusive
        .captures(s)
        .or_else(|| range_to.captures(s))
    {
        // Get start and end points
        let start = parse(&caps[1])?;
        let end = parse(&caps[2])?;
        if start > end {
            return Err(invalid("empty seed range"));
        }
        return Ok((start..=end).collect());
    }

    if list.is_match(s) {
        return digits.find_iter(s).map(|m| parse(m.as_str())).collect();
    }

    Err(invalid(
        "seeds did not match expected patterns: low..=high, low to high, [s1, s2, s3]",
    ))
}

fn default_dt() -> f64 {
    DEFAULT_DT
}

fn default_gamma() -> f64 {
    DEFAULT_GAMMA
}

fn default_true() -> bool {
    true
}

fn default_charge_tolerance() -> f64 {
    DEFAULT_CHARGE_TOLERANCE
}

fn default_ball_radius() -> f64 {
    DEFAULT_BALL_RADIUS
}

#[test]
fn test_regex_range_inclusive() {
    let sample = "0..=55";
    let seeds = parse_seeds(sample).unwrap();
    assert_eq!(seeds, (0..=55).collect::<Vec<u64>>());
}

#[test]
fn test_regex_to() {
    let sample = "0 to 55";
    let seeds = parse_seeds(sample).unwrap();
    assert_eq!(seeds, (0..=55).collect::<Vec<u64>>());
}

#[test]
fn test_regex_comma_separated() {
    let sample = "[1, 3]";
    let seeds = parse_seeds(sample).unwrap();
    assert_eq!(seeds, vec![1, 3]);

    let sample = "1, 3";
    let seeds = parse_seeds(sample).unwrap();
    assert_eq!(seeds, vec![1, 3]);
}

#[test]
fn test_regex_rejects_garbage() {
    assert!(parse_seeds("one to three").is_err());
    assert!(parse_seeds("5..=2").is_err());
}

#[cfg(test)]
const MINIMAL_TOML: &str = r#"
sim_name = "relax"

[grid]
resolution = [32, 32]

[initial_conditions]
type = "Disordered"
"#;

#[test]
fn test_minimal_toml_uses_defaults() {
    let toml = parse_toml(MINIMAL_TOML).unwrap();
    assert_eq!(toml.dt, DEFAULT_DT);
    assert_eq!(toml.gamma, DEFAULT_GAMMA);
    assert!(toml.check_finite);
    assert_eq!(toml.grid.resolution, vec![32, 32]);
    assert_eq!(
        toml.initial_conditions,
        InitialConditions::Disordered {
            noise_strength: DEFAULT_NOISE_STRENGTH
        }
    );
    assert_eq!(toml.run, RunParameters::default());
    assert_eq!(toml.defects, DefectParameters::default());
    assert!(toml.potential.is_none());
    assert!(toml.sampling.is_none());
}

#[test]
fn test_full_toml() {
    let contents = r#"
sim_name = "stirred"
dt = 0.05
gamma = 0.02

[grid]
resolution = [64, 48]
spacing = [0.5, 0.5]

[initial_conditions]
type = "ThomasFermi"

[potential]
type = "GaussianStirrer"
size = 4.0
strength = 2.0
position = [10.0, 12.0]

[dissipation]
type = "Frame"
wx = 12.0
wy = 9.0

[run]
relax_steps = 100
steps = 500
scheme = "Etd2rk"
comoving_velocity = 0.6

[defects]
charge_tolerance = 0.3

[sampling]
seeds = "3 to 5"
"#;
    let toml = parse_toml(contents).unwrap();
    assert_eq!(toml.grid.spacing, Some(vec![0.5, 0.5]));
    assert_eq!(toml.initial_conditions, InitialConditions::ThomasFermi);
    assert_eq!(
        toml.potential,
        Some(PotentialParameters::GaussianStirrer {
            size: 4.0,
            strength: 2.0,
            position: vec![10.0, 12.0]
        })
    );
    assert_eq!(
        toml.dissipation,
        Some(DissipationParameters::Frame {
            d: DEFAULT_FRAME_WIDTH,
            wx: 12.0,
            wy: 9.0,
            wz: 0.0
        })
    );
    assert_eq!(toml.run.scheme, Scheme::Etd2rk);
    assert_eq!(toml.run.comoving_velocity, Some(0.6));
    assert_eq!(toml.defects.charge_tolerance, 0.3);
    assert_eq!(toml.defects.ball_radius, DEFAULT_BALL_RADIUS);
    assert_eq!(toml.sampling.unwrap().seeds, vec![3, 4, 5]);
}

#[test]
fn test_unknown_keys_are_rejected() {
    let contents = format!("{MINIMAL_TOML}\n[run]\nstep = 10\n");
    assert!(matches!(
        parse_toml(&contents),
        Err(CommonError::TomlParseError { .. })
    ));

    let contents = MINIMAL_TOML.replace("sim_name", "dissipation_factor = 0.5\nsim_name");
    assert!(parse_toml(&contents).is_err());
}
