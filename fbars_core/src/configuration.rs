//! Configuration values for building a flux balance model and for the solver
use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metabolic_model::reaction::ExchangeLevel;

/// Upper bound given to every built reaction unless configured otherwise
pub const DEFAULT_UPPER_BOUND: f64 = 100.0;

/// (lower, upper) multipliers used to turn a target flux into bounds
pub const DEFAULT_TOLERANCE: (f64, f64) = (0.95, 1.0);

/// Settings passed to the solver backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfiguration {
    /// Which backend solves the optimization problems
    pub solver: SolverKind,
    /// Feasibility and optimality tolerance
    pub tolerance: f64,
    /// Wall clock limit for a single solve, in seconds
    pub time_limit: Option<f64>,
    /// Iteration limit for a single solve
    pub max_iterations: u32,
    /// Whether the backend prints its own progress output
    pub verbose: bool,
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        SolverConfiguration {
            solver: SolverKind::Clarabel,
            tolerance: 1e-07,
            time_limit: None,
            max_iterations: 200,
            verbose: false,
        }
    }
}

/// Enum used to specify the solver to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Use the Clarabel interior point solver (linear and quadratic objectives)
    #[default]
    Clarabel,
    /// Use the microlp simplex solver (linear objectives only), requires the minilp feature
    Microlp,
}

/// Declarative construction input for [`crate::fba::Fba`]
///
/// Either `model_path` points at a complete model file, or the model is described by
/// `stoichiometry`, `reversible`, `objective` and `external_molecules`. The remaining fields
/// apply to both.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use fbars_core::configuration::FbaConfigBuilder;
/// let config = FbaConfigBuilder::default()
///     .stoichiometry(IndexMap::from([(
///         "growth".to_string(),
///         IndexMap::from([("glc".to_string(), -1.)]),
///     )]))
///     .objective(IndexMap::from([("growth".to_string(), 1.)]))
///     .external_molecules(vec!["glc".to_string()])
///     .default_upper_bound(10.)
///     .build()
///     .unwrap();
/// assert_eq!(config.default_tolerance, (0.95, 1.0));
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct FbaConfig {
    /// Path to a COBRA JSON model, exclusive with `stoichiometry`
    #[builder(setter(into, strip_option))]
    pub model_path: Option<PathBuf>,
    /// Reaction id to {metabolite id: coefficient}
    pub stoichiometry: IndexMap<String, IndexMap<String, f64>>,
    /// Ids of reactions allowed to run backwards
    pub reversible: Vec<String>,
    /// Reaction id to objective weight
    pub objective: IndexMap<String, f64>,
    /// Molecules which get an exchange reaction
    pub external_molecules: Vec<String>,
    /// Explicit (lower, upper) bounds for reactions, in external units
    pub flux_bounds: IndexMap<String, (f64, f64)>,
    /// Default exchange level per external molecule
    pub exchange_bounds: IndexMap<String, ExchangeLevel>,
    /// Molecular weight (g/mol) per metabolite
    pub molecular_weights: IndexMap<String, f64>,
    pub default_upper_bound: f64,
    /// (lower, upper) multipliers used when no reaction specific tolerance is set
    pub default_tolerance: (f64, f64),
    /// Reaction specific (lower, upper) multipliers
    pub tolerance: IndexMap<String, (f64, f64)>,
    /// Mass (fg) the objective should add per unit time, calibrates the flux scaling
    #[builder(setter(into, strip_option))]
    pub target_added_mass: Option<f64>,
    /// Re-optimize with minimal adjustment from the previous solution
    pub moma: bool,
    pub solver: SolverConfiguration,
}

impl Default for FbaConfig {
    fn default() -> Self {
        FbaConfig {
            model_path: None,
            stoichiometry: IndexMap::new(),
            reversible: Vec::new(),
            objective: IndexMap::new(),
            external_molecules: Vec::new(),
            flux_bounds: IndexMap::new(),
            exchange_bounds: IndexMap::new(),
            molecular_weights: IndexMap::new(),
            default_upper_bound: DEFAULT_UPPER_BOUND,
            default_tolerance: DEFAULT_TOLERANCE,
            tolerance: IndexMap::new(),
            target_added_mass: None,
            moma: false,
            solver: SolverConfiguration::default(),
        }
    }
}

impl FbaConfig {
    /// Parse a configuration from a JSON string, missing fields take their defaults
    pub fn from_json_str(config: &str) -> Result<FbaConfig, ConfigError> {
        Ok(serde_json::from_str(config)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<FbaConfig, ConfigError> {
        let config = fs::read_to_string(path)?;
        FbaConfig::from_json_str(&config)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read configuration file")]
    UnableToRead(#[from] std::io::Error),
    #[error("Unable to parse configuration: {0}")]
    UnableToParse(#[from] serde_json::Error),
}
