//! The flux balance façade: owns a [`Model`] together with the flux scaling, tolerance table
//! and latest [`Solution`], and exposes bound management, optimization and readouts.
//!
//! Bound values crossing into the façade are in external units and are divided by the flux
//! scaling before being written to the model; fluxes read out are multiplied by it.
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::configuration::{ConfigError, FbaConfig, SolverConfiguration, DEFAULT_UPPER_BOUND};
use crate::io::json::JsonError;
use crate::metabolic_model::builder::{build_model, exchange_reaction_id, extract_model};
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::ExchangeLevel;
use crate::optimize::flux_analysis::{self, Solution};
use crate::optimize::solvers::{solver_from_configuration, Solver, SolverError};

pub mod bounds;
pub mod guard;
pub mod results;
pub mod scaling;

pub use bounds::ToleranceTable;
pub use guard::BoundsGuard;
pub use scaling::FluxScaling;

/// Flux balance analysis of one model
#[derive(Debug)]
pub struct Fba {
    model: Model,
    solver: Box<dyn Solver>,
    solver_configuration: SolverConfiguration,
    /// Reactions allowed to run backwards when switched back on
    reversible: IndexSet<String>,
    /// External molecule to the id of its exchange reaction
    exchange_reactions: IndexMap<String, String>,
    /// Default exchange level per external molecule
    exchange_bounds: IndexMap<String, ExchangeLevel>,
    /// Explicit (lower, upper) bounds per reaction, external units
    flux_bounds: IndexMap<String, (f64, f64)>,
    molecular_weights: IndexMap<String, f64>,
    default_upper_bound: f64,
    tolerance: ToleranceTable,
    scaling: FluxScaling,
    moma: bool,
    solution: Option<Solution>,
}

impl Fba {
    /// Build the model described by the configuration, either from `model_path` or from the
    /// stoichiometric specification, apply the configured bounds, optimize once, and calibrate
    /// the flux scaling if `target_added_mass` is set
    ///
    /// An infeasible initial optimization is logged and leaves no solution; it is only an
    /// error if the flux scaling needs calibrating.
    pub fn new(config: FbaConfig) -> Result<Fba, FbaError> {
        let model = match &config.model_path {
            Some(path) => {
                if !config.stoichiometry.is_empty() {
                    return Err(ModelError::Configuration(
                        "model_path and stoichiometry are mutually exclusive".to_string(),
                    )
                    .into());
                }
                Model::read_json(path)?
            }
            None => build_model(
                &config.stoichiometry,
                &config.reversible,
                &config.objective,
                &config.external_molecules,
                config.default_upper_bound,
            )?,
        };
        let from_file = config.model_path.is_some();
        Fba::assemble(model, config, from_file)
    }

    /// Wrap an already built model, extracting its stoichiometry, exchanges, bounds and
    /// molecular weights
    ///
    /// Exchange bounds, flux bounds and molecular weights given in the configuration take
    /// precedence over the extracted ones. The stoichiometric fields of the configuration
    /// are ignored.
    pub fn from_model(model: Model, config: FbaConfig) -> Result<Fba, FbaError> {
        Fba::assemble(model, config, true)
    }

    fn assemble(mut model: Model, config: FbaConfig, extract: bool) -> Result<Fba, FbaError> {
        let solver = solver_from_configuration(&config.solver)?;
        let (reversible, exchange_reactions, exchange_bounds, flux_bounds, molecular_weights) =
            if extract {
                let mut extracted = extract_model(&model)?;
                extracted.exchange_bounds.extend(config.exchange_bounds);
                extracted.flux_bounds.extend(config.flux_bounds);
                extracted.molecular_weights.extend(config.molecular_weights);
                (
                    extracted.reversible.into_iter().collect(),
                    extracted.exchange_reactions,
                    extracted.exchange_bounds,
                    extracted.flux_bounds,
                    extracted.molecular_weights,
                )
            } else {
                let exchange_reactions = config
                    .external_molecules
                    .iter()
                    .map(|molecule| (molecule.clone(), exchange_reaction_id(molecule)))
                    .collect();
                (
                    config.reversible.into_iter().collect(),
                    exchange_reactions,
                    config.exchange_bounds,
                    config.flux_bounds,
                    config.molecular_weights,
                )
            };

        // Targets for exchanges with a configured level are given uptake positive
        for (molecule, reaction_id) in &exchange_reactions {
            if exchange_bounds.contains_key(molecule) {
                if let Some(reaction) = model.reaction_mut(reaction_id) {
                    reaction.mark_external_flux_reversed();
                }
            }
        }

        let mut fba = Fba {
            model,
            solver,
            solver_configuration: config.solver,
            reversible,
            exchange_reactions,
            exchange_bounds,
            flux_bounds,
            molecular_weights,
            default_upper_bound: if extract {
                DEFAULT_UPPER_BOUND
            } else {
                config.default_upper_bound
            },
            tolerance: ToleranceTable::new(config.default_tolerance, config.tolerance),
            scaling: FluxScaling::default(),
            moma: config.moma,
            solution: None,
        };

        let flux_bounds = fba.flux_bounds.clone();
        fba.constrain_reaction_bounds(&flux_bounds)?;
        fba.set_exchange_bounds(&IndexMap::new())?;

        match fba.optimize() {
            Ok(objective) => tracing::debug!(
                component = "fba",
                operation = "new",
                objective,
                "Initial optimization finished"
            ),
            Err(FbaError::InfeasibleModel) => tracing::warn!(
                component = "fba",
                operation = "new",
                "Model is infeasible under the configured bounds"
            ),
            Err(err) => return Err(err),
        }

        if let Some(target) = config.target_added_mass {
            fba.set_target(target)?;
        }
        Ok(fba)
    }

    /// Optimize the model under its current bounds
    ///
    /// With minimal adjustment enabled and a previous solution available, finds the flux
    /// distribution closest to that solution instead of maximizing the objective.
    ///
    /// # Returns
    /// The objective value in external units. An infeasible model clears the stored
    /// solution and returns `FbaError::InfeasibleModel`.
    pub fn optimize(&mut self) -> Result<f64, FbaError> {
        let result = match (&self.solution, self.moma) {
            (Some(previous), true) => {
                flux_analysis::moma(&self.model, self.solver.as_ref(), previous)
            }
            _ => flux_analysis::fba(&self.model, self.solver.as_ref()),
        };
        match result {
            Ok(solution) => {
                tracing::debug!(
                    component = "fba",
                    operation = "optimize",
                    solver = self.solver.name(),
                    moma = self.moma,
                    status = ?solution.status(),
                    "Optimized model"
                );
                self.solution = Some(solution);
                Ok(self.objective_value())
            }
            Err(err) => {
                if err == SolverError::Infeasible {
                    self.solution = None;
                }
                Err(err.into())
            }
        }
    }

    /// Latest objective value in external units, NaN if no solution is recorded
    pub fn objective_value(&self) -> f64 {
        match &self.solution {
            Some(solution) => self.scaling.scale(solution.objective_value()),
            None => f64::NAN,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn solver_configuration(&self) -> &SolverConfiguration {
        &self.solver_configuration
    }

    /// External molecule to the id of its exchange reaction
    pub fn exchange_reactions(&self) -> &IndexMap<String, String> {
        &self.exchange_reactions
    }

    pub fn exchange_bounds(&self) -> &IndexMap<String, ExchangeLevel> {
        &self.exchange_bounds
    }

    pub fn molecular_weights(&self) -> &IndexMap<String, f64> {
        &self.molecular_weights
    }

    pub fn default_upper_bound(&self) -> f64 {
        self.default_upper_bound
    }

    pub fn is_moma(&self) -> bool {
        self.moma
    }

    /// Switch minimal adjustment mode on or off for later calls to [`Fba::optimize`]
    pub fn set_moma(&mut self, moma: bool) {
        self.moma = moma;
    }
}

/// Errors raised by the flux balance façade
#[derive(Error, Debug)]
pub enum FbaError {
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Solver failed: {0}")]
    Solver(SolverError),
    #[error("Unable to read model: {0}")]
    Json(#[from] JsonError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The solver found no flux distribution satisfying the current bounds
    #[error("Model is infeasible under the current bounds")]
    InfeasibleModel,
    /// The added mass at unit scaling can't be used to calibrate the flux scaling
    #[error("Unable to scale fluxes, added mass at unit scaling is {added_mass}")]
    DegenerateScaling { added_mass: f64 },
    #[error("Target added mass must be a positive finite number, got {target_added_mass}")]
    InvalidScalingTarget { target_added_mass: f64 },
}

impl From<SolverError> for FbaError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Infeasible => FbaError::InfeasibleModel,
            err => FbaError::Solver(err),
        }
    }
}
