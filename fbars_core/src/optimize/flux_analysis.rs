//! Flux balance problems assembled from a [`Model`]: plain FBA, minimization of metabolic
//! adjustment (MOMA) and the minimal medium problem
use indexmap::IndexMap;

use crate::metabolic_model::model::Model;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};
use crate::utils::hashing::hash_as_hex_string;

/// Uptake below this is treated as no uptake by [`minimal_medium`]
pub const UPTAKE_THRESHOLD: f64 = 1e-6;

/// Flux distribution produced by one optimization, in solver native units
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    status: OptimizationStatus,
    objective_value: f64,
    fluxes: IndexMap<String, f64>,
}

impl Solution {
    pub fn status(&self) -> OptimizationStatus {
        self.status
    }

    /// Value of the model objective at this flux distribution
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Flux of every reaction, keyed by reaction id
    pub fn fluxes(&self) -> &IndexMap<String, f64> {
        &self.fluxes
    }

    pub fn flux(&self, reaction_id: &str) -> Option<f64> {
        self.fluxes.get(reaction_id).copied()
    }
}

/// Variables for every reaction and a steady state constraint for every metabolite
fn mass_balance_problem(model: &Model, problem: &mut Problem) -> Result<(), SolverError> {
    for (id, reaction) in model.reactions() {
        problem.add_new_variable(id, reaction.lower_bound(), reaction.upper_bound())?;
    }
    let mut balances: IndexMap<&str, (Vec<&str>, Vec<f64>)> = IndexMap::new();
    for (reaction_id, reaction) in model.reactions() {
        for (metabolite_id, coefficient) in reaction.metabolites() {
            let entry = balances.entry(metabolite_id.as_str()).or_default();
            entry.0.push(reaction_id.as_str());
            entry.1.push(*coefficient);
        }
    }
    for (metabolite_id, (reactions, coefficients)) in balances {
        problem.add_new_equality_constraint_by_id(metabolite_id, &reactions, &coefficients, 0.)?;
    }
    Ok(())
}

/// Maximize the model objective
fn fba_problem(model: &Model) -> Result<Problem, SolverError> {
    let mut problem = Problem::new_maximization();
    mass_balance_problem(model, &mut problem)?;
    for (reaction_id, weight) in model.objective() {
        problem.add_new_linear_objective_term_by_id(reaction_id, *weight)?;
    }
    Ok(problem)
}

/// Turn a non optimal status into the matching error
fn check_status(solution: &ProblemSolution) -> Result<(), SolverError> {
    match solution.status {
        OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => Ok(()),
        OptimizationStatus::Infeasible => Err(SolverError::Infeasible),
        OptimizationStatus::Unbounded => Err(SolverError::Unbounded),
        OptimizationStatus::NumericalError => Err(SolverError::NumericalError),
        OptimizationStatus::SolverHalted | OptimizationStatus::Unoptimized => {
            Err(SolverError::Halted)
        }
    }
}

/// Fluxes keyed by reaction id, dropping any auxiliary variables
fn reaction_fluxes(model: &Model, solution: &ProblemSolution) -> IndexMap<String, f64> {
    let Some(values) = &solution.variable_values else {
        return IndexMap::new();
    };
    model
        .reactions()
        .keys()
        .map(|id| (id.clone(), values.get(id).copied().unwrap_or(0.)))
        .collect()
}

/// Run flux balance analysis, maximizing the model objective under the current bounds
pub fn fba(model: &Model, solver: &dyn Solver) -> Result<Solution, SolverError> {
    let problem = fba_problem(model)?;
    let solution = solver.solve(&problem)?;
    check_status(&solution)?;
    let fluxes = reaction_fluxes(model, &solution);
    Ok(Solution {
        status: solution.status,
        objective_value: model.objective_value_of(&fluxes),
        fluxes,
    })
}

/// Maximal objective value under the current bounds, without collecting fluxes
pub fn slim_optimize(model: &Model, solver: &dyn Solver) -> Result<f64, SolverError> {
    let problem = fba_problem(model)?;
    let solution = solver.solve(&problem)?;
    check_status(&solution)?;
    solution.objective_value.ok_or(SolverError::NumericalError)
}

/// Find the flux distribution closest (in Euclidean distance) to `reference` under the
/// current bounds
///
/// Minimizes Σ(v_i - ref_i)², expanded as Σ v_i² - 2 ref_i v_i. Reactions missing from the
/// reference are pulled towards 0. The objective value of the returned solution is the
/// model objective evaluated at the new fluxes.
pub fn moma(
    model: &Model,
    solver: &dyn Solver,
    reference: &Solution,
) -> Result<Solution, SolverError> {
    if !solver.quadratic_objective_capable() {
        return Err(SolverError::UnsupportedProblem(format!(
            "{} can't solve the quadratic minimal adjustment problem",
            solver.name()
        )));
    }
    let mut problem = Problem::new_minimization();
    mass_balance_problem(model, &mut problem)?;
    for reaction_id in model.reactions().keys() {
        let target = reference.flux(reaction_id).unwrap_or(0.);
        problem.add_new_quadratic_objective_term_by_id(reaction_id, reaction_id, 1.)?;
        if target != 0. {
            problem.add_new_linear_objective_term_by_id(reaction_id, -2. * target)?;
        }
    }
    let solution = solver.solve(&problem)?;
    check_status(&solution)?;
    let fluxes = reaction_fluxes(model, &solution);
    Ok(Solution {
        status: solution.status,
        objective_value: model.objective_value_of(&fluxes),
        fluxes,
    })
}

/// Find the smallest total uptake sufficient to reach `min_objective_value`
///
/// `exchange_reactions` maps each external molecule to its exchange reaction. Uptake of a
/// molecule is the amount its exchange reaction brings into the system. Returns the uptake
/// (positive, solver native units) of every molecule whose uptake exceeds
/// [`UPTAKE_THRESHOLD`].
pub fn minimal_medium(
    model: &Model,
    solver: &dyn Solver,
    exchange_reactions: &IndexMap<String, String>,
    min_objective_value: f64,
) -> Result<IndexMap<String, f64>, SolverError> {
    let mut problem = Problem::new_minimization();
    mass_balance_problem(model, &mut problem)?;

    let objective_ids: Vec<&str> = model.objective().keys().map(String::as_str).collect();
    let objective_weights: Vec<f64> = model.objective().values().copied().collect();
    problem.add_new_inequality_constraint_by_id(
        "minimal_medium_objective",
        &objective_ids,
        &objective_weights,
        min_objective_value,
        f64::INFINITY,
    )?;

    let mut uptakes: IndexMap<&str, String> = IndexMap::new();
    for (molecule, reaction_id) in exchange_reactions {
        let Some(reaction) = model.reaction(reaction_id) else {
            continue;
        };
        let coefficient = reaction.coefficient(molecule);
        // Unique suffix so uptake variables can't collide with reaction ids
        let uptake_id = format!("{}_uptake_{}", reaction_id, hash_as_hex_string(reaction_id));
        problem.add_new_variable(&uptake_id, 0., f64::INFINITY)?;
        // uptake >= production of the molecule by the exchange
        problem.add_new_inequality_constraint_by_id(
            &uptake_id,
            &[uptake_id.as_str(), reaction_id.as_str()],
            &[1., -coefficient],
            0.,
            f64::INFINITY,
        )?;
        problem.add_new_linear_objective_term_by_id(&uptake_id, 1.)?;
        uptakes.insert(molecule.as_str(), uptake_id);
    }

    let solution = solver.solve(&problem)?;
    check_status(&solution)?;
    let values = solution.variable_values.unwrap_or_default();
    let medium: IndexMap<String, f64> = uptakes
        .into_iter()
        .filter_map(|(molecule, uptake_id)| {
            let uptake = values.get(&uptake_id).copied().unwrap_or(0.);
            (uptake > UPTAKE_THRESHOLD).then(|| (molecule.to_string(), uptake))
        })
        .collect();
    tracing::debug!(
        component = "flux_analysis",
        operation = "minimal_medium",
        min_objective_value,
        molecules = medium.len(),
        "Computed minimal medium"
    );
    Ok(medium)
}
