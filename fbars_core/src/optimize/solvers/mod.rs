//! Solver backends turning a [`Problem`] into a [`ProblemSolution`]
use std::fmt::Debug;

use thiserror::Error;

use crate::configuration::{SolverConfiguration, SolverKind};
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::ProblemSolution;

pub mod clarabel;
#[cfg(feature = "minilp")]
pub mod microlp;

/// An optimization backend
pub trait Solver: Debug {
    /// Name of the backend, used in log events
    fn name(&self) -> &'static str;

    /// Whether the backend can handle quadratic objectives
    fn quadratic_objective_capable(&self) -> bool;

    /// Solve the problem
    ///
    /// Only failures to run the backend are errors; an infeasible or unbounded problem is
    /// reported through the status of the returned [`ProblemSolution`].
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create the backend selected by the configuration
pub fn solver_from_configuration(
    configuration: &SolverConfiguration,
) -> Result<Box<dyn Solver>, SolverError> {
    match configuration.solver {
        SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::new(configuration))),
        SolverKind::Microlp => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "minilp")] {
                    Ok(Box::new(microlp::MicrolpSolver::new(configuration)))
                } else {
                    Err(SolverError::Unavailable(
                        "microlp backend requires the minilp feature".to_string(),
                    ))
                }
            }
        }
    }
}

/// Errors raised while solving
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem is infeasible")]
    Infeasible,
    #[error("Problem is unbounded")]
    Unbounded,
    #[error("Solver encountered a numerical error")]
    NumericalError,
    #[error("Solver halted before reaching an optimum")]
    Halted,
    #[error("Solver can't handle this problem: {0}")]
    UnsupportedProblem(String),
    #[error("Solver unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("Unable to assemble problem matrices: {0}")]
    Matrix(String),
}
