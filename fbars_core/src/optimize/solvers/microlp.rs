//! Implements a solver interface for microlp, a pure Rust simplex solver
use indexmap::IndexMap;
use microlp::{ComparisonOp, OptimizationDirection};

use crate::configuration::SolverConfiguration;
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::problem::{Problem, ProblemType};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Simplex backend, linear objectives only
#[derive(Clone, Debug)]
pub struct MicrolpSolver {
    verbose: bool,
}

impl MicrolpSolver {
    pub fn new(configuration: &SolverConfiguration) -> Self {
        MicrolpSolver {
            verbose: configuration.verbose,
        }
    }
}

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn quadratic_objective_capable(&self) -> bool {
        false
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        if problem.problem_type() == ProblemType::QuadraticContinuous {
            return Err(SolverError::UnsupportedProblem(
                "microlp only solves linear objectives".to_string(),
            ));
        }
        if problem.num_variables() == 0 {
            return Ok(ProblemSolution {
                status: OptimizationStatus::Optimal,
                objective_value: Some(0.),
                variable_values: Some(IndexMap::new()),
            });
        }
        let direction = match problem.objective().sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut coefficients = vec![0.; problem.num_variables()];
        for term in problem.objective().terms() {
            if let ObjectiveTerm::Linear { var, coef } = *term {
                coefficients[var] += coef;
            }
        }

        let mut lp = microlp::Problem::new(direction);
        let vars: Vec<microlp::Variable> = problem
            .variables()
            .values()
            .map(|v| lp.add_var(coefficients[v.index()], (v.lower_bound(), v.upper_bound())))
            .collect();
        for constraint in problem.constraints().values() {
            let expr: Vec<(microlp::Variable, f64)> = constraint
                .terms()
                .iter()
                .map(|t| (vars[t.variable], t.coefficient))
                .collect();
            match constraint {
                Constraint::Equality { equals, .. } => {
                    lp.add_constraint(expr.as_slice(), ComparisonOp::Eq, *equals)
                }
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    if lower_bound.is_finite() {
                        lp.add_constraint(expr.as_slice(), ComparisonOp::Ge, *lower_bound);
                    }
                    if upper_bound.is_finite() {
                        lp.add_constraint(expr.as_slice(), ComparisonOp::Le, *upper_bound);
                    }
                }
            }
        }
        if self.verbose {
            tracing::info!(
                component = "solver",
                solver = self.name(),
                variables = vars.len(),
                constraints = problem.num_constraints(),
                "Solving problem"
            );
        }

        let solution = match lp.solve() {
            Ok(solution) => solution,
            Err(err) => {
                let status = match err {
                    microlp::Error::Infeasible => OptimizationStatus::Infeasible,
                    microlp::Error::Unbounded => OptimizationStatus::Unbounded,
                    #[allow(unreachable_patterns)]
                    _ => OptimizationStatus::NumericalError,
                };
                tracing::debug!(
                    component = "solver",
                    operation = "solve",
                    solver = self.name(),
                    status = ?status,
                    "Solve finished"
                );
                return Ok(ProblemSolution::without_values(status));
            }
        };
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(vars.iter().map(|v| solution[*v]))
            .collect();
        tracing::debug!(
            component = "solver",
            operation = "solve",
            solver = self.name(),
            status = "Optimal",
            "Solve finished"
        );
        Ok(ProblemSolution {
            status: OptimizationStatus::Optimal,
            objective_value: Some(solution.objective()),
            variable_values: Some(variable_values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_maximization() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 3.).unwrap();
        problem.add_new_variable("y", 0., 3.).unwrap();
        problem
            .add_new_inequality_constraint_by_id("cap", &["x", "y"], &[1., 1.], f64::NEG_INFINITY, 4.)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        problem.add_new_linear_objective_term_by_id("y", 2.).unwrap();

        let solver = MicrolpSolver::new(&SolverConfiguration::default());
        let solution = solver.solve(&problem).unwrap();
        assert!((solution.objective_value.unwrap() - 7.).abs() < 1e-8);
        assert!((solution.variable_values.unwrap()["y"] - 3.).abs() < 1e-8);
    }

    #[test]
    fn empty_problem() {
        let solver = MicrolpSolver::new(&SolverConfiguration::default());
        let solution = solver.solve(&Problem::new_maximization()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert_eq!(solution.objective_value, Some(0.));
    }

    #[test]
    fn rejects_quadratic() {
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", 0., 3.).unwrap();
        problem.add_new_quadratic_objective_term_by_id("x", "x", 1.).unwrap();
        let solver = MicrolpSolver::new(&SolverConfiguration::default());
        assert!(matches!(
            solver.solve(&problem),
            Err(SolverError::UnsupportedProblem(_))
        ));
    }

    #[test]
    fn infeasible() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem
            .add_new_equality_constraint_by_id("impossible", &["x"], &[1.], 5.)
            .unwrap();
        let solver = MicrolpSolver::new(&SolverConfiguration::default());
        let solution = solver.solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
    }
}
