//! Implements a solver interface for Clarabel
//!
//! Clarabel solves problems of the form
//! minimize ½x'Px + q'x subject to Ax + s = b, s in K,
//! so every problem is rewritten with variable bounds and constraints as rows of A. Rows
//! belonging to the zero cone (equalities) come first, followed by rows of the
//! non-negative cone (inequalities and bounds).
use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use indexmap::IndexMap;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::configuration::SolverConfiguration;
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point backend handling linear and quadratic objectives
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    tolerance: f64,
    time_limit: Option<f64>,
    max_iterations: u32,
    verbose: bool,
}

impl ClarabelSolver {
    pub fn new(configuration: &SolverConfiguration) -> Self {
        ClarabelSolver {
            tolerance: configuration.tolerance,
            time_limit: configuration.time_limit,
            max_iterations: configuration.max_iterations,
            verbose: configuration.verbose,
        }
    }

    fn settings(&self) -> DefaultSettings<f64> {
        let mut settings = DefaultSettings::<f64>::default();
        settings.verbose = self.verbose;
        settings.max_iter = self.max_iterations;
        settings.time_limit = self.time_limit.unwrap_or(f64::INFINITY);
        settings.tol_feas = self.tolerance;
        settings.tol_gap_abs = self.tolerance;
        settings.tol_gap_rel = self.tolerance;
        settings
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn quadratic_objective_capable(&self) -> bool {
        true
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        // Clarabel can't factor an empty system, and there is nothing to choose anyway
        if n == 0 {
            return Ok(ProblemSolution {
                status: OptimizationStatus::Optimal,
                objective_value: Some(0.),
                variable_values: Some(IndexMap::new()),
            });
        }
        let (p, q) = objective_matrices(problem)?;
        let rows = ConstraintRows::from_problem(problem);
        let a = to_clarabel(rows.nrows(), n, &rows.rows, &rows.cols, &rows.values)?;
        let cones = [
            SupportedConeT::ZeroConeT(rows.zero_rows),
            SupportedConeT::NonnegativeConeT(rows.nonneg_rows),
        ];
        tracing::debug!(
            component = "solver",
            operation = "solve",
            solver = self.name(),
            variables = n,
            rows = rows.nrows(),
            "Solving problem"
        );

        let mut solver = DefaultSolver::new(&p, &q, &a, &rows.b, &cones, self.settings());
        solver.solve();

        let status = map_status(solver.solution.status);
        tracing::debug!(
            component = "solver",
            operation = "solve",
            solver = self.name(),
            status = ?status,
            "Solve finished"
        );
        if !status.has_solution() {
            return Ok(ProblemSolution::without_values(status));
        }
        let x = solver.solution.x;
        let objective_value = problem.objective().evaluate(&x);
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(x.iter().copied())
            .collect();
        Ok(ProblemSolution {
            status,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
        })
    }
}

/// Map the Clarabel status onto the solver neutral status
fn map_status(status: SolverStatus) -> OptimizationStatus {
    match status {
        SolverStatus::Solved => OptimizationStatus::Optimal,
        SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            OptimizationStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            OptimizationStatus::Unbounded
        }
        SolverStatus::NumericalError => OptimizationStatus::NumericalError,
        SolverStatus::MaxIterations | SolverStatus::MaxTime | SolverStatus::InsufficientProgress => {
            OptimizationStatus::SolverHalted
        }
        SolverStatus::Unsolved => OptimizationStatus::Unoptimized,
        #[allow(unreachable_patterns)]
        _ => OptimizationStatus::NumericalError,
    }
}

/// Build the upper triangular P matrix and q vector, negated for maximization
fn objective_matrices(problem: &Problem) -> Result<(ClarabelCsc<f64>, Vec<f64>), SolverError> {
    let n = problem.num_variables();
    let sign = match problem.objective().sense() {
        ObjectiveSense::Minimize => 1.,
        ObjectiveSense::Maximize => -1.,
    };
    let mut q = vec![0.; n];
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    for term in problem.objective().terms() {
        match *term {
            ObjectiveTerm::Linear { var, coef } => q[var] += sign * coef,
            ObjectiveTerm::Quadratic { var1, var2, coef } => {
                // ½x'Px doubles the diagonal
                let value = if var1 == var2 {
                    2. * sign * coef
                } else {
                    sign * coef
                };
                rows.push(var1.min(var2));
                cols.push(var1.max(var2));
                values.push(value);
            }
        }
    }
    let p = to_clarabel(n, n, &rows, &cols, &values)?;
    Ok((p, q))
}

/// Rows of A and b, in triplet form
#[derive(Debug, Default)]
struct ConstraintRows {
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    b: Vec<f64>,
    zero_rows: usize,
    nonneg_rows: usize,
}

impl ConstraintRows {
    fn from_problem(problem: &Problem) -> Self {
        let mut rows = ConstraintRows::default();
        // Zero cone: equality constraints and fixed variables
        for constraint in problem.constraints().values() {
            if let Constraint::Equality { terms, equals } = constraint {
                let entries: Vec<(usize, f64)> =
                    terms.iter().map(|t| (t.variable, t.coefficient)).collect();
                rows.push_row(&entries, *equals);
                rows.zero_rows += 1;
            }
        }
        for var in problem.variables().values() {
            if var.is_fixed() {
                rows.push_row(&[(var.index(), 1.)], var.lower_bound());
                rows.zero_rows += 1;
            }
        }
        // Non-negative cone: inequality constraints and remaining bounds
        for constraint in problem.constraints().values() {
            if let Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
            } = constraint
            {
                let entries: Vec<(usize, f64)> =
                    terms.iter().map(|t| (t.variable, t.coefficient)).collect();
                rows.push_upper(&entries, *upper_bound);
                rows.push_lower(&entries, *lower_bound);
            }
        }
        for var in problem.variables().values() {
            if !var.is_fixed() {
                rows.push_upper(&[(var.index(), 1.)], var.upper_bound());
                rows.push_lower(&[(var.index(), 1.)], var.lower_bound());
            }
        }
        rows
    }

    fn nrows(&self) -> usize {
        self.b.len()
    }

    fn push_row(&mut self, entries: &[(usize, f64)], rhs: f64) {
        let row = self.b.len();
        for &(col, value) in entries {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
        self.b.push(rhs);
    }

    /// terms <= upper
    fn push_upper(&mut self, entries: &[(usize, f64)], upper: f64) {
        if upper.is_finite() {
            self.push_row(entries, upper);
            self.nonneg_rows += 1;
        }
    }

    /// -terms <= -lower
    fn push_lower(&mut self, entries: &[(usize, f64)], lower: f64) {
        if lower.is_finite() {
            let negated: Vec<(usize, f64)> = entries.iter().map(|&(c, v)| (c, -v)).collect();
            self.push_row(&negated, -lower);
            self.nonneg_rows += 1;
        }
    }
}

/// Assemble a Clarabel CSC matrix from triplets, summing duplicate entries
fn to_clarabel(
    nrows: usize,
    ncols: usize,
    rows: &[usize],
    cols: &[usize],
    values: &[f64],
) -> Result<ClarabelCsc<f64>, SolverError> {
    let coo = CooMatrix::try_from_triplets(
        nrows,
        ncols,
        rows.to_vec(),
        cols.to_vec(),
        values.to_vec(),
    )
    .map_err(|err| SolverError::Matrix(format!("{}", err)))?;
    let csc = CscMatrix::from(&coo);
    let (colptr, rowval, nzval) = csc.disassemble();
    Ok(ClarabelCsc::new(nrows, ncols, colptr, rowval, nzval))
}
