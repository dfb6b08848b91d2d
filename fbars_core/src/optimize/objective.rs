//! Provides struct for representing an optimization problem's objective

/// Represents the Objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Add a new term to the objective
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.terms.push(term);
    }

    /// Value of the objective at `values` (indexed by variable index)
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let value_of = |index: usize| values.get(index).copied().unwrap_or(0.);
        self.terms
            .iter()
            .map(|term| match *term {
                ObjectiveTerm::Linear { var, coef } => coef * value_of(var),
                ObjectiveTerm::Quadratic { var1, var2, coef } => {
                    coef * value_of(var1) * value_of(var2)
                }
            })
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

// region Objective Terms
/// A term in the objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectiveTerm {
    /// A quadratic term in the objective, `coef * var1 * var2`
    Quadratic {
        /// Index of the first variable in the objective term
        var1: usize,
        /// Index of the second variable in the objective term
        var2: usize,
        /// Coefficient for quadratic term
        coef: f64,
    },
    /// A linear term in the objective, `coef * var`
    Linear {
        /// Index of the variable in objective term
        var: usize,
        /// Coefficient for linear term
        coef: f64,
    },
}

impl ObjectiveTerm {
    /// Create a new quadratic objective term
    pub fn new_quadratic(var1: usize, var2: usize, coef: f64) -> Self {
        ObjectiveTerm::Quadratic { var1, var2, coef }
    }

    /// Create a new linear objective term
    pub fn new_linear(var: usize, coef: f64) -> Self {
        ObjectiveTerm::Linear { var, coef }
    }
}

// endregion Objective Terms

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate() {
        let mut objective = Objective::new(ObjectiveSense::Minimize);
        objective.add_term(ObjectiveTerm::new_linear(0, 2.));
        objective.add_term(ObjectiveTerm::new_quadratic(1, 1, 1.));
        objective.add_term(ObjectiveTerm::new_quadratic(0, 1, -3.));
        // 2*1 + 2*2 - 3*1*2
        assert!((objective.evaluate(&[1., 2.]) - 0.).abs() < 1e-12);
        assert_eq!(objective.sense(), ObjectiveSense::Minimize);
        assert_eq!(objective.terms().len(), 3);
    }

    #[test]
    fn missing_values_count_as_zero() {
        let mut objective = Objective::new(ObjectiveSense::Maximize);
        objective.add_term(ObjectiveTerm::new_linear(4, 2.));
        assert_eq!(objective.evaluate(&[1.]), 0.);
    }
}
