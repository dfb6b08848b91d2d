//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

/// A continuous variable of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable (unique within a problem)
    pub(crate) id: String,
    /// Position of the variable in the problem's variable vector
    pub(crate) index: usize,
    pub(crate) lower_bound: f64,
    pub(crate) upper_bound: f64,
}

impl Variable {
    /// Create a new variable
    pub(crate) fn new(id: &str, index: usize, lower_bound: f64, upper_bound: f64) -> Variable {
        Variable {
            id: id.to_string(),
            index,
            lower_bound,
            upper_bound,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Whether the bounds pin the variable to a single value
    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let var = Variable::new("x", 0, -1., 2.5);
        assert_eq!(format!("{}", var), "-1 <= x <= 2.5");
        assert!(!var.is_fixed());
        assert!(Variable::new("y", 1, 0., 0.).is_fixed());
    }
}
