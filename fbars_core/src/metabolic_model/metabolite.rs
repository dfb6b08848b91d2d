//! This module provides the metabolite struct representing a metabolite

use derive_builder::Builder;

use crate::metabolic_model::formula::{Formula, FormulaError};

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
}

impl Metabolite {
    /// Parse the chemical formula of the metabolite, if it has one
    pub fn parsed_formula(&self) -> Option<Result<Formula, FormulaError>> {
        self.formula.as_deref().map(Formula::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glucose_weight() {
        let glucose = MetaboliteBuilder::default()
            .id("glc__D_e".to_string())
            .compartment(Some("e".to_string()))
            .formula(Some("C6H12O6".to_string()))
            .build()
            .unwrap();
        let weight = glucose.parsed_formula().unwrap().unwrap().weight().unwrap();
        assert!((weight - 180.156).abs() < 1e-2);
    }

    #[test]
    fn no_formula() {
        let met = MetaboliteBuilder::default()
            .id("biomass".to_string())
            .build()
            .unwrap();
        assert!(met.parsed_formula().is_none());
        assert_eq!(met.charge, 0);
    }
}
