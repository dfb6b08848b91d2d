//! Module providing the Model struct for representing a stoichiometric metabolic model.

pub mod builder;
pub mod formula;
pub mod metabolite;
pub mod model;
pub mod reaction;
