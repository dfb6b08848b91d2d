//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::configuration::DEFAULT_UPPER_BOUND;
use crate::metabolic_model::model::ModelError;

/// Represents a reaction in the metabolic model
///
/// The stoichiometry is fixed once the reaction is built, only the flux bounds can change
/// afterwards.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Lower flux bound
    #[builder(default = "0.")]
    lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "DEFAULT_UPPER_BOUND")]
    upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Whether this reaction exchanges a single metabolite across the system boundary
    #[builder(default = "false")]
    is_exchange: bool,
    /// Whether targets for this reaction are given in the external (uptake positive)
    /// direction, and so must be negated before being applied
    ///
    /// ### Note
    /// Only set on exchange reactions whose molecule has a configured exchange level, see
    /// [`Reaction::mark_external_flux_reversed`]
    #[builder(default = "false")]
    is_external_flux_reversed: bool,
}

impl ReactionBuilder {
    fn validate(&self) -> Result<(), String> {
        let lower = self.lower_bound.unwrap_or(0.);
        let upper = self.upper_bound.unwrap_or(DEFAULT_UPPER_BOUND);
        if lower > upper {
            return Err(format!(
                "lower bound {} is greater than upper bound {}",
                lower, upper
            ));
        }
        Ok(())
    }
}

impl Reaction {
    /// Metabolite id to stoichiometric coefficient (negative when consumed)
    pub fn metabolites(&self) -> &IndexMap<String, f64> {
        &self.metabolites
    }

    /// Stoichiometric coefficient of a metabolite, 0 if it doesn't take part in the reaction
    pub fn coefficient(&self, metabolite_id: &str) -> f64 {
        self.metabolites.get(metabolite_id).copied().unwrap_or(0.)
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// The (lower, upper) flux bounds
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }

    pub fn is_exchange(&self) -> bool {
        self.is_exchange
    }

    pub fn is_external_flux_reversed(&self) -> bool {
        self.is_external_flux_reversed
    }

    /// Whether both bounds are exactly zero (the reaction was switched off)
    pub fn is_shut_down(&self) -> bool {
        self.lower_bound == 0. && self.upper_bound == 0.
    }

    /// Overwrite both bounds
    ///
    /// # Returns
    /// `Err(ModelError::InvalidBounds)` if `lower > upper` or either bound is NaN, in which
    /// case the reaction is left unchanged
    pub fn set_bounds(&mut self, lower: f64, upper: f64) -> Result<(), ModelError> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(ModelError::InvalidBounds {
                reaction: self.id.clone(),
                lower,
                upper,
            });
        }
        self.lower_bound = lower;
        self.upper_bound = upper;
        Ok(())
    }

    /// Overwrite the lower bound, moving the upper bound up with it if needed
    pub fn set_lower_bound(&mut self, lower: f64) -> Result<(), ModelError> {
        if lower > self.upper_bound {
            tracing::warn!(
                component = "reaction",
                operation = "set_lower_bound",
                reaction = %self.id,
                lower,
                upper = self.upper_bound,
                "Lower bound exceeds upper bound, raising upper bound to match"
            );
            return self.set_bounds(lower, lower);
        }
        self.set_bounds(lower, self.upper_bound)
    }

    /// Force both bounds to zero
    pub fn shut_down(&mut self) {
        self.lower_bound = 0.;
        self.upper_bound = 0.;
    }

    /// Flag this exchange reaction so externally given targets are negated
    pub(crate) fn mark_external_flux_reversed(&mut self) {
        self.is_external_flux_reversed = true;
    }

    pub(crate) fn mark_exchange(&mut self) {
        self.is_exchange = true;
    }

    /// The single metabolite exchanged by this reaction
    ///
    /// # Returns
    /// `Err(ModelError::MalformedExchange)` if the reaction involves anything other than
    /// exactly one metabolite
    pub fn exchanged_metabolite(&self) -> Result<&str, ModelError> {
        if self.metabolites.len() != 1 {
            return Err(ModelError::MalformedExchange {
                reaction: self.id.clone(),
                metabolite_count: self.metabolites.len(),
            });
        }
        match self.metabolites.keys().next() {
            Some(id) => Ok(id.as_str()),
            None => Err(ModelError::MalformedExchange {
                reaction: self.id.clone(),
                metabolite_count: 0,
            }),
        }
    }
}

/// Whether a Reaction is active or inactive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionActivity {
    /// The Reaction is active and can carry flux
    Active,
    /// The Reaction is inactive and can't carry flux
    Inactive,
}

impl From<bool> for ReactionActivity {
    fn from(value: bool) -> Self {
        if value {
            ReactionActivity::Active
        } else {
            ReactionActivity::Inactive
        }
    }
}

/// Level applied to an exchange reaction
///
/// Deserializes from either a bare number (`-10.0`) or a two element array (`[-10.0, 5.0]`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExchangeLevel {
    /// Only the lower bound is set to this value
    Fixed(f64),
    /// Both bounds are set to (lower, upper)
    Interval(f64, f64),
}
