//! This module provides the Model struct for representing an entire metabolic model
use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{Reaction, ReactionBuilderError};

/// Represents a stoichiometric metabolic model
///
/// # Invariants
/// - every metabolite referenced by a reaction's stoichiometry is in `metabolites`
/// - every reaction referenced by the objective is in `reactions`
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// Map of reaction ids to Reactions
    reactions: IndexMap<String, Reaction>,
    /// Map of metabolite ids to Metabolites
    metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    objective: IndexMap<String, f64>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            id: None,
            compartments: None,
            reactions: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
        }
    }

    /// Add a metabolite to the model, replacing any metabolite with the same id
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add, all of its metabolites must already be in the model
    ///
    /// # Examples
    /// ```rust
    /// use fbars_core::metabolic_model::model::Model;
    /// use fbars_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction).unwrap();
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        if let Some(missing) = reaction
            .metabolites()
            .keys()
            .find(|m| !self.metabolites.contains_key(*m))
        {
            return Err(ModelError::Configuration(format!(
                "reaction {} references unknown metabolite {}",
                reaction.id, missing
            )));
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
        Ok(())
    }

    /// Replace the objective with a new reaction id to weight mapping
    pub fn set_objective(&mut self, objective: IndexMap<String, f64>) -> Result<(), ModelError> {
        if let Some(missing) = objective.keys().find(|r| !self.reactions.contains_key(*r)) {
            return Err(ModelError::Configuration(format!(
                "objective references unknown reaction {}",
                missing
            )));
        }
        self.objective = objective;
        Ok(())
    }

    pub fn reactions(&self) -> &IndexMap<String, Reaction> {
        &self.reactions
    }

    pub fn metabolites(&self) -> &IndexMap<String, Metabolite> {
        &self.metabolites
    }

    /// Reaction id to objective weight
    pub fn objective(&self) -> &IndexMap<String, f64> {
        &self.objective
    }

    pub fn reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.get(id)
    }

    /// Mutable access to a reaction, only its bounds can be changed through it
    pub fn reaction_mut(&mut self, id: &str) -> Option<&mut Reaction> {
        self.reactions.get_mut(id)
    }

    pub fn metabolite(&self, id: &str) -> Option<&Metabolite> {
        self.metabolites.get(id)
    }

    /// Iterate over the exchange reactions of the model
    pub fn exchanges(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|r| r.is_exchange())
    }

    /// Evaluate the objective for a flux vector keyed by reaction id
    pub fn objective_value_of(&self, fluxes: &IndexMap<String, f64>) -> f64 {
        self.objective
            .iter()
            .map(|(id, coef)| coef * fluxes.get(id).copied().unwrap_or(0.))
            .sum()
    }

    /// Capture the current bounds of every reaction
    pub fn snapshot_bounds(&self) -> BoundsSnapshot {
        BoundsSnapshot {
            bounds: self
                .reactions
                .iter()
                .map(|(id, r)| (id.clone(), r.bounds()))
                .collect(),
        }
    }

    /// Restore bounds captured by [`Model::snapshot_bounds`]
    ///
    /// Reactions absent from the snapshot are left untouched.
    pub fn restore_bounds(&mut self, snapshot: &BoundsSnapshot) {
        for (id, (lower, upper)) in &snapshot.bounds {
            if let Some(reaction) = self.reactions.get_mut(id) {
                // Snapshot bounds were valid when captured
                if reaction.set_bounds(*lower, *upper).is_err() {
                    tracing::error!(
                        component = "model",
                        operation = "restore_bounds",
                        reaction = %id,
                        lower,
                        upper,
                        "Snapshot contained invalid bounds"
                    );
                }
            }
        }
    }
}

/// Flux bounds of every reaction at one point in time
#[derive(Clone, Debug, PartialEq)]
pub struct BoundsSnapshot {
    bounds: IndexMap<String, (f64, f64)>,
}

impl BoundsSnapshot {
    pub fn get(&self, reaction_id: &str) -> Option<(f64, f64)> {
        self.bounds.get(reaction_id).copied()
    }
}

/// Errors associated with building or modifying a Model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The model specification references reactions or metabolites that don't exist,
    /// or is otherwise malformed
    #[error("Invalid model configuration: {0}")]
    Configuration(String),
    /// An exchange reaction doesn't involve exactly one metabolite
    #[error("Exchange reaction {reaction} has {metabolite_count} metabolites, expected exactly 1")]
    MalformedExchange {
        reaction: String,
        metabolite_count: usize,
    },
    /// Tried to set a lower bound greater than the upper bound
    #[error("Invalid bounds for reaction {reaction}: lower {lower} > upper {upper}")]
    InvalidBounds {
        reaction: String,
        lower: f64,
        upper: f64,
    },
    #[error("Unable to build reaction: {0}")]
    ReactionBuild(String),
}

impl From<ReactionBuilderError> for ModelError {
    fn from(value: ReactionBuilderError) -> Self {
        ModelError::ReactionBuild(value.to_string())
    }
}
