//! Build a [`Model`] from a declarative stoichiometric specification, and extract such a
//! specification back out of a complete model.

use indexmap::{IndexMap, IndexSet};

use crate::metabolic_model::metabolite::MetaboliteBuilder;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{ExchangeLevel, ReactionBuilder};

/// Prefix of the ids of synthesized exchange reactions
pub const EXCHANGE_PREFIX: &str = "EX_";

/// Compartment every built metabolite is placed in
const BUILD_COMPARTMENT: (&str, &str) = ("c", "cytoplasm");

/// Id of the exchange reaction synthesized for an external molecule
pub fn exchange_reaction_id(molecule: &str) -> String {
    format!("{}{}", EXCHANGE_PREFIX, molecule)
}

/// Build a model from a stoichiometric specification
///
/// # Parameters
/// - `stoichiometry`: reaction id to {metabolite id: coefficient}
/// - `reversible`: ids of reactions whose lower bound is `-default_upper_bound` (otherwise 0)
/// - `objective`: reaction id to objective weight
/// - `external_molecules`: molecules which get an exchange reaction `EX_{molecule}`
///   consuming the molecule with coefficient -1 and bounds
///   `[-default_upper_bound, default_upper_bound]`
/// - `default_upper_bound`: upper bound of every reaction
///
/// # Returns
/// The model, or `ModelError::Configuration` if a reaction has no metabolites, an external
/// molecule isn't part of any reaction, or the objective references an unknown reaction.
/// A declared reaction named like an exchange (`EX_{molecule}`) is used as that molecule's
/// exchange and must involve only that molecule (`ModelError::MalformedExchange`).
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use fbars_core::metabolic_model::builder::build_model;
/// let mut stoichiometry = IndexMap::new();
/// stoichiometry.insert("growth".to_string(), IndexMap::from([("glc".to_string(), -1.)]));
/// let objective = IndexMap::from([("growth".to_string(), 1.)]);
/// let model = build_model(&stoichiometry, &[], &objective, &["glc".to_string()], 100.).unwrap();
/// assert_eq!(model.reaction("EX_glc").unwrap().bounds(), (-100., 100.));
/// ```
pub fn build_model(
    stoichiometry: &IndexMap<String, IndexMap<String, f64>>,
    reversible: &[String],
    objective: &IndexMap<String, f64>,
    external_molecules: &[String],
    default_upper_bound: f64,
) -> Result<Model, ModelError> {
    let mut model = Model::new_empty();
    model.id = Some("fba".to_string());
    model.compartments = Some(IndexMap::from([(
        BUILD_COMPARTMENT.0.to_string(),
        BUILD_COMPARTMENT.1.to_string(),
    )]));

    // Metabolites, in order of first appearance
    let metabolite_ids: IndexSet<&String> = stoichiometry
        .values()
        .flat_map(|chemistry| chemistry.keys())
        .collect();
    for id in metabolite_ids {
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id(id.clone())
                .name(Some(id.clone()))
                .compartment(Some(BUILD_COMPARTMENT.0.to_string()))
                .build()
                .map_err(|e| ModelError::Configuration(e.to_string()))?,
        );
    }

    let reversible: IndexSet<&str> = reversible.iter().map(String::as_str).collect();
    for (reaction_id, chemistry) in stoichiometry {
        if chemistry.is_empty() {
            return Err(ModelError::Configuration(format!(
                "reaction {} has no metabolites",
                reaction_id
            )));
        }
        let lower_bound = if reversible.contains(reaction_id.as_str()) {
            -default_upper_bound
        } else {
            0.
        };
        let reaction = ReactionBuilder::default()
            .id(reaction_id.clone())
            .name(Some(reaction_id.clone()))
            .metabolites(chemistry.clone())
            .lower_bound(lower_bound)
            .upper_bound(default_upper_bound)
            .build()?;
        model.add_reaction(reaction)?;
    }

    for external in external_molecules {
        if model.metabolite(external).is_none() {
            return Err(ModelError::Configuration(format!(
                "external molecule {} is not part of any reaction",
                external
            )));
        }
        let exchange_id = exchange_reaction_id(external);
        if let Some(declared) = model.reaction_mut(&exchange_id) {
            // Declared by the caller, use it as the exchange as long as it is well formed
            if declared.exchanged_metabolite()? != external.as_str() {
                return Err(ModelError::MalformedExchange {
                    reaction: exchange_id,
                    metabolite_count: 1,
                });
            }
            declared.mark_exchange();
            continue;
        }
        let reaction = ReactionBuilder::default()
            .id(exchange_id.clone())
            .name(Some(exchange_id))
            .metabolites(IndexMap::from([(external.clone(), -1.)]))
            .lower_bound(-default_upper_bound)
            .upper_bound(default_upper_bound)
            .is_exchange(true)
            .build()?;
        model.add_reaction(reaction)?;
    }

    model.set_objective(objective.clone())?;

    tracing::debug!(
        component = "builder",
        operation = "build_model",
        status = "success",
        reactions = model.reactions().len(),
        metabolites = model.metabolites().len(),
        "Built model from stoichiometry"
    );
    Ok(model)
}

/// Everything the flux balance layer needs to know about a model, extracted from a
/// complete model (see [`extract_model`])
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelSpecification {
    /// Reaction id to {metabolite id: coefficient}
    pub stoichiometry: IndexMap<String, IndexMap<String, f64>>,
    /// Reactions whose bounds allow flux in both directions
    pub reversible: Vec<String>,
    /// Molecules exchanged across the system boundary
    pub external_molecules: Vec<String>,
    /// Molecule id to the id of the reaction exchanging it
    pub exchange_reactions: IndexMap<String, String>,
    /// Reaction id to objective weight
    pub objective: IndexMap<String, f64>,
    /// Bounds of every reaction at extraction time
    pub flux_bounds: IndexMap<String, (f64, f64)>,
    /// Bounds of every exchange reaction at extraction time, keyed by molecule
    pub exchange_bounds: IndexMap<String, ExchangeLevel>,
    /// Molecular weights (g/mol) of metabolites with a physical formula
    pub molecular_weights: IndexMap<String, f64>,
}

/// Extract the stoichiometry, bounds, objective, exchanges and molecular weights of a model
///
/// Exchange reactions are the reactions flagged as exchanges, each of which must involve
/// exactly one metabolite (`ModelError::MalformedExchange` otherwise). Metabolites whose
/// formula includes a placeholder element (`R`, `X`) or an element without a known weight
/// get no molecular weight.
pub fn extract_model(model: &Model) -> Result<ModelSpecification, ModelError> {
    let mut spec = ModelSpecification::default();

    for (reaction_id, reaction) in model.reactions() {
        spec.stoichiometry
            .insert(reaction_id.clone(), reaction.metabolites().clone());
        let (lower, upper) = reaction.bounds();
        spec.flux_bounds.insert(reaction_id.clone(), (lower, upper));
        if lower != 0. && upper != 0. {
            spec.reversible.push(reaction_id.clone());
        }
    }

    for reaction in model.exchanges() {
        let molecule = reaction.exchanged_metabolite()?.to_string();
        let (lower, upper) = reaction.bounds();
        spec.external_molecules.push(molecule.clone());
        spec.exchange_reactions
            .insert(molecule.clone(), reaction.id.clone());
        spec.exchange_bounds
            .insert(molecule, ExchangeLevel::Interval(lower, upper));
    }

    for (metabolite_id, metabolite) in model.metabolites() {
        let formula = match metabolite.parsed_formula() {
            Some(Ok(formula)) => formula,
            Some(Err(err)) => {
                tracing::warn!(
                    component = "builder",
                    operation = "extract_model",
                    metabolite = %metabolite_id,
                    error = %err,
                    "Unable to parse formula, metabolite has no molecular weight"
                );
                continue;
            }
            None => continue,
        };
        if formula.is_placeholder() {
            continue;
        }
        match formula.weight() {
            Some(weight) => {
                spec.molecular_weights.insert(metabolite_id.clone(), weight);
            }
            None => tracing::warn!(
                component = "builder",
                operation = "extract_model",
                metabolite = %metabolite_id,
                "Formula has elements without a known atomic weight"
            ),
        }
    }

    spec.objective = model.objective().clone();
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;

    fn toy_stoichiometry() -> IndexMap<String, IndexMap<String, f64>> {
        let mut stoichiometry = IndexMap::new();
        stoichiometry.insert(
            "R1".to_string(),
            IndexMap::from([("A".to_string(), -1.), ("B".to_string(), 1.)]),
        );
        stoichiometry.insert(
            "R2".to_string(),
            IndexMap::from([("B".to_string(), -1.), ("C".to_string(), 1.)]),
        );
        stoichiometry.insert(
            "growth".to_string(),
            IndexMap::from([("C".to_string(), -1.)]),
        );
        stoichiometry
    }

    #[test]
    fn irreversible_reactions_have_zero_lower_bound() {
        let objective = IndexMap::from([("growth".to_string(), 1.)]);
        let model = build_model(
            &toy_stoichiometry(),
            &[],
            &objective,
            &["A".to_string()],
            100.,
        )
        .unwrap();
        for reaction in model.reactions().values().filter(|r| !r.is_exchange()) {
            assert_eq!(reaction.lower_bound(), 0.);
            assert_eq!(reaction.upper_bound(), 100.);
        }
        let exchange = model.reaction("EX_A").unwrap();
        assert!(exchange.is_exchange());
        assert_eq!(exchange.bounds(), (-100., 100.));
        assert_eq!(exchange.coefficient("A"), -1.);
        assert_eq!(model.metabolites().len(), 3);
        assert_eq!(
            model.metabolite("A").unwrap().compartment.as_deref(),
            Some("c")
        );
    }

    #[test]
    fn reversible_reactions() {
        let objective = IndexMap::from([("growth".to_string(), 1.)]);
        let model = build_model(
            &toy_stoichiometry(),
            &["R2".to_string()],
            &objective,
            &[],
            50.,
        )
        .unwrap();
        assert_eq!(model.reaction("R1").unwrap().bounds(), (0., 50.));
        assert_eq!(model.reaction("R2").unwrap().bounds(), (-50., 50.));
    }

    #[test]
    fn objective_with_unknown_reaction() {
        let objective = IndexMap::from([("biomass".to_string(), 1.)]);
        match build_model(&toy_stoichiometry(), &[], &objective, &[], 100.) {
            Err(ModelError::Configuration(msg)) => assert!(msg.contains("biomass")),
            _ => panic!("Unknown objective reaction not caught"),
        }
    }

    #[test]
    fn empty_reaction() {
        let mut stoichiometry = toy_stoichiometry();
        stoichiometry.insert("empty".to_string(), IndexMap::new());
        let objective = IndexMap::from([("growth".to_string(), 1.)]);
        assert!(matches!(
            build_model(&stoichiometry, &[], &objective, &[], 100.),
            Err(ModelError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_external_molecule() {
        let objective = IndexMap::from([("growth".to_string(), 1.)]);
        assert!(matches!(
            build_model(
                &toy_stoichiometry(),
                &[],
                &objective,
                &["Z".to_string()],
                100.
            ),
            Err(ModelError::Configuration(_))
        ));
    }

    #[test]
    fn declared_exchange_is_reused() {
        let mut stoichiometry = toy_stoichiometry();
        stoichiometry.insert(
            "EX_A".to_string(),
            IndexMap::from([("A".to_string(), -1.)]),
        );
        let objective = IndexMap::from([("growth".to_string(), 1.)]);
        let model =
            build_model(&stoichiometry, &[], &objective, &["A".to_string()], 100.).unwrap();
        let exchange = model.reaction("EX_A").unwrap();
        assert!(exchange.is_exchange());
        // Declared reactions keep the declared bounds
        assert_eq!(exchange.bounds(), (0., 100.));
        assert_eq!(model.reactions().len(), 4);
    }

    #[test]
    fn malformed_declared_exchange() {
        let mut stoichiometry = toy_stoichiometry();
        stoichiometry.insert(
            "EX_A".to_string(),
            IndexMap::from([("A".to_string(), -1.), ("B".to_string(), 1.)]),
        );
        let objective = IndexMap::from([("growth".to_string(), 1.)]);
        assert!(matches!(
            build_model(&stoichiometry, &[], &objective, &["A".to_string()], 100.),
            Err(ModelError::MalformedExchange { .. })
        ));
    }

    #[test]
    fn extract_round_trip() {
        let objective = IndexMap::from([("growth".to_string(), 2.)]);
        let model = build_model(
            &toy_stoichiometry(),
            &["R1".to_string()],
            &objective,
            &["A".to_string()],
            100.,
        )
        .unwrap();
        let spec = extract_model(&model).unwrap();
        assert_eq!(spec.stoichiometry.len(), 4);
        assert_eq!(spec.external_molecules, vec!["A".to_string()]);
        assert_eq!(spec.exchange_reactions.get("A").unwrap(), "EX_A");
        assert_eq!(
            spec.exchange_bounds.get("A"),
            Some(&ExchangeLevel::Interval(-100., 100.))
        );
        assert_eq!(spec.reversible, vec!["R1".to_string(), "EX_A".to_string()]);
        assert_eq!(spec.flux_bounds.get("R2"), Some(&(0., 100.)));
        assert_eq!(spec.objective.get("growth"), Some(&2.));
        // Built metabolites have no formula
        assert!(spec.molecular_weights.is_empty());
    }

    #[test]
    fn extract_molecular_weights() {
        let mut model = Model::new_empty();
        for (id, formula) in [("glc", "C6H12O6"), ("prot", "C5H7NOX"), ("h2o", "H2O")] {
            model.add_metabolite(
                MetaboliteBuilder::default()
                    .id(id.to_string())
                    .formula(Some(formula.to_string()))
                    .build()
                    .unwrap(),
            );
        }
        let spec = extract_model(&model).unwrap();
        assert!(spec.molecular_weights.contains_key("glc"));
        assert!(spec.molecular_weights.contains_key("h2o"));
        assert!(!spec.molecular_weights.contains_key("prot"));
        assert!((spec.molecular_weights["h2o"] - 18.015).abs() < 1e-2);
    }
}
