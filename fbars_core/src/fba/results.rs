//! Readouts derived from the model and its latest solution
use indexmap::{IndexMap, IndexSet};

use crate::fba::{Fba, FbaError};
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::flux_analysis;
use crate::units::molecules_to_femtograms;

/// Fraction of the maximal objective the minimal medium may fall short of
const MEDIUM_OBJECTIVE_SLACK: f64 = 1e-6;

impl Fba {
    /// Latest fluxes of the given reactions in external units
    ///
    /// Ids without a flux are skipped; without a recorded solution the map is empty.
    pub fn read_fluxes<S: AsRef<str>>(&self, reaction_ids: &[S]) -> IndexMap<String, f64> {
        let Some(solution) = &self.solution else {
            return IndexMap::new();
        };
        reaction_ids
            .iter()
            .filter_map(|id| {
                let id = id.as_ref();
                solution
                    .flux(id)
                    .map(|flux| (id.to_string(), self.scaling.scale(flux)))
            })
            .collect()
    }

    /// Latest exchange fluxes keyed by the exchanged molecule
    pub fn read_exchange_fluxes(&self) -> IndexMap<String, f64> {
        let fluxes = self.read_exchange_reactions();
        self.exchange_reactions
            .iter()
            .filter_map(|(molecule, reaction_id)| {
                fluxes.get(reaction_id).map(|flux| (molecule.clone(), *flux))
            })
            .collect()
    }

    /// Latest exchange fluxes keyed by exchange reaction id
    pub fn read_exchange_reactions(&self) -> IndexMap<String, f64> {
        self.read_fluxes(&self.external_reactions())
    }

    /// Latest fluxes of every non-exchange reaction
    pub fn read_internal_fluxes(&self) -> IndexMap<String, f64> {
        self.read_fluxes(&self.internal_reactions())
    }

    /// Ids of the exchange reactions, in molecule order
    pub fn external_reactions(&self) -> Vec<String> {
        self.exchange_reactions.values().cloned().collect()
    }

    /// Ids of every reaction which isn't an exchange reaction
    pub fn internal_reactions(&self) -> Vec<String> {
        let external: IndexSet<&String> = self.exchange_reactions.values().collect();
        self.model
            .reactions()
            .keys()
            .filter(|id| !external.contains(id))
            .cloned()
            .collect()
    }

    pub fn reaction_ids(&self) -> Vec<String> {
        self.model.reactions().keys().cloned().collect()
    }

    /// The named reactions, or every reaction if `reaction_ids` is empty
    pub fn get_reactions<S: AsRef<str>>(&self, reaction_ids: &[S]) -> IndexMap<String, &Reaction> {
        if reaction_ids.is_empty() {
            return self
                .model
                .reactions()
                .iter()
                .map(|(id, reaction)| (id.clone(), reaction))
                .collect();
        }
        reaction_ids
            .iter()
            .filter_map(|id| {
                let id = id.as_ref();
                self.model
                    .reaction(id)
                    .map(|reaction| (id.to_string(), reaction))
            })
            .collect()
    }

    /// Current (lower, upper) bounds in solver native units, every reaction if
    /// `reaction_ids` is empty
    pub fn get_reaction_bounds<S: AsRef<str>>(
        &self,
        reaction_ids: &[S],
    ) -> IndexMap<String, (f64, f64)> {
        self.get_reactions(reaction_ids)
            .into_iter()
            .map(|(id, reaction)| (id, reaction.bounds()))
            .collect()
    }

    /// Mass (fg) added by the objective per unit time at unit scaling
    pub fn get_added_mass(&self) -> Result<f64, FbaError> {
        self.added_mass_over(1.)
    }

    /// Mass (fg) added by the objective over `timestep` at unit scaling
    ///
    /// Runs a fresh maximization under the current bounds. Every metabolite consumed by an
    /// objective reaction contributes its molecular weight times the number of molecules
    /// consumed; metabolites without a molecular weight are skipped.
    pub fn added_mass_over(&self, timestep: f64) -> Result<f64, FbaError> {
        let objective_value =
            flux_analysis::slim_optimize(&self.model, self.solver.as_ref())? * timestep;
        let mut added_mass = 0.;
        for (reaction_id, weight) in self.model.objective() {
            let Some(reaction) = self.model.reaction(reaction_id) else {
                continue;
            };
            for (metabolite_id, coefficient) in reaction.metabolites() {
                if *coefficient >= 0. {
                    continue;
                }
                let Some(molecular_weight) = self.molecular_weights.get(metabolite_id) else {
                    tracing::debug!(
                        component = "results",
                        operation = "added_mass",
                        metabolite = %metabolite_id,
                        "Skipping metabolite without molecular weight"
                    );
                    continue;
                };
                let count = -weight * coefficient * objective_value;
                added_mass += molecules_to_femtograms(count, *molecular_weight);
            }
        }
        Ok(added_mass)
    }

    /// Smallest uptake per external molecule sustaining the maximal objective, in external
    /// units
    ///
    /// Only molecules which must be taken up appear; values are positive uptake amounts.
    pub fn minimal_external(&self) -> Result<IndexMap<String, f64>, FbaError> {
        let max_objective = flux_analysis::slim_optimize(&self.model, self.solver.as_ref())?;
        let min_objective = max_objective - MEDIUM_OBJECTIVE_SLACK * max_objective.abs().max(1.);
        let medium = flux_analysis::minimal_medium(
            &self.model,
            self.solver.as_ref(),
            &self.exchange_reactions,
            min_objective,
        )?;
        Ok(medium
            .into_iter()
            .map(|(molecule, uptake)| (molecule, self.scaling.scale(uptake)))
            .collect())
    }

    /// Net stoichiometry of the objective: metabolite to Σ objective weight × coefficient
    pub fn objective_composition(&self) -> IndexMap<String, f64> {
        let mut composition: IndexMap<String, f64> = IndexMap::new();
        for (reaction_id, weight) in self.model.objective() {
            let Some(reaction) = self.model.reaction(reaction_id) else {
                continue;
            };
            for (metabolite_id, coefficient) in reaction.metabolites() {
                *composition.entry(metabolite_id.clone()).or_insert(0.) += weight * coefficient;
            }
        }
        composition
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::configuration::FbaConfigBuilder;
    use crate::fba::tests::trivial_config;
    use crate::units::AVOGADRO;

    fn toy_fba() -> Fba {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("toy_model.json");
        Fba::new(FbaConfigBuilder::default().model_path(path).build().unwrap()).unwrap()
    }

    #[test]
    fn flux_readouts() {
        let fba = Fba::new(trivial_config()).unwrap();
        let fluxes = fba.read_fluxes(&["R", "EX_M", "missing"]);
        assert_eq!(fluxes.len(), 2);
        assert!((fluxes["R"] - 5.).abs() < 1e-5);
        assert!((fluxes["EX_M"] + 5.).abs() < 1e-5);

        let internal = fba.read_internal_fluxes();
        assert_eq!(internal.keys().collect::<Vec<_>>(), vec!["R"]);
        assert_eq!(fba.external_reactions(), vec!["EX_M".to_string()]);
        assert_eq!(fba.internal_reactions(), vec!["R".to_string()]);
        assert_eq!(fba.reaction_ids().len(), 2);
    }

    #[test]
    fn exchange_keys() {
        let fba = toy_fba();
        let by_molecule = fba.read_exchange_fluxes();
        let by_reaction = fba.read_exchange_reactions();
        assert_eq!(by_molecule.len(), by_reaction.len());
        assert!(by_molecule.keys().all(|k| !k.starts_with("EX_")));
        assert!(by_reaction.keys().all(|k| k.starts_with("EX_")));
        assert!((by_molecule["nh4_e"] + 4.).abs() < 1e-5);
        assert!((by_reaction["EX_nh4_e"] + 4.).abs() < 1e-5);
    }

    #[test]
    fn reaction_lookup() {
        let fba = toy_fba();
        assert_eq!(fba.get_reactions::<&str>(&[]).len(), 4);
        let bounds = fba.get_reaction_bounds(&["EX_glc__D_e", "missing"]);
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds["EX_glc__D_e"], (-10., 1000.));
    }

    #[test]
    fn added_mass() {
        let mut config = trivial_config();
        config.molecular_weights.insert("M".to_string(), 180.);
        let fba = Fba::new(config).unwrap();
        let expected = 5. * 180. / AVOGADRO * 1e15;
        let added = fba.get_added_mass().unwrap();
        assert!((added - expected).abs() < 1e-5 * expected);
        let over_two = fba.added_mass_over(2.).unwrap();
        assert!((over_two - 2. * added).abs() < 1e-12 * over_two);
    }

    #[test]
    fn toy_added_mass_skips_unweighted() {
        let fba = toy_fba();
        // BIOMASS consumes glucose (C6H12O6) and ammonium (H4N) at 8 per unit time
        let glucose = fba.molecular_weights()["glc__D_e"];
        let ammonium = fba.molecular_weights()["nh4_e"];
        let expected = (8. * glucose + 4. * ammonium) / AVOGADRO * 1e15;
        let added = fba.get_added_mass().unwrap();
        assert!((added - expected).abs() < 1e-5 * expected);
    }

    #[test]
    fn minimal_external_uptake() {
        let fba = toy_fba();
        let medium = fba.minimal_external().unwrap();
        assert!((medium["glc__D_e"] - 8.).abs() < 1e-4);
        assert!((medium["nh4_e"] - 4.).abs() < 1e-4);
    }

    #[test]
    fn composition() {
        let fba = toy_fba();
        let composition = fba.objective_composition();
        assert!((composition["glc__D_e"] + 1.).abs() < 1e-12);
        assert!((composition["nh4_e"] + 0.5).abs() < 1e-12);
        assert!((composition["prot_c"] - 1.).abs() < 1e-12);
    }

    #[test]
    fn no_solution_reads_empty() {
        let mut config = trivial_config();
        config.flux_bounds.insert("R".to_string(), (1., 5.));
        config.exchange_bounds.insert(
            "M".to_string(),
            crate::metabolic_model::reaction::ExchangeLevel::Interval(0., 0.),
        );
        let fba = Fba::new(config).unwrap();
        assert!(fba.read_fluxes(&["R"]).is_empty());
        assert!(fba.read_exchange_fluxes().is_empty());
    }
}
