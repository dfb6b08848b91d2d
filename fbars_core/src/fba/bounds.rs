//! Bound management: raw bound pairs, tolerance banded targets, exchange levels and
//! regulation driven switching
//!
//! Every operation overwrites the bounds of the reactions it names and leaves the rest
//! untouched. Ids not present in the model are skipped.
use indexmap::IndexMap;

use crate::fba::{Fba, FbaError};
use crate::metabolic_model::reaction::{ExchangeLevel, ReactionActivity};

/// (lower, upper) multipliers turning a target flux into bounds
#[derive(Clone, Debug, PartialEq)]
pub struct ToleranceTable {
    default: (f64, f64),
    reactions: IndexMap<String, (f64, f64)>,
}

impl ToleranceTable {
    pub fn new(default: (f64, f64), reactions: IndexMap<String, (f64, f64)>) -> Self {
        ToleranceTable { default, reactions }
    }

    /// Multipliers for a reaction, falling back to the default pair
    pub fn multipliers(&self, reaction_id: &str) -> (f64, f64) {
        self.reactions
            .get(reaction_id)
            .copied()
            .unwrap_or(self.default)
    }

    /// Bounds enclosing `target`, the descaled and sign corrected form of `bound`
    ///
    /// For a non-negative `bound` the multipliers map onto (lower, upper) directly, for a
    /// negative one the mapping is mirrored so the band keeps the same inner and outer edge
    /// relative to zero. The result is always ordered.
    pub fn band(&self, reaction_id: &str, bound: f64, target: f64) -> (f64, f64) {
        let (lower_mult, upper_mult) = self.multipliers(reaction_id);
        let (lower, upper) = if bound >= 0. {
            (lower_mult * target, upper_mult * target)
        } else {
            (upper_mult * target, lower_mult * target)
        };
        (lower.min(upper), lower.max(upper))
    }
}

impl Fba {
    /// Apply exchange levels to every external molecule
    ///
    /// Each molecule gets its override if one is given, else its configured default level.
    /// A `Fixed` override is descaled and only moves the lower bound; an `Interval` sets both
    /// bounds exactly, without scaling. Molecules with neither are left as they are.
    pub fn set_exchange_bounds(
        &mut self,
        overrides: &IndexMap<String, ExchangeLevel>,
    ) -> Result<(), FbaError> {
        for (molecule, level) in overrides {
            if !self.exchange_reactions.contains_key(molecule) {
                tracing::warn!(
                    component = "bounds",
                    operation = "set_exchange_bounds",
                    molecule = %molecule,
                    ?level,
                    "Ignoring level for a molecule without an exchange reaction"
                );
            }
        }
        for (molecule, reaction_id) in &self.exchange_reactions {
            let level = match overrides.get(molecule) {
                Some(ExchangeLevel::Fixed(value)) => {
                    ExchangeLevel::Fixed(self.scaling.descale(*value))
                }
                Some(interval) => *interval,
                None => match self.exchange_bounds.get(molecule) {
                    Some(level) => *level,
                    None => continue,
                },
            };
            let Some(reaction) = self.model.reaction_mut(reaction_id) else {
                continue;
            };
            match level {
                ExchangeLevel::Fixed(lower) => reaction.set_lower_bound(lower)?,
                ExchangeLevel::Interval(lower, upper) => reaction.set_bounds(lower, upper)?,
            }
            tracing::debug!(
                component = "bounds",
                operation = "set_exchange_bounds",
                reaction = %reaction_id,
                lower = reaction.lower_bound(),
                upper = reaction.upper_bound(),
                "Set exchange bounds"
            );
        }
        Ok(())
    }

    /// Constrain reactions to a tolerance band around target fluxes
    ///
    /// Targets are descaled, and negated for exchanges whose targets are given in the
    /// external direction, before the band from the tolerance table is applied.
    pub fn constrain_flux(&mut self, targets: &IndexMap<String, f64>) -> Result<(), FbaError> {
        for (reaction_id, bound) in targets {
            let Some(reaction) = self.model.reaction_mut(reaction_id) else {
                warn_unknown("constrain_flux", reaction_id);
                continue;
            };
            let mut target = self.scaling.descale(*bound);
            if reaction.is_external_flux_reversed() {
                target = -target;
            }
            let (lower, upper) = self.tolerance.band(reaction_id, *bound, target);
            reaction.set_bounds(lower, upper)?;
            tracing::debug!(
                component = "bounds",
                operation = "constrain_flux",
                reaction = %reaction_id,
                target = bound,
                lower,
                upper,
                "Constrained flux"
            );
        }
        Ok(())
    }

    /// Overwrite (lower, upper) bounds, each descaled
    pub fn constrain_reaction_bounds(
        &mut self,
        bounds: &IndexMap<String, (f64, f64)>,
    ) -> Result<(), FbaError> {
        for (reaction_id, (lower, upper)) in bounds {
            let lower = self.scaling.descale(*lower);
            let upper = self.scaling.descale(*upper);
            let Some(reaction) = self.model.reaction_mut(reaction_id) else {
                warn_unknown("constrain_reaction_bounds", reaction_id);
                continue;
            };
            reaction.set_bounds(lower, upper)?;
            tracing::debug!(
                component = "bounds",
                operation = "constrain_reaction_bounds",
                reaction = %reaction_id,
                lower,
                upper,
                "Set reaction bounds"
            );
        }
        Ok(())
    }

    /// Switch reactions on or off
    ///
    /// An inactive reaction has both bounds forced to zero. A reaction switched back on from
    /// zero bounds gets its configured flux bounds if it has any, else
    /// ±default upper bound if it is reversible, else (0, default upper bound), all descaled.
    /// Activating a reaction whose bounds aren't both zero changes nothing.
    pub fn regulate_flux<A>(&mut self, activity: &IndexMap<String, A>) -> Result<(), FbaError>
    where
        A: Into<ReactionActivity> + Copy,
    {
        for (reaction_id, active) in activity {
            let restored = self.restored_bounds(reaction_id);
            let Some(reaction) = self.model.reaction_mut(reaction_id) else {
                warn_unknown("regulate_flux", reaction_id);
                continue;
            };
            match (*active).into() {
                ReactionActivity::Inactive => reaction.shut_down(),
                ReactionActivity::Active if reaction.is_shut_down() => {
                    let (lower, upper) = restored;
                    reaction.set_bounds(lower, upper)?;
                }
                ReactionActivity::Active => continue,
            }
            tracing::debug!(
                component = "bounds",
                operation = "regulate_flux",
                reaction = %reaction_id,
                lower = reaction.lower_bound(),
                upper = reaction.upper_bound(),
                "Regulated reaction"
            );
        }
        Ok(())
    }

    /// Bounds a switched off reaction returns to when it is activated again
    fn restored_bounds(&self, reaction_id: &str) -> (f64, f64) {
        let upper = self.scaling.descale(self.default_upper_bound);
        if let Some((lower, upper)) = self.flux_bounds.get(reaction_id) {
            (self.scaling.descale(*lower), self.scaling.descale(*upper))
        } else if self.reversible.contains(reaction_id) {
            (-upper, upper)
        } else {
            (0., upper)
        }
    }

    pub fn tolerance(&self) -> &ToleranceTable {
        &self.tolerance
    }
}

fn warn_unknown(operation: &str, reaction_id: &str) {
    tracing::warn!(
        component = "bounds",
        operation,
        reaction = %reaction_id,
        "Ignoring unknown reaction"
    );
}
