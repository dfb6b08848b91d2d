//! Flux scaling between solver native units and an external target rate
use crate::fba::{Fba, FbaError};

/// Positive factor relating solver native fluxes to external fluxes
///
/// External values are divided by the factor on their way into the model and solver
/// values are multiplied by it on their way out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluxScaling {
    factor: f64,
    calibrated: bool,
}

impl Default for FluxScaling {
    fn default() -> Self {
        FluxScaling {
            factor: 1.,
            calibrated: false,
        }
    }
}

impl FluxScaling {
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Whether the factor was derived from a target
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// External to solver native units
    pub fn descale(&self, value: f64) -> f64 {
        value / self.factor
    }

    /// Solver native to external units
    pub fn scale(&self, value: f64) -> f64 {
        value * self.factor
    }
}

impl Fba {
    /// Calibrate the flux scaling so the objective adds `target_added_mass` femtograms per
    /// unit time
    ///
    /// The factor is `target_added_mass / get_added_mass()`, with the added mass measured at
    /// unit scaling. Calling this again replaces the factor.
    ///
    /// # Returns
    /// The new factor. `FbaError::InvalidScalingTarget` if the target isn't a positive finite
    /// mass, `FbaError::DegenerateScaling` if the added mass is zero or the factor wouldn't
    /// be a positive finite number.
    pub fn set_target(&mut self, target_added_mass: f64) -> Result<f64, FbaError> {
        if !(target_added_mass.is_finite() && target_added_mass > 0.) {
            return Err(FbaError::InvalidScalingTarget { target_added_mass });
        }
        let added_mass = self.get_added_mass()?;
        let factor = target_added_mass / added_mass;
        if added_mass == 0. || !factor.is_finite() || factor <= 0. {
            return Err(FbaError::DegenerateScaling { added_mass });
        }
        if self.scaling.calibrated {
            tracing::warn!(
                component = "scaling",
                operation = "set_target",
                previous = self.scaling.factor,
                factor,
                "Replacing calibrated flux scaling"
            );
        }
        self.scaling = FluxScaling {
            factor,
            calibrated: true,
        };
        tracing::debug!(
            component = "scaling",
            operation = "set_target",
            target_added_mass,
            added_mass,
            factor,
            "Calibrated flux scaling"
        );
        Ok(factor)
    }

    pub fn flux_scaling(&self) -> FluxScaling {
        self.scaling
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::configuration::{FbaConfig, FbaConfigBuilder};
    use crate::fba::tests::trivial_config;

    fn weighted_config() -> FbaConfig {
        let mut config = trivial_config();
        config.molecular_weights = IndexMap::from([("M".to_string(), 180.)]);
        config
    }

    #[test]
    fn default_is_identity() {
        let scaling = FluxScaling::default();
        assert_eq!(scaling.factor(), 1.);
        assert!(!scaling.is_calibrated());
        assert_eq!(scaling.descale(3.), 3.);
    }

    #[test]
    fn calibrates_to_target() {
        let mut fba = Fba::new(weighted_config()).unwrap();
        let factor = fba.set_target(1e-5).unwrap();
        assert!(fba.flux_scaling().is_calibrated());
        assert!((fba.flux_scaling().factor() - factor).abs() < 1e-20);
        let added = fba.get_added_mass().unwrap();
        assert!((added * factor - 1e-5).abs() < 1e-10);
    }

    #[test]
    fn target_from_configuration() {
        let mut config = weighted_config();
        config.target_added_mass = Some(2e-6);
        let mut fba = Fba::new(config).unwrap();
        fba.optimize().unwrap();
        let added = fba.get_added_mass().unwrap();
        assert!((added * fba.flux_scaling().factor() - 2e-6).abs() < 1e-11);
    }

    #[test]
    fn second_target_replaces() {
        let mut fba = Fba::new(weighted_config()).unwrap();
        let first = fba.set_target(1e-5).unwrap();
        let second = fba.set_target(2e-5).unwrap();
        // Added mass is measured at unit scaling, so the factor doesn't compound
        assert!((second - 2. * first).abs() < 1e-9 * second);
    }

    #[test]
    fn zero_added_mass_is_degenerate() {
        // No molecular weights, so no mass is ever added
        let mut fba = Fba::new(trivial_config()).unwrap();
        assert!(matches!(
            fba.set_target(1.),
            Err(FbaError::DegenerateScaling { added_mass }) if added_mass == 0.
        ));
        assert!(!fba.flux_scaling().is_calibrated());
    }

    #[test]
    fn non_positive_target_is_rejected() {
        let mut fba = Fba::new(weighted_config()).unwrap();
        for target in [0., -1e-5, f64::NAN] {
            assert!(matches!(
                fba.set_target(target),
                Err(FbaError::InvalidScalingTarget { .. })
            ));
        }
        assert!(!fba.flux_scaling().is_calibrated());
        assert_eq!(fba.flux_scaling().factor(), 1.);
    }

    #[test]
    fn scaled_readouts() {
        let config = FbaConfigBuilder::default()
            .stoichiometry(weighted_config().stoichiometry)
            .objective(weighted_config().objective)
            .external_molecules(vec!["M".to_string()])
            .flux_bounds(IndexMap::from([("R".to_string(), (0., 5.))]))
            .molecular_weights(IndexMap::from([("M".to_string(), 180.)]))
            .default_upper_bound(10.)
            .target_added_mass(1e-5)
            .build()
            .unwrap();
        let mut fba = Fba::new(config).unwrap();
        let factor = fba.flux_scaling().factor();
        fba.optimize().unwrap();
        // Bounds written before calibration stay in native units
        assert!((fba.objective_value() - 5. * factor).abs() < 1e-5 * factor);
        let fluxes = fba.read_fluxes(&["R"]);
        assert!((fluxes["R"] - 5. * factor).abs() < 1e-5 * factor);
        // Later bounds are descaled
        fba.constrain_reaction_bounds(&IndexMap::from([("R".to_string(), (0., factor))]))
            .unwrap();
        let (_, upper) = fba.model().reaction("R").unwrap().bounds();
        assert!((upper - 1.).abs() < 1e-9);
    }
}
