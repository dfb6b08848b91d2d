//! Scoped bound changes, restored when the guard goes out of scope
use std::ops::{Deref, DerefMut};

use crate::fba::Fba;
use crate::metabolic_model::model::BoundsSnapshot;

/// Mutable access to an [`Fba`] whose reaction bounds are put back on drop
///
/// The latest solution and flux scaling are not part of the snapshot and keep whatever
/// happened inside the scope.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use fbars_core::configuration::FbaConfigBuilder;
/// use fbars_core::Fba;
/// let config = FbaConfigBuilder::default()
///     .stoichiometry(IndexMap::from([(
///         "growth".to_string(),
///         IndexMap::from([("glc".to_string(), -1.)]),
///     )]))
///     .objective(IndexMap::from([("growth".to_string(), 1.)]))
///     .external_molecules(vec!["glc".to_string()])
///     .default_upper_bound(10.)
///     .build()
///     .unwrap();
/// let mut fba = Fba::new(config).unwrap();
/// {
///     let mut scoped = fba.scoped_bounds();
///     scoped
///         .regulate_flux(&IndexMap::from([("growth".to_string(), false)]))
///         .unwrap();
///     assert!(scoped.model().reaction("growth").unwrap().is_shut_down());
/// }
/// assert_eq!(fba.model().reaction("growth").unwrap().bounds(), (0., 10.));
/// ```
#[derive(Debug)]
pub struct BoundsGuard<'a> {
    fba: &'a mut Fba,
    snapshot: BoundsSnapshot,
}

impl Fba {
    /// Snapshot the bounds and hand out a guard restoring them when dropped
    pub fn scoped_bounds(&mut self) -> BoundsGuard<'_> {
        let snapshot = self.model.snapshot_bounds();
        BoundsGuard {
            fba: self,
            snapshot,
        }
    }

    /// Capture the current bounds of every reaction
    pub fn snapshot_bounds(&self) -> BoundsSnapshot {
        self.model.snapshot_bounds()
    }

    /// Put back bounds captured by [`Fba::snapshot_bounds`]
    pub fn restore_bounds(&mut self, snapshot: &BoundsSnapshot) {
        self.model.restore_bounds(snapshot);
    }
}

impl BoundsGuard<'_> {
    /// Bounds that will be restored
    pub fn snapshot(&self) -> &BoundsSnapshot {
        &self.snapshot
    }
}

impl Deref for BoundsGuard<'_> {
    type Target = Fba;

    fn deref(&self) -> &Fba {
        self.fba
    }
}

impl DerefMut for BoundsGuard<'_> {
    fn deref_mut(&mut self) -> &mut Fba {
        self.fba
    }
}

impl Drop for BoundsGuard<'_> {
    fn drop(&mut self) {
        self.fba.model.restore_bounds(&self.snapshot);
        tracing::debug!(
            component = "guard",
            operation = "restore_bounds",
            "Restored scoped bounds"
        );
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::fba::tests::trivial_config;
    use crate::fba::FbaError;

    #[test]
    fn restores_on_drop() {
        let mut fba = Fba::new(trivial_config()).unwrap();
        let before = fba.snapshot_bounds();
        {
            let mut scoped = fba.scoped_bounds();
            scoped
                .constrain_reaction_bounds(&IndexMap::from([("R".to_string(), (0., 2.))]))
                .unwrap();
            let objective = scoped.optimize().unwrap();
            assert!((objective - 2.).abs() < 1e-5);
            assert_eq!(scoped.snapshot().get("R"), Some((0., 5.)));
        }
        assert_eq!(fba.snapshot_bounds(), before);
        assert!((fba.optimize().unwrap() - 5.).abs() < 1e-5);
    }

    #[test]
    fn restores_after_early_return() {
        fn shut_down_and_fail(fba: &mut Fba) -> Result<(), FbaError> {
            let mut scoped = fba.scoped_bounds();
            scoped.regulate_flux(&IndexMap::from([("EX_M".to_string(), false)]))?;
            scoped.constrain_reaction_bounds(&IndexMap::from([("R".to_string(), (1., 5.))]))?;
            scoped.optimize()?;
            Ok(())
        }
        let mut fba = Fba::new(trivial_config()).unwrap();
        let before = fba.snapshot_bounds();
        assert!(matches!(
            shut_down_and_fail(&mut fba),
            Err(FbaError::InfeasibleModel)
        ));
        assert_eq!(fba.snapshot_bounds(), before);
    }

    #[test]
    fn explicit_snapshot() {
        let mut fba = Fba::new(trivial_config()).unwrap();
        let snapshot = fba.snapshot_bounds();
        fba.regulate_flux(&IndexMap::from([("R".to_string(), false)]))
            .unwrap();
        fba.restore_bounds(&snapshot);
        assert_eq!(fba.model().reaction("R").unwrap().bounds(), (0., 5.));
    }
}
