use indexmap::IndexMap;

use fbars_core::configuration::{FbaConfig, FbaConfigBuilder};
use fbars_core::metabolic_model::reaction::ExchangeLevel;
use fbars_core::Fba;

fn stoichiometry(entries: &[(&str, &[(&str, f64)])]) -> IndexMap<String, IndexMap<String, f64>> {
    entries
        .iter()
        .map(|(reaction, chemistry)| {
            (
                reaction.to_string(),
                chemistry
                    .iter()
                    .map(|(metabolite, coefficient)| (metabolite.to_string(), *coefficient))
                    .collect(),
            )
        })
        .collect()
}

/// glc and o2 are taken up, converted to biomass precursor P, which growth consumes
fn small_network() -> FbaConfig {
    FbaConfigBuilder::default()
        .stoichiometry(stoichiometry(&[
            ("respire", &[("glc", -1.), ("o2", -2.), ("P", 1.)][..]),
            ("growth", &[("P", -1.)][..]),
        ]))
        .objective(IndexMap::from([("growth".to_string(), 1.)]))
        .external_molecules(vec!["glc".to_string(), "o2".to_string()])
        .exchange_bounds(IndexMap::from([
            ("glc".to_string(), ExchangeLevel::Fixed(-10.)),
            ("o2".to_string(), ExchangeLevel::Fixed(-15.)),
        ]))
        .molecular_weights(IndexMap::from([
            ("glc".to_string(), 180.16),
            ("o2".to_string(), 32.),
            ("P".to_string(), 244.16),
        ]))
        .default_upper_bound(100.)
        .build()
        .unwrap()
}

#[test]
fn irreversible_reactions_start_at_zero() {
    let fba = Fba::new(small_network()).unwrap();
    for id in fba.internal_reactions() {
        assert_eq!(fba.model().reaction(&id).unwrap().lower_bound(), 0.);
    }
    // Oxygen limits respiration to 7.5
    assert!((fba.objective_value() - 7.5).abs() < 1e-5);
}

#[test]
fn regulation_round_trip() {
    let mut fba = Fba::new(small_network()).unwrap();
    let before = fba.model().reaction("respire").unwrap().bounds();
    assert_eq!(before, (0., 100.));
    fba.regulate_flux(&IndexMap::from([("respire".to_string(), false)]))
        .unwrap();
    assert!(fba.optimize().unwrap().abs() < 1e-6);
    fba.regulate_flux(&IndexMap::from([("respire".to_string(), true)]))
        .unwrap();
    assert_eq!(fba.model().reaction("respire").unwrap().bounds(), before);
}

#[test]
fn constrain_flux_is_idempotent() {
    let mut fba = Fba::new(small_network()).unwrap();
    let targets = IndexMap::from([
        ("growth".to_string(), 3.),
        ("EX_glc".to_string(), 4.),
        ("respire".to_string(), -1.),
    ]);
    fba.constrain_flux(&targets).unwrap();
    let first = fba.get_reaction_bounds::<&str>(&[]);
    fba.constrain_flux(&targets).unwrap();
    assert_eq!(fba.get_reaction_bounds::<&str>(&[]), first);
}

#[test]
fn scaling_hits_target_added_mass() {
    let mut config = small_network();
    config.target_added_mass = Some(3.5e-6);
    let mut fba = Fba::new(config).unwrap();
    fba.optimize().unwrap();
    let added = fba.get_added_mass().unwrap();
    let scaled = added * fba.flux_scaling().factor();
    assert!((scaled - 3.5e-6).abs() < 1e-6 * 3.5e-6);
}

#[test]
fn trivial_model_is_bounded_by_reaction() {
    let config = FbaConfigBuilder::default()
        .stoichiometry(stoichiometry(&[("R", &[("M", -1.)][..])]))
        .objective(IndexMap::from([("R".to_string(), 1.)]))
        .external_molecules(vec!["M".to_string()])
        .flux_bounds(IndexMap::from([
            ("R".to_string(), (0., 5.)),
            ("EX_M".to_string(), (-10., 10.)),
        ]))
        .build()
        .unwrap();
    let mut fba = Fba::new(config).unwrap();
    assert!((fba.optimize().unwrap() - 5.).abs() < 1e-5);
    assert!((fba.objective_value() - 5.).abs() < 1e-5);
}

#[test]
fn exchange_readout_keys() {
    let fba = Fba::new(small_network()).unwrap();
    let by_molecule = fba.read_exchange_fluxes();
    let by_reaction = fba.read_exchange_reactions();
    assert_eq!(by_molecule.len(), 2);
    assert_eq!(by_reaction.len(), 2);
    assert!(by_molecule.keys().all(|k| !k.starts_with("EX_")));
    assert!(by_reaction.keys().all(|k| k.starts_with("EX_")));
    for (molecule, flux) in &by_molecule {
        let reaction_id = &fba.exchange_reactions()[molecule];
        assert!((by_reaction[reaction_id] - flux).abs() < 1e-12);
    }
}

#[test]
fn interval_bypasses_scaling() {
    let mut config = small_network();
    config.target_added_mass = Some(1e-3);
    let mut fba = Fba::new(config).unwrap();
    assert!((fba.flux_scaling().factor() - 1.).abs() > 1e-3);
    fba.set_exchange_bounds(&IndexMap::from([(
        "glc".to_string(),
        ExchangeLevel::Interval(-7., 2.),
    )]))
    .unwrap();
    assert_eq!(fba.model().reaction("EX_glc").unwrap().bounds(), (-7., 2.));

    // A fixed level is descaled
    fba.set_exchange_bounds(&IndexMap::from([(
        "glc".to_string(),
        ExchangeLevel::Fixed(-7.),
    )]))
    .unwrap();
    let factor = fba.flux_scaling().factor();
    let lower = fba.model().reaction("EX_glc").unwrap().lower_bound();
    assert!((lower + 7. / factor).abs() < 1e-12);
}

#[test]
fn minimal_medium_of_network() {
    let fba = Fba::new(small_network()).unwrap();
    let medium = fba.minimal_external().unwrap();
    // 7.5 growth needs 7.5 glucose and 15 oxygen
    assert!((medium["glc"] - 7.5).abs() < 1e-4);
    assert!((medium["o2"] - 15.).abs() < 1e-4);
}

#[test]
fn scoped_changes_are_rolled_back() {
    let mut fba = Fba::new(small_network()).unwrap();
    let before = fba.get_reaction_bounds::<&str>(&[]);
    {
        let mut scoped = fba.scoped_bounds();
        scoped
            .constrain_flux(&IndexMap::from([("EX_o2".to_string(), 2.)]))
            .unwrap();
        assert!(scoped.optimize().unwrap() < 1.01);
    }
    assert_eq!(fba.get_reaction_bounds::<&str>(&[]), before);
}

#[test]
fn configuration_from_json() {
    let config = FbaConfig::from_json_str(
        r#"{
"stoichiometry": {"growth": {"glc": -1.0}},
"objective": {"growth": 1.0},
"external_molecules": ["glc"],
"exchange_bounds": {"glc": [-3.0, 0.0]},
"default_upper_bound": 50.0
}"#,
    )
    .unwrap();
    let fba = Fba::new(config).unwrap();
    assert!((fba.objective_value() - 3.).abs() < 1e-5);
    assert_eq!(fba.model().reaction("growth").unwrap().bounds(), (0., 50.));
}
