//! Physical constants and conversions used to turn molar fluxes into mass

/// Avogadro's number, 1/mol
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Femtograms in one gram
pub const FEMTOGRAMS_PER_GRAM: f64 = 1e15;

/// Mass in femtograms of `count` molecules with molecular weight `molecular_weight` (g/mol)
pub fn molecules_to_femtograms(count: f64, molecular_weight: f64) -> f64 {
    let moles = count / AVOGADRO;
    molecular_weight * moles * FEMTOGRAMS_PER_GRAM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_mole_of_water() {
        let grams = molecules_to_femtograms(AVOGADRO, 18.015) / FEMTOGRAMS_PER_GRAM;
        assert!((grams - 18.015).abs() < 1e-9);
    }

    #[test]
    fn single_glucose_molecule() {
        // 180 g/mol / N_A is about 2.99e-22 g, i.e. 2.99e-7 fg
        let fg = molecules_to_femtograms(1., 180.);
        assert!((fg - 2.989e-7).abs() < 1e-9);
    }
}
