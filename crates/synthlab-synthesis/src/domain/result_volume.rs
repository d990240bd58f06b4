//! Result-volume formula.
//!
//! ```text
//! Vk = (c * Vs * ρs * Mk) / (ρk * Ms) * n
//! ```
//!
//! `c` is the order's purity as a fraction, `Vs` the line's starting-material
//! volume, `ρs`/`Ms` the starting material's density and molar mass, `ρk`/`Mk`
//! the result material's, and `n` the line quantity.

use synthlab_catalog::domain::reaction::Reaction;
use synthlab_core::error::DomainError;

/// The catalog constants the formula reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionConstants {
    /// ρs, g/cm³.
    pub starting_density: f64,
    /// Ms, g/mol.
    pub starting_molar_mass: f64,
    /// ρk, g/cm³.
    pub result_density: f64,
    /// Mk, g/mol.
    pub result_molar_mass: f64,
}

impl From<&Reaction> for ReactionConstants {
    fn from(reaction: &Reaction) -> Self {
        Self {
            starting_density: reaction.starting_material.density,
            starting_molar_mass: reaction.starting_material.molar_mass,
            result_density: reaction.result_material.density,
            result_molar_mass: reaction.result_material.molar_mass,
        }
    }
}

/// Computes the result-material volume of one line.
///
/// # Errors
///
/// Returns `DomainError::Computation` if `ρk · Ms` is zero or not a normal
/// number, or if the result is not finite. Corrupt catalog data is never
/// turned into a zero volume.
pub fn compute_result_volume(
    purity_percent: f64,
    volume_sm: f64,
    constants: &ReactionConstants,
    quantity: u32,
) -> Result<f64, DomainError> {
    let denominator = constants.result_density * constants.starting_molar_mass;
    if !denominator.is_normal() {
        return Err(DomainError::Computation(format!(
            "result density ({}) times starting molar mass ({}) must be non-zero",
            constants.result_density, constants.starting_molar_mass
        )));
    }

    let purity = purity_percent / 100.0;
    let numerator =
        purity * volume_sm * constants.starting_density * constants.result_molar_mass;
    let volume = numerator / denominator * f64::from(quantity);

    if volume.is_finite() {
        Ok(volume)
    } else {
        Err(DomainError::Computation(format!(
            "result volume is not a finite number ({volume})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> ReactionConstants {
        ReactionConstants {
            starting_density: 1.0,
            starting_molar_mass: 100.0,
            result_density: 2.0,
            result_molar_mass: 200.0,
        }
    }

    #[test]
    fn test_reference_example() {
        let volume = compute_result_volume(50.0, 10.0, &constants(), 1).unwrap();

        assert!((volume - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_scales_with_quantity() {
        let volume = compute_result_volume(50.0, 10.0, &constants(), 3).unwrap();

        assert!((volume - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_result_density_is_a_computation_error() {
        let mut c = constants();
        c.result_density = 0.0;

        let result = compute_result_volume(50.0, 10.0, &c, 1);

        match result.unwrap_err() {
            DomainError::Computation(msg) => assert!(msg.contains("result density")),
            other => panic!("expected Computation, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_starting_molar_mass_is_a_computation_error() {
        let mut c = constants();
        c.starting_molar_mass = 0.0;

        assert!(matches!(
            compute_result_volume(50.0, 10.0, &c, 1),
            Err(DomainError::Computation(_))
        ));
    }

    #[test]
    fn test_overflow_is_a_computation_error() {
        let mut c = constants();
        c.result_molar_mass = f64::MAX;
        c.starting_density = f64::MAX;

        assert!(matches!(
            compute_result_volume(100.0, 10.0, &c, 1),
            Err(DomainError::Computation(_))
        ));
    }

    #[test]
    fn test_zero_source_volume_gives_zero() {
        let volume = compute_result_volume(80.0, 0.0, &constants(), 2).unwrap();

        assert!(volume.abs() < f64::EPSILON);
    }
}
