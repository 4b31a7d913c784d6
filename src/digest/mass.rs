//! A pure function from an amino-acid sequence to its monoisotopic mass.

use crate::digest::amino_acid::monoisotopic_mass;
use crate::error::Error;

/// Sum of monoisotopic residue masses. Fails with `BadResidue` on the first
/// residue not present in the mass table.
pub fn sequence_mass(sequence: &str) -> Result<f64, Error> {
    let mut mass = 0.0;
    for residue in sequence.chars() {
        match monoisotopic_mass(residue) {
            Some(residue_mass) => mass += residue_mass,
            None => {
                return Err(Error::BadResidue {
                    residue,
                    prefix: sequence.chars().take(12).collect(),
                })
            }
        }
    }
    Ok(mass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_of_one_of_each_residue() {
        let mass = sequence_mass("ARNDCEQGHILKMFPSTWYV").unwrap();
        assert!((mass - 2376.11432).abs() < 1e-5);
    }

    #[test]
    fn mass_is_pure_function_of_sequence() {
        let a = sequence_mass("PEPTIDE").unwrap();
        let b = sequence_mass("PEPTIDE").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_residue_fails() {
        let err = sequence_mass("PEPTIXDE").unwrap_err();
        assert!(matches!(err, Error::BadResidue { residue: 'X', .. }));
    }

    #[test]
    fn empty_sequence_has_zero_mass() {
        assert_eq!(sequence_mass("").unwrap(), 0.0);
    }
}
