//! Monoisotopic residue masses, keyed by one-letter amino acid code, for the
//! 20 canonical residues.

/// Monoisotopic mass in Da, 5 decimal places.
pub fn monoisotopic_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'G' => 57.02146,
        'A' => 71.03711,
        'S' => 87.03203,
        'P' => 97.05276,
        'V' => 99.06841,
        'T' => 101.04768,
        'C' => 103.00919,
        'L' | 'I' => 113.08406,
        'N' => 114.04293,
        'D' => 115.02694,
        'Q' => 128.05858,
        'K' => 128.09496,
        'E' => 129.04259,
        'M' => 131.04049,
        'H' => 137.05891,
        'F' => 147.06841,
        'R' => 156.10111,
        'Y' => 163.06333,
        'W' => 186.07931,
        _ => return None,
    };
    Some(mass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_residues_resolve() {
        assert_eq!(monoisotopic_mass('G'), Some(57.02146));
        assert_eq!(monoisotopic_mass('W'), Some(186.07931));
    }

    #[test]
    fn unknown_residue_is_none() {
        assert_eq!(monoisotopic_mass('X'), None);
        assert_eq!(monoisotopic_mass('B'), None);
    }
}
