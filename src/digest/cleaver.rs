//! A deterministic cleavage algorithm: find cut positions with a regex, then
//! slide a window of width `max_missed + 2` over them to enumerate every
//! peptide up to the missed-cleavage and length bounds.

use onig::Regex;

/// Ordered, duplicate-retaining list of peptide substrings produced by
/// cutting `sequence` with `rule` and allowing up to `max_missed` missed
/// cleavages, filtered to `[min_acids, max_acids]` (open-ended above when
/// `max_acids` is `None`).
pub fn cleave(
    sequence: &str,
    rule: &Regex,
    max_missed: u32,
    min_acids: usize,
    max_acids: Option<usize>,
) -> Vec<String> {
    let cut_positions = cut_positions(sequence, rule);
    let window = max_missed as usize + 2;
    let mut peptides = Vec::new();

    for j in 1..cut_positions.len() {
        let first_i = j.saturating_sub(window - 1);
        for i in first_i..j {
            let start = cut_positions[i];
            let end = cut_positions[j];
            if start == end {
                continue;
            }
            let len = end - start;
            if len < min_acids {
                continue;
            }
            if let Some(max) = max_acids {
                if len > max {
                    continue;
                }
            }
            peptides.push(sequence[start..end].to_owned());
        }
    }
    peptides
}

/// `[0, e1, e2, ..., en, len(sequence)]` where each `ei` is the end index of
/// the i-th non-overlapping match of `rule`.
fn cut_positions(sequence: &str, rule: &Regex) -> Vec<usize> {
    let mut positions = vec![0usize];
    for (_, end) in rule.find_iter(sequence) {
        if *positions.last().unwrap() != end {
            positions.push(end);
        }
    }
    if *positions.last().unwrap() != sequence.len() {
        positions.push(sequence.len());
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trypsin_rule() -> Regex {
        Regex::new(r"([KR](?=[^P]))|((?<=W)K(?=P))|((?<=M)R(?=P))").unwrap()
    }

    #[test]
    fn no_missed_cleavages() {
        let rule = trypsin_rule();
        let peptides = cleave("AKAKBK", &rule, 0, 0, None);
        assert_eq!(peptides, vec!["AK", "AK", "BK"]);
    }

    #[test]
    fn two_missed_cleavages() {
        let rule = trypsin_rule();
        let peptides = cleave("AKAKBKCK", &rule, 2, 0, None);
        assert_eq!(
            peptides,
            vec!["AK", "AKAK", "AK", "AKAKBK", "AKBK", "BK", "AKBKCK", "BKCK", "CK"]
        );
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        let rule = trypsin_rule();
        assert!(cleave("", &rule, 0, 0, None).is_empty());
    }

    #[test]
    fn no_cut_sites_yields_whole_sequence() {
        let rule = trypsin_rule();
        let peptides = cleave("AAAAAA", &rule, 0, 0, None);
        assert_eq!(peptides, vec!["AAAAAA"]);
    }

    #[test]
    fn length_bounds_filter_peptides() {
        let rule = trypsin_rule();
        let peptides = cleave("AKAKBKCK", &rule, 2, 3, Some(4));
        for p in &peptides {
            assert!(p.len() >= 3 && p.len() <= 4);
        }
        assert!(peptides.contains(&"AKAK".to_string()));
        assert!(!peptides.contains(&"AK".to_string()));
    }

    #[test]
    fn trypsin_does_not_cut_before_proline() {
        let rule = trypsin_rule();
        let peptides = cleave("AKPAK", &rule, 0, 0, None);
        assert_eq!(peptides, vec!["AKPAK"]);
    }

    #[test]
    fn trypsin_cuts_wk_before_proline_exception() {
        let rule = trypsin_rule();
        let peptides = cleave("AWKPA", &rule, 0, 0, None);
        assert_eq!(peptides, vec!["AWK", "PA"]);
    }
}
