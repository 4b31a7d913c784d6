//! Bounded edit-distance peptide lookup, CSV-formatted to stdout. The store
//! gateway computes the distance in-process via `query_peptides_by_distance`,
//! which calls back into this module's Levenshtein implementation.

use std::io::Write;

use crate::error::Result;
use crate::store::StoreGateway;

/// Minimum single-character edit count to transform `a` into `b` (Glossary).
/// Classic O(|a|·|b|) dynamic-programming table, single-row rolling buffer.
pub fn levenshtein(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<u32> = (0..=b.len() as u32).collect();
    let mut current = vec![0u32; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i as u32 + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[derive(Debug, Clone, serde::Serialize)]
struct QueryMatch {
    query: String,
    taxon: String,
    lev_distance: u32,
    #[serde(rename = "match")]
    peptide: String,
}

/// Runs query-by-sequence for every query in `queries`, writing CSV
/// (header `query,taxon,lev_distance,match`) to `out`.
pub fn query_by_sequence(
    gateway: &mut dyn StoreGateway,
    queries: &[String],
    max_distance: u32,
    out: &mut dyn Write,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for query in queries {
        gateway.query_peptides_by_distance(query, max_distance, &mut |taxon, peptide, distance| {
            writer
                .serialize(QueryMatch {
                    query: query.clone(),
                    taxon: taxon.to_owned(),
                    lev_distance: distance,
                    peptide: peptide.to_owned(),
                })
                .map_err(|err| crate::error::Error::Other(format!("csv write failed: {err}")))
        })?;
    }
    writer
        .flush()
        .map_err(|err| crate::error::Error::Other(format!("csv flush failed: {err}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_zero_distance() {
        assert_eq!(levenshtein("PEPTIDE", "PEPTIDE"), 0);
    }

    #[test]
    fn single_substitution() {
        assert_eq!(levenshtein("KITTEN", "SITTEN"), 1);
    }

    #[test]
    fn classic_kitten_sitting() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn empty_strings() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("ABC", ""), 3);
    }
}
