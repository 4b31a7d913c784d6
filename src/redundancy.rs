//! Pairwise peptide-set comparisons over a fixed set of taxon-digest
//! groupings: individual counts, intersection counts, and both percent
//! views (union and per-taxon), computed for every unordered pair.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::DigestId;
use crate::store::StoreGateway;

pub struct RedundancyTables {
    /// `(taxon_id, count)`, ordered by taxon id.
    pub individual_counts: Vec<(String, i64)>,
    /// `(taxon_a, taxon_b, count)` for unordered pairs, `a` before `b`.
    pub intersection_counts: Vec<(String, String, i64)>,
    pub union_percents: Vec<(String, String, f64)>,
    /// `(taxon_a, taxon_b, percent)` for ordered pairs: `100 * |a∩b| / |a|`.
    pub individual_percents: Vec<(String, String, f64)>,
}

/// Computes all four tables for the given digest over `taxon_ids`. Taxon
/// ids with no TaxonDigest under this digest are warned about and skipped,
/// not treated as a hard failure.
pub fn compute_redundancy_tables(
    gateway: &mut dyn StoreGateway,
    digest_id: DigestId,
    taxon_ids: &[String],
) -> Result<RedundancyTables> {
    let mut resolved = gateway.find_taxon_digests(digest_id, taxon_ids)?;
    resolved.sort_by(|(a, _), (b, _)| a.id.cmp(&b.id));

    let resolved_ids: std::collections::HashSet<&str> =
        resolved.iter().map(|(t, _)| t.id.as_str()).collect();
    for taxon_id in taxon_ids {
        if !resolved_ids.contains(taxon_id.as_str()) {
            log::warn!("unknown taxon '{taxon_id}' for this digest, skipping");
        }
    }

    let mut individual_counts = Vec::with_capacity(resolved.len());
    let mut counts_by_taxon: HashMap<String, i64> = HashMap::new();
    for (taxon, taxon_digest) in &resolved {
        let count = gateway.individual_peptide_count(taxon_digest.id)?;
        individual_counts.push((taxon.id.clone(), count));
        counts_by_taxon.insert(taxon.id.clone(), count);
    }

    let mut intersection_counts = Vec::new();
    let mut union_percents = Vec::new();
    let mut individual_percents = Vec::new();

    for i in 0..resolved.len() {
        for j in (i + 1)..resolved.len() {
            let (taxon_a, digest_a) = &resolved[i];
            let (taxon_b, digest_b) = &resolved[j];
            let pair = [digest_a.id, digest_b.id];
            let intersection = gateway.common_peptide_count(&pair)?;
            let union = gateway.union_peptide_count(&pair)?;

            intersection_counts.push((taxon_a.id.clone(), taxon_b.id.clone(), intersection));

            let union_percent = if union == 0 {
                0.0
            } else {
                100.0 * intersection as f64 / union as f64
            };
            union_percents.push((taxon_a.id.clone(), taxon_b.id.clone(), union_percent));

            let count_a = counts_by_taxon[&taxon_a.id];
            let count_b = counts_by_taxon[&taxon_b.id];
            if count_a > 0 {
                individual_percents.push((
                    taxon_a.id.clone(),
                    taxon_b.id.clone(),
                    100.0 * intersection as f64 / count_a as f64,
                ));
            }
            if count_b > 0 {
                individual_percents.push((
                    taxon_b.id.clone(),
                    taxon_a.id.clone(),
                    100.0 * intersection as f64 / count_b as f64,
                ));
            }
        }
    }

    Ok(RedundancyTables {
        individual_counts,
        intersection_counts,
        union_percents,
        individual_percents,
    })
}

/// Writes the four named CSV files into `output_dir`.
pub fn write_csv_files(tables: &RedundancyTables, output_dir: &Path) -> Result<()> {
    write_pairs_i64(
        &output_dir.join("individual_counts.csv"),
        &["taxon", "count"],
        tables.individual_counts.iter().map(|(t, c)| (t.clone(), None, Some(*c), None)),
    )?;
    write_pairs_i64(
        &output_dir.join("intersection_counts.csv"),
        &["taxon_a", "taxon_b", "count"],
        tables
            .intersection_counts
            .iter()
            .map(|(a, b, c)| (a.clone(), Some(b.clone()), Some(*c), None)),
    )?;
    write_pairs_i64(
        &output_dir.join("union_percents.csv"),
        &["taxon_a", "taxon_b", "percent"],
        tables
            .union_percents
            .iter()
            .map(|(a, b, p)| (a.clone(), Some(b.clone()), None, Some(*p))),
    )?;
    write_pairs_i64(
        &output_dir.join("individual_percents.csv"),
        &["taxon_a", "taxon_b", "percent"],
        tables
            .individual_percents
            .iter()
            .map(|(a, b, p)| (a.clone(), Some(b.clone()), None, Some(*p))),
    )?;
    Ok(())
}

/// Writes one CSV with either one or two taxon columns followed by a count
/// or percent column, depending on which of the last two fields is `Some`.
fn write_pairs_i64(
    path: &Path,
    header: &[&str],
    rows: impl Iterator<Item = (String, Option<String>, Option<i64>, Option<f64>)>,
) -> Result<()> {
    let file = File::create(path)
        .map_err(|err| Error::Other(format!("could not create '{}': {err}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(header)
        .map_err(|err| Error::Other(format!("csv write failed: {err}")))?;
    for (a, b, count, percent) in rows {
        let mut record = vec![a];
        if let Some(b) = b {
            record.push(b);
        }
        if let Some(count) = count {
            record.push(count.to_string());
        }
        if let Some(percent) = percent {
            record.push(format!("{percent:.4}"));
        }
        writer
            .write_record(&record)
            .map_err(|err| Error::Other(format!("csv write failed: {err}")))?;
    }
    writer
        .flush()
        .map_err(|err| Error::Other(format!("csv flush failed: {err}")))?;
    Ok(())
}
