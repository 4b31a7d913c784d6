//! Per-file ingest driver: checksum & skip, taxon resolution, batched
//! protein processing, final taxon-level aggregation. Single-threaded and
//! cooperative within one file; batches are bounded so memory use doesn't
//! track file size.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use onig::Regex;

use crate::checksum::checksum_file;
use crate::digest::{cleave, sequence_mass};
use crate::error::{Error, Result};
use crate::ingest::fasta::{count_records, FastaReader, FastaRecord};
use crate::model::{Digest, DigestId, NewPeptide, NewProtein, Peptide, PeptideId, Protein, ProteinDigestId, ProteinId};
use crate::store::StoreGateway;

pub struct IngestConfig {
    /// Proteins accumulated per batch before digesting.
    pub protein_batch_size: usize,
    /// Peptide-count threshold that triggers a sub-batch flush.
    pub peptide_flush_threshold: usize,
    /// Chunk size for probing existing peptides by sequence.
    pub probe_chunk_size: usize,
    /// Chunk size for bulk-inserting ProteinDigestPeptide rows.
    pub protein_digest_peptide_chunk_size: usize,
    /// Batch size for the final taxon-level aggregation cursor.
    pub taxon_aggregate_batch_size: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            protein_batch_size: 500,
            peptide_flush_threshold: 10_000,
            probe_chunk_size: 500,
            protein_digest_peptide_chunk_size: 10_000,
            taxon_aggregate_batch_size: 10_000,
        }
    }
}

/// Fixed retry cap for `Error::StoreTransient` failures, applied at batch
/// boundaries. Protein/Peptide creation is a natural-key upsert, so redoing
/// a batch after a transient failure is safe. Exhaustion propagates the
/// error, which aborts the whole file.
const MAX_STORE_RETRIES: u32 = 3;

fn with_retry<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(Error::StoreTransient(err)) => {
                attempt += 1;
                if attempt >= MAX_STORE_RETRIES {
                    return Err(Error::StoreTransient(err));
                }
                log::warn!(
                    "transient store error (attempt {attempt}/{MAX_STORE_RETRIES}), retrying batch: {err}"
                );
            }
            Err(err) => return Err(err),
        }
    }
}

/// Ingests one FASTA file under `digest`, using `cleavage_rule` as the
/// compiled regex for that digest's protease.
pub fn ingest_file(
    gateway: &mut dyn StoreGateway,
    path: &Path,
    digest: &Digest,
    cleavage_rule: &Regex,
    config: &IngestConfig,
) -> Result<()> {
    let file_hash = checksum_file(path)
        .map_err(|err| Error::Other(format!("could not checksum '{}': {err}", path.display())))?;

    if gateway.file_digest_exists(&file_hash, digest.id)? {
        log::info!("skipping '{}': already digested under this digest", path.display());
        return Ok(());
    }

    let taxon_id = taxon_id_from_path(path)?;
    log::info!("ingesting '{}' as taxon '{}'", path.display(), taxon_id);

    gateway.find_or_create_taxon(&taxon_id)?;
    let taxon_digest = gateway.find_or_create_taxon_digest(&taxon_id, digest.id)?;

    let total_records = count_records(path)
        .map_err(|err| Error::Other(format!("could not scan '{}': {err}", path.display())))?;
    log::info!("{} protein records in '{}'", total_records, path.display());

    let reader = FastaReader::open(path)
        .map_err(|err| Error::Other(format!("could not open '{}': {err}", path.display())))?;

    let mut batch = Vec::with_capacity(config.protein_batch_size);
    let mut processed = 0usize;
    for record in reader {
        let record = record.map_err(|err| Error::Parse {
            file: path.display().to_string(),
            reason: err.to_string(),
        })?;
        batch.push(record);
        if batch.len() >= config.protein_batch_size {
            processed += batch.len();
            with_retry(|| process_protein_batch(&mut *gateway, &taxon_id, &batch, digest, cleavage_rule, config))?;
            log::info!(
                "{} of {} ({:.1}%) proteins processed in '{}'",
                processed,
                total_records,
                100.0 * processed as f64 / total_records.max(1) as f64,
                path.display()
            );
            batch.clear();
        }
    }
    if !batch.is_empty() {
        processed += batch.len();
        with_retry(|| process_protein_batch(&mut *gateway, &taxon_id, &batch, digest, cleavage_rule, config))?;
        log::info!(
            "{} of {} ({:.1}%) proteins processed in '{}'",
            processed,
            total_records,
            100.0 * processed as f64 / total_records.max(1) as f64,
            path.display()
        );
    }

    let mut aggregated = 0usize;
    with_retry(|| {
        aggregated = 0;
        gateway.aggregate_and_store_taxon_digest_peptides(
            &taxon_id,
            digest.id,
            taxon_digest.id,
            config.taxon_aggregate_batch_size,
            &mut |count| {
                aggregated += count;
                log::info!("{} taxon-digest peptide rows aggregated for '{}'", aggregated, taxon_id);
                Ok(())
            },
        )
    })?;

    // Checkpoint last: TaxonProtein inserts and the aggregation above must
    // both be durable before this row exists, so a crash mid-file is
    // detected by its absence and the whole file retried.
    with_retry(|| gateway.record_file_digest(&file_hash, &basename(path), digest.id))?;
    log::info!("finished '{}'", path.display());
    Ok(())
}

fn taxon_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_owned())
        .ok_or_else(|| Error::Other(format!("could not derive taxon id from '{}'", path.display())))
}

fn basename(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_owned()
}

/// Protein batch processing: lookup, create, digest, and link a taxon to
/// every protein in one batch.
fn process_protein_batch(
    gateway: &mut dyn StoreGateway,
    taxon_id: &str,
    batch: &[FastaRecord],
    digest: &Digest,
    cleavage_rule: &Regex,
    config: &IngestConfig,
) -> Result<()> {
    let sequences: Vec<String> = batch.iter().map(|r| r.sequence.clone()).collect();

    // Step 1-2: partition into new / already-present, then digested / undigested.
    let existing = gateway.lookup_proteins_by_sequence(&sequences)?;
    let mut new_sequences: Vec<String> = sequences
        .iter()
        .filter(|seq| !existing.contains_key(*seq))
        .cloned()
        .collect();
    new_sequences.sort();
    new_sequences.dedup();

    let existing_ids: Vec<ProteinId> = existing.values().map(|protein| protein.id).collect();
    let already_digested = gateway.lookup_proteins_already_digested(&existing_ids, digest.id)?;

    // Step 3: create new Protein rows; these are treated as undigested.
    let mut new_rows = Vec::with_capacity(new_sequences.len());
    for sequence in &new_sequences {
        let mass = sequence_mass(sequence)?;
        new_rows.push(NewProtein { sequence: sequence.clone(), mass });
    }
    let inserted = gateway.bulk_insert_proteins(&new_rows)?;

    let mut protein_by_sequence: HashMap<String, Protein> = HashMap::new();
    protein_by_sequence.extend(existing.into_iter());
    for protein in inserted {
        protein_by_sequence.insert(protein.sequence.clone(), protein);
    }

    // Step 4: every undigested protein (unique by sequence) gets a
    // ProteinDigest row, then is run through the Cleaver.
    let mut unique_undigested: Vec<(ProteinId, String)> = Vec::new();
    let mut seen = HashSet::new();
    for sequence in &sequences {
        let protein = protein_by_sequence
            .get(sequence)
            .ok_or_else(|| Error::Other(format!("protein '{sequence}' missing after insert")))?;
        if !seen.insert(protein.id) {
            continue;
        }
        let is_new = new_sequences.binary_search(sequence).is_ok();
        if is_new || !already_digested.contains(&protein.id) {
            unique_undigested.push((protein.id, sequence.clone()));
        }
    }

    let protein_digest_pairs: Vec<(ProteinId, DigestId)> = unique_undigested
        .iter()
        .map(|(id, _)| (*id, digest.id))
        .collect();
    let protein_digest_ids = gateway.bulk_insert_protein_digests(&protein_digest_pairs)?;

    let mut sub_batch: Vec<(ProteinDigestId, HashMap<String, i64>)> = Vec::new();
    let mut sub_batch_peptide_count = 0usize;

    for ((_, sequence), protein_digest_id) in unique_undigested.iter().zip(protein_digest_ids) {
        let peptides = cleave(
            sequence,
            cleavage_rule,
            digest.max_missed_cleavages,
            digest.min_acids,
            digest.max_acids,
        );
        let mut histogram: HashMap<String, i64> = HashMap::new();
        for peptide in peptides {
            *histogram.entry(peptide).or_insert(0) += 1;
        }
        sub_batch_peptide_count += histogram.len();
        sub_batch.push((protein_digest_id, histogram));
        if sub_batch_peptide_count >= config.peptide_flush_threshold {
            flush_peptide_sub_batch(gateway, &sub_batch, config)?;
            sub_batch.clear();
            sub_batch_peptide_count = 0;
        }
    }
    if !sub_batch.is_empty() {
        flush_peptide_sub_batch(gateway, &sub_batch, config)?;
    }

    // Step 5: every (header, sequence) in the batch gets a TaxonProtein row,
    // regardless of whether the protein already existed.
    let mut taxon_protein_rows = Vec::with_capacity(batch.len());
    for record in batch {
        let protein = protein_by_sequence.get(&record.sequence).ok_or_else(|| {
            Error::Other(format!("protein '{}' missing after insert", record.sequence))
        })?;
        taxon_protein_rows.push((taxon_id.to_owned(), protein.id, record.header.clone()));
    }
    gateway.bulk_insert_taxon_proteins(&taxon_protein_rows)?;

    Ok(())
}

/// Peptide sub-batch flush: probe, insert missing peptides, and link them
/// to their protein digests.
fn flush_peptide_sub_batch(
    gateway: &mut dyn StoreGateway,
    sub_batch: &[(ProteinDigestId, HashMap<String, i64>)],
    config: &IngestConfig,
) -> Result<()> {
    // Step 1: union all peptide sequences across the sub-batch.
    let mut all_sequences: HashSet<String> = HashSet::new();
    for (_, histogram) in sub_batch {
        all_sequences.extend(histogram.keys().cloned());
    }
    let all_sequences: Vec<String> = all_sequences.into_iter().collect();

    // Step 2: probe the store in chunks.
    let mut existing: HashMap<String, Peptide> = HashMap::new();
    for chunk in all_sequences.chunks(config.probe_chunk_size) {
        let found = gateway.lookup_peptides_by_sequence(chunk)?;
        existing.extend(found);
    }

    // Step 3: bulk-insert the missing peptides.
    let missing: Vec<String> = all_sequences
        .iter()
        .filter(|seq| !existing.contains_key(*seq))
        .cloned()
        .collect();
    if !missing.is_empty() {
        let mut new_rows = Vec::with_capacity(missing.len());
        for sequence in &missing {
            let mass = sequence_mass(sequence)?;
            new_rows.push(NewPeptide { sequence: sequence.clone(), mass });
        }
        let inserted = gateway.bulk_insert_peptides(&new_rows)?;
        // Step 4: re-probe to complete `existing` for the newly inserted ones.
        for peptide in inserted {
            existing.insert(peptide.sequence.clone(), peptide);
        }
    }

    // Step 5: materialize ProteinDigestPeptide rows and bulk-insert in chunks.
    let mut rows: Vec<(ProteinDigestId, PeptideId, i64)> = Vec::new();
    for (protein_digest_id, histogram) in sub_batch {
        for (sequence, count) in histogram {
            let peptide = existing
                .get(sequence)
                .ok_or_else(|| Error::Other(format!("peptide '{sequence}' missing after insert")))?;
            rows.push((*protein_digest_id, peptide.id, *count));
        }
    }
    for chunk in rows.chunks(config.protein_digest_peptide_chunk_size) {
        gateway.bulk_insert_protein_digest_peptides(chunk)?;
    }

    Ok(())
}
