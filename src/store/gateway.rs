//! The store gateway contract: typed batch operations against the
//! relational store, pulled out as a trait so the ingest coordinator,
//! redundancy analyzer, and query components depend on an interface rather
//! than a concrete `postgres::Client`.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::model::{
    Digest, DigestId, FileDigest, NewPeptide, NewProtein, Peptide, PeptideId, Protease, Protein,
    ProteinDigestId, ProteinId, Taxon, TaxonDigest, TaxonDigestId,
};

/// A definition for a not-yet-resolved digest, as read from CLI/JSON.
pub struct DigestSpec<'a> {
    pub protease_id: &'a str,
    pub cleavage_rule: &'a str,
    pub max_missed_cleavages: u32,
    pub min_acids: usize,
    pub max_acids: Option<usize>,
}

pub trait StoreGateway {
    fn ensure_protease(&mut self, id: &str, cleavage_rule: &str) -> Result<Protease>;

    fn find_or_create_digest(&mut self, spec: &DigestSpec) -> Result<Digest>;

    /// Read-only counterpart of `find_or_create_digest`, for callers (the
    /// redundancy analyzer, query-by-sequence) that must not create a Digest
    /// row themselves — the digest registry is the only component permitted
    /// to insert into those two tables.
    fn find_digest(&mut self, spec: &DigestSpec) -> Result<Option<Digest>>;

    fn file_digest_exists(&mut self, file_hash: &str, digest_id: DigestId) -> Result<bool>;

    fn record_file_digest(
        &mut self,
        file_hash: &str,
        basename: &str,
        digest_id: DigestId,
    ) -> Result<FileDigest>;

    fn find_or_create_taxon(&mut self, id: &str) -> Result<Taxon>;

    fn find_or_create_taxon_digest(
        &mut self,
        taxon_id: &str,
        digest_id: DigestId,
    ) -> Result<TaxonDigest>;

    fn lookup_proteins_by_sequence(
        &mut self,
        sequences: &[String],
    ) -> Result<HashMap<String, Protein>>;

    fn lookup_proteins_already_digested(
        &mut self,
        protein_ids: &[ProteinId],
        digest_id: DigestId,
    ) -> Result<HashSet<ProteinId>>;

    /// Mirrors `lookup_proteins_by_sequence`, for the peptide probe during
    /// a sub-batch flush.
    fn lookup_peptides_by_sequence(
        &mut self,
        sequences: &[String],
    ) -> Result<HashMap<String, Peptide>>;

    fn bulk_insert_proteins(&mut self, rows: &[NewProtein]) -> Result<Vec<Protein>>;

    fn bulk_insert_peptides(&mut self, rows: &[NewPeptide]) -> Result<Vec<Peptide>>;

    /// Returns the `ProteinDigestId` assigned to each `(protein_id, digest_id)` pair,
    /// in input order.
    fn bulk_insert_protein_digests(
        &mut self,
        rows: &[(ProteinId, DigestId)],
    ) -> Result<Vec<ProteinDigestId>>;

    fn bulk_insert_protein_digest_peptides(
        &mut self,
        rows: &[(ProteinDigestId, PeptideId, i64)],
    ) -> Result<()>;

    fn bulk_insert_taxon_proteins(
        &mut self,
        rows: &[(String, ProteinId, String)],
    ) -> Result<()>;

    fn bulk_insert_taxon_digest_peptides(
        &mut self,
        rows: &[(TaxonDigestId, PeptideId, i64)],
    ) -> Result<()>;

    /// Aggregates `ProteinDigestPeptide.count` grouped by peptide for the
    /// given taxon+digest and persists the results as `TaxonDigestPeptide`
    /// rows under `taxon_digest_id`, `batch_size` peptides at a time via a
    /// store-side cursor. Read and write share one cursor-scoped
    /// transaction, which is also why this is a single gateway operation
    /// rather than a read-then-write pair done from the caller: a
    /// caller-held cursor and a caller-issued write both need `&mut self`
    /// at once. `on_batch` receives the row count written in each batch,
    /// for progress reporting only.
    fn aggregate_and_store_taxon_digest_peptides(
        &mut self,
        taxon_id: &str,
        digest_id: DigestId,
        taxon_digest_id: TaxonDigestId,
        batch_size: i64,
        on_batch: &mut dyn FnMut(usize) -> Result<()>,
    ) -> Result<()>;

    fn delete_taxon_cascade(&mut self, taxon_id: &str) -> Result<()>;

    /// Peptide sequences within `max_distance` of `query`, joined to their
    /// taxa, for query-by-sequence.
    fn query_peptides_by_distance(
        &mut self,
        query: &str,
        max_distance: u32,
        on_match: &mut dyn FnMut(&str, &str, u32) -> Result<()>,
    ) -> Result<()>;

    fn individual_peptide_count(&mut self, taxon_digest_id: TaxonDigestId) -> Result<i64>;

    fn common_peptide_count(&mut self, taxon_digest_ids: &[TaxonDigestId]) -> Result<i64>;

    fn union_peptide_count(&mut self, taxon_digest_ids: &[TaxonDigestId]) -> Result<i64>;

    fn find_taxon_digests(
        &mut self,
        digest_id: DigestId,
        taxon_ids: &[String],
    ) -> Result<Vec<(Taxon, TaxonDigest)>>;
}
