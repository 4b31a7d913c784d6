//! Exercises the redundancy analyzer and query-by-sequence against an
//! in-memory `StoreGateway`, so the scenarios don't need a live Postgres.

use std::collections::{HashMap, HashSet};

use pepdigest::model::{
    Digest, DigestId, FileDigest, NewPeptide, NewProtein, Peptide, PeptideId, Protease, Protein,
    ProteinDigestId, ProteinId, Taxon, TaxonDigest, TaxonDigestId,
};
use pepdigest::query::query_by_sequence;
use pepdigest::redundancy::compute_redundancy_tables;
use pepdigest::store::{DigestSpec, StoreGateway};
use pepdigest::Result;

#[derive(Default)]
struct FakeGateway {
    taxon_digests: Vec<(Taxon, TaxonDigest)>,
    membership: HashMap<TaxonDigestId, HashSet<PeptideId>>,
    peptides_by_taxon: HashMap<String, Vec<Peptide>>,
}

impl StoreGateway for FakeGateway {
    fn ensure_protease(&mut self, _id: &str, _cleavage_rule: &str) -> Result<Protease> {
        unimplemented!("not exercised by these tests")
    }

    fn find_or_create_digest(&mut self, _spec: &DigestSpec) -> Result<Digest> {
        unimplemented!("not exercised by these tests")
    }

    fn find_digest(&mut self, _spec: &DigestSpec) -> Result<Option<Digest>> {
        unimplemented!("not exercised by these tests")
    }

    fn file_digest_exists(&mut self, _file_hash: &str, _digest_id: DigestId) -> Result<bool> {
        unimplemented!("not exercised by these tests")
    }

    fn record_file_digest(
        &mut self,
        _file_hash: &str,
        _basename: &str,
        _digest_id: DigestId,
    ) -> Result<FileDigest> {
        unimplemented!("not exercised by these tests")
    }

    fn find_or_create_taxon(&mut self, _id: &str) -> Result<Taxon> {
        unimplemented!("not exercised by these tests")
    }

    fn find_or_create_taxon_digest(
        &mut self,
        _taxon_id: &str,
        _digest_id: DigestId,
    ) -> Result<TaxonDigest> {
        unimplemented!("not exercised by these tests")
    }

    fn lookup_proteins_by_sequence(
        &mut self,
        _sequences: &[String],
    ) -> Result<HashMap<String, Protein>> {
        unimplemented!("not exercised by these tests")
    }

    fn lookup_proteins_already_digested(
        &mut self,
        _protein_ids: &[ProteinId],
        _digest_id: DigestId,
    ) -> Result<HashSet<ProteinId>> {
        unimplemented!("not exercised by these tests")
    }

    fn lookup_peptides_by_sequence(
        &mut self,
        _sequences: &[String],
    ) -> Result<HashMap<String, Peptide>> {
        unimplemented!("not exercised by these tests")
    }

    fn bulk_insert_proteins(&mut self, _rows: &[NewProtein]) -> Result<Vec<Protein>> {
        unimplemented!("not exercised by these tests")
    }

    fn bulk_insert_peptides(&mut self, _rows: &[NewPeptide]) -> Result<Vec<Peptide>> {
        unimplemented!("not exercised by these tests")
    }

    fn bulk_insert_protein_digests(
        &mut self,
        _rows: &[(ProteinId, DigestId)],
    ) -> Result<Vec<ProteinDigestId>> {
        unimplemented!("not exercised by these tests")
    }

    fn bulk_insert_protein_digest_peptides(
        &mut self,
        _rows: &[(ProteinDigestId, PeptideId, i64)],
    ) -> Result<()> {
        unimplemented!("not exercised by these tests")
    }

    fn bulk_insert_taxon_proteins(&mut self, _rows: &[(String, ProteinId, String)]) -> Result<()> {
        unimplemented!("not exercised by these tests")
    }

    fn bulk_insert_taxon_digest_peptides(
        &mut self,
        _rows: &[(TaxonDigestId, PeptideId, i64)],
    ) -> Result<()> {
        unimplemented!("not exercised by these tests")
    }

    fn aggregate_and_store_taxon_digest_peptides(
        &mut self,
        _taxon_id: &str,
        _digest_id: DigestId,
        _taxon_digest_id: TaxonDigestId,
        _batch_size: i64,
        _on_batch: &mut dyn FnMut(usize) -> Result<()>,
    ) -> Result<()> {
        unimplemented!("not exercised by these tests")
    }

    fn delete_taxon_cascade(&mut self, _taxon_id: &str) -> Result<()> {
        unimplemented!("not exercised by these tests")
    }

    fn query_peptides_by_distance(
        &mut self,
        query: &str,
        max_distance: u32,
        on_match: &mut dyn FnMut(&str, &str, u32) -> Result<()>,
    ) -> Result<()> {
        let mut taxa: Vec<&String> = self.peptides_by_taxon.keys().collect();
        taxa.sort();
        for taxon_id in taxa {
            for peptide in &self.peptides_by_taxon[taxon_id] {
                let distance = pepdigest::query::levenshtein(query, &peptide.sequence);
                if distance <= max_distance {
                    on_match(taxon_id, &peptide.sequence, distance)?;
                }
            }
        }
        Ok(())
    }

    fn individual_peptide_count(&mut self, taxon_digest_id: TaxonDigestId) -> Result<i64> {
        Ok(self
            .membership
            .get(&taxon_digest_id)
            .map(|set| set.len() as i64)
            .unwrap_or(0))
    }

    fn common_peptide_count(&mut self, taxon_digest_ids: &[TaxonDigestId]) -> Result<i64> {
        let mut sets = taxon_digest_ids
            .iter()
            .map(|id| self.membership.get(id).cloned().unwrap_or_default());
        let mut acc = sets.next().unwrap_or_default();
        for set in sets {
            acc = acc.intersection(&set).copied().collect();
        }
        Ok(acc.len() as i64)
    }

    fn union_peptide_count(&mut self, taxon_digest_ids: &[TaxonDigestId]) -> Result<i64> {
        let mut acc: HashSet<PeptideId> = HashSet::new();
        for id in taxon_digest_ids {
            if let Some(set) = self.membership.get(id) {
                acc.extend(set.iter().copied());
            }
        }
        Ok(acc.len() as i64)
    }

    fn find_taxon_digests(
        &mut self,
        _digest_id: DigestId,
        taxon_ids: &[String],
    ) -> Result<Vec<(Taxon, TaxonDigest)>> {
        Ok(self
            .taxon_digests
            .iter()
            .filter(|(taxon, _)| taxon_ids.contains(&taxon.id))
            .cloned()
            .collect())
    }
}

/// Scenario 5: peptide `p` assigned to taxon-digest `td` iff `p % td == 0`,
/// for `td` in `{1,2,3}` and `p` in `{1..12}`.
fn peptide_taxon_digest_fixture() -> FakeGateway {
    let digest_id = DigestId(1);
    let mut gateway = FakeGateway::default();
    for td in 1..=3i64 {
        let taxon_id = format!("td{td}");
        gateway.taxon_digests.push((
            Taxon {
                id: taxon_id.clone(),
            },
            TaxonDigest {
                id: TaxonDigestId(td),
                taxon_id,
                digest_id,
            },
        ));
        let members: HashSet<PeptideId> = (1..=12i64)
            .filter(|p| p % td == 0)
            .map(PeptideId)
            .collect();
        gateway.membership.insert(TaxonDigestId(td), members);
    }
    gateway
}

#[test]
fn redundancy_common_counts_match_fixture() {
    let mut gateway = peptide_taxon_digest_fixture();
    let taxon_ids = vec!["td1".to_owned(), "td2".to_owned(), "td3".to_owned()];
    let tables = compute_redundancy_tables(&mut gateway, DigestId(1), &taxon_ids).unwrap();

    let common = |a: &str, b: &str| {
        tables
            .intersection_counts
            .iter()
            .find(|(x, y, _)| (x == a && y == b) || (x == b && y == a))
            .map(|(_, _, count)| *count)
            .unwrap()
    };
    assert_eq!(common("td1", "td2"), 6);
    assert_eq!(common("td1", "td3"), 4);
    assert_eq!(common("td2", "td3"), 2);

    let individual = |taxon: &str| {
        tables
            .individual_counts
            .iter()
            .find(|(id, _)| id == taxon)
            .map(|(_, count)| *count)
            .unwrap()
    };
    assert_eq!(individual("td1"), 12);
    assert_eq!(individual("td2"), 6);
    assert_eq!(individual("td3"), 4);
}

#[test]
fn redundancy_three_way_common_count() {
    let mut gateway = peptide_taxon_digest_fixture();
    let count = gateway
        .common_peptide_count(&[TaxonDigestId(1), TaxonDigestId(2), TaxonDigestId(3)])
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn redundancy_skips_unknown_taxon() {
    let mut gateway = peptide_taxon_digest_fixture();
    let taxon_ids = vec!["td1".to_owned(), "nonexistent".to_owned()];
    let tables = compute_redundancy_tables(&mut gateway, DigestId(1), &taxon_ids).unwrap();
    assert_eq!(tables.individual_counts.len(), 1);
    assert_eq!(tables.individual_counts[0].0, "td1");
}

/// Scenario 6: a peptide shared by two taxa, queried at `max_distance = 0`.
#[test]
fn query_by_sequence_exact_match_across_taxa() {
    let mut gateway = FakeGateway::default();
    let peptide = Peptide {
        id: PeptideId(1),
        sequence: "Q".to_owned(),
        mass: 0.0,
    };
    gateway
        .peptides_by_taxon
        .insert("A".to_owned(), vec![peptide.clone()]);
    gateway.peptides_by_taxon.insert("B".to_owned(), vec![peptide]);

    let mut out = Vec::new();
    query_by_sequence(&mut gateway, &["Q".to_owned()], 0, &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("query,taxon,lev_distance,match"));
    assert_eq!(lines.next(), Some("Q,A,0,Q"));
    assert_eq!(lines.next(), Some("Q,B,0,Q"));
    assert_eq!(lines.next(), None);
}
