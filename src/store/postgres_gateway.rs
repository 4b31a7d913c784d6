//! Postgres-backed store gateway. Built on the synchronous `postgres` 0.19
//! API (`Client`/`Transaction`): `row.get::<_, T>(0)` for column access, and
//! `ON CONFLICT DO NOTHING RETURNING id` extended to its bulk, multi-row
//! form via `UNNEST`.

use std::collections::{HashMap, HashSet};

use postgres::Client;

use crate::error::{Error, Result};
use crate::model::{
    Digest, DigestId, FileDigest, NewPeptide, NewProtein, Peptide, PeptideId, Protease, Protein,
    ProteinDigestId, ProteinId, Taxon, TaxonDigest, TaxonDigestId,
};
use crate::store::gateway::{DigestSpec, StoreGateway};

pub struct PostgresGateway {
    client: Client,
}

impl PostgresGateway {
    pub fn connect(database_url: &str) -> Result<Self> {
        let client = Client::connect(database_url, postgres::NoTls)
            .map_err(Error::from_postgres)?;
        Ok(PostgresGateway { client })
    }

    pub fn from_client(client: Client) -> Self {
        PostgresGateway { client }
    }
}

impl StoreGateway for PostgresGateway {
    fn ensure_protease(&mut self, id: &str, cleavage_rule: &str) -> Result<Protease> {
        self.client
            .execute(
                "INSERT INTO proteases (id, cleavage_rule) VALUES ($1, $2) \
                 ON CONFLICT (id) DO NOTHING",
                &[&id, &cleavage_rule],
            )
            .map_err(Error::from_postgres)?;
        let row = self
            .client
            .query_one("SELECT id, cleavage_rule FROM proteases WHERE id = $1", &[&id])
            .map_err(Error::from_postgres)?;
        Ok(Protease {
            id: row.get(0),
            cleavage_rule: row.get(1),
        })
    }

    fn find_or_create_digest(&mut self, spec: &DigestSpec) -> Result<Digest> {
        self.ensure_protease(spec.protease_id, spec.cleavage_rule)?;
        let max_acids: Option<i64> = spec.max_acids.map(|v| v as i64);
        let mut txn = self.client.transaction().map_err(Error::from_postgres)?;
        let existing = txn
            .query_opt(
                "SELECT id FROM digests \
                 WHERE protease_id = $1 AND max_missed_cleavages = $2 \
                   AND min_acids = $3 AND max_acids IS NOT DISTINCT FROM $4",
                &[
                    &spec.protease_id,
                    &(spec.max_missed_cleavages as i32),
                    &(spec.min_acids as i64),
                    &max_acids,
                ],
            )
            .map_err(Error::from_postgres)?;
        let id: i64 = match existing {
            Some(row) => row.get(0),
            None => {
                let row = txn
                    .query_one(
                        "INSERT INTO digests \
                         (protease_id, max_missed_cleavages, min_acids, max_acids) \
                         VALUES ($1, $2, $3, $4) RETURNING id",
                        &[
                            &spec.protease_id,
                            &(spec.max_missed_cleavages as i32),
                            &(spec.min_acids as i64),
                            &max_acids,
                        ],
                    )
                    .map_err(Error::from_postgres)?;
                row.get(0)
            }
        };
        txn.commit().map_err(Error::from_postgres)?;
        Ok(Digest {
            id: DigestId(id),
            protease_id: spec.protease_id.to_owned(),
            max_missed_cleavages: spec.max_missed_cleavages,
            min_acids: spec.min_acids,
            max_acids: spec.max_acids,
        })
    }

    fn find_digest(&mut self, spec: &DigestSpec) -> Result<Option<Digest>> {
        let max_acids: Option<i64> = spec.max_acids.map(|v| v as i64);
        let row = self
            .client
            .query_opt(
                "SELECT id FROM digests \
                 WHERE protease_id = $1 AND max_missed_cleavages = $2 \
                   AND min_acids = $3 AND max_acids IS NOT DISTINCT FROM $4",
                &[
                    &spec.protease_id,
                    &(spec.max_missed_cleavages as i32),
                    &(spec.min_acids as i64),
                    &max_acids,
                ],
            )
            .map_err(Error::from_postgres)?;
        Ok(row.map(|row| Digest {
            id: DigestId(row.get(0)),
            protease_id: spec.protease_id.to_owned(),
            max_missed_cleavages: spec.max_missed_cleavages,
            min_acids: spec.min_acids,
            max_acids: spec.max_acids,
        }))
    }

    fn file_digest_exists(&mut self, file_hash: &str, digest_id: DigestId) -> Result<bool> {
        let row = self
            .client
            .query_opt(
                "SELECT 1 FROM file_digests WHERE file_id = $1 AND digest_id = $2",
                &[&file_hash, &digest_id.0],
            )
            .map_err(Error::from_postgres)?;
        Ok(row.is_some())
    }

    fn record_file_digest(
        &mut self,
        file_hash: &str,
        basename: &str,
        digest_id: DigestId,
    ) -> Result<FileDigest> {
        let mut txn = self.client.transaction().map_err(Error::from_postgres)?;
        txn.execute(
            "INSERT INTO files (id, basename) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            &[&file_hash, &basename],
        )
        .map_err(Error::from_postgres)?;
        txn.execute(
            "INSERT INTO file_digests (file_id, digest_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
            &[&file_hash, &digest_id.0],
        )
        .map_err(Error::from_postgres)?;
        txn.commit().map_err(Error::from_postgres)?;
        Ok(FileDigest {
            file_hash: file_hash.to_owned(),
            digest_id,
        })
    }

    fn find_or_create_taxon(&mut self, id: &str) -> Result<Taxon> {
        self.client
            .execute(
                "INSERT INTO taxons (id) VALUES ($1) ON CONFLICT (id) DO NOTHING",
                &[&id],
            )
            .map_err(Error::from_postgres)?;
        Ok(Taxon { id: id.to_owned() })
    }

    fn find_or_create_taxon_digest(
        &mut self,
        taxon_id: &str,
        digest_id: DigestId,
    ) -> Result<TaxonDigest> {
        let mut txn = self.client.transaction().map_err(Error::from_postgres)?;
        let existing = txn
            .query_opt(
                "SELECT id FROM taxon_digests WHERE taxon_id = $1 AND digest_id = $2",
                &[&taxon_id, &digest_id.0],
            )
            .map_err(Error::from_postgres)?;
        let id: i64 = match existing {
            Some(row) => row.get(0),
            None => {
                let row = txn
                    .query_one(
                        "INSERT INTO taxon_digests (taxon_id, digest_id) VALUES ($1, $2) \
                         RETURNING id",
                        &[&taxon_id, &digest_id.0],
                    )
                    .map_err(Error::from_postgres)?;
                row.get(0)
            }
        };
        txn.commit().map_err(Error::from_postgres)?;
        Ok(TaxonDigest {
            id: TaxonDigestId(id),
            taxon_id: taxon_id.to_owned(),
            digest_id,
        })
    }

    fn lookup_proteins_by_sequence(
        &mut self,
        sequences: &[String],
    ) -> Result<HashMap<String, Protein>> {
        if sequences.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self
            .client
            .query(
                "SELECT id, sequence, mass FROM proteins WHERE sequence = ANY($1)",
                &[&sequences],
            )
            .map_err(Error::from_postgres)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let sequence: String = row.get(1);
                (
                    sequence.clone(),
                    Protein {
                        id: ProteinId(row.get(0)),
                        sequence,
                        mass: row.get(2),
                    },
                )
            })
            .collect())
    }

    fn lookup_proteins_already_digested(
        &mut self,
        protein_ids: &[ProteinId],
        digest_id: DigestId,
    ) -> Result<HashSet<ProteinId>> {
        if protein_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<i64> = protein_ids.iter().map(|id| id.0).collect();
        let rows = self
            .client
            .query(
                "SELECT protein_id FROM protein_digests \
                 WHERE protein_id = ANY($1) AND digest_id = $2",
                &[&ids, &digest_id.0],
            )
            .map_err(Error::from_postgres)?;
        Ok(rows.into_iter().map(|row| ProteinId(row.get(0))).collect())
    }

    fn lookup_peptides_by_sequence(
        &mut self,
        sequences: &[String],
    ) -> Result<HashMap<String, Peptide>> {
        if sequences.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self
            .client
            .query(
                "SELECT id, sequence, mass FROM peptides WHERE sequence = ANY($1)",
                &[&sequences],
            )
            .map_err(Error::from_postgres)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let sequence: String = row.get(1);
                (
                    sequence.clone(),
                    Peptide {
                        id: PeptideId(row.get(0)),
                        sequence,
                        mass: row.get(2),
                    },
                )
            })
            .collect())
    }

    fn bulk_insert_proteins(&mut self, rows: &[NewProtein]) -> Result<Vec<Protein>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let sequences: Vec<&str> = rows.iter().map(|r| r.sequence.as_str()).collect();
        let masses: Vec<f64> = rows.iter().map(|r| r.mass).collect();
        self.client
            .execute(
                "INSERT INTO proteins (sequence, mass) \
                 SELECT * FROM UNNEST($1::text[], $2::float8[]) \
                 ON CONFLICT (sequence) DO NOTHING",
                &[&sequences, &masses],
            )
            .map_err(Error::from_postgres)?;
        let owned_sequences: Vec<String> = rows.iter().map(|r| r.sequence.clone()).collect();
        let persisted = self.lookup_proteins_by_sequence(&owned_sequences)?;
        Ok(owned_sequences
            .iter()
            .filter_map(|seq| persisted.get(seq).cloned())
            .collect())
    }

    fn bulk_insert_peptides(&mut self, rows: &[NewPeptide]) -> Result<Vec<Peptide>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let sequences: Vec<&str> = rows.iter().map(|r| r.sequence.as_str()).collect();
        let masses: Vec<f64> = rows.iter().map(|r| r.mass).collect();
        self.client
            .execute(
                "INSERT INTO peptides (sequence, mass) \
                 SELECT * FROM UNNEST($1::text[], $2::float8[]) \
                 ON CONFLICT (sequence) DO NOTHING",
                &[&sequences, &masses],
            )
            .map_err(Error::from_postgres)?;
        let owned_sequences: Vec<String> = rows.iter().map(|r| r.sequence.clone()).collect();
        let by_sequence = self.lookup_peptides_by_sequence(&owned_sequences)?;
        Ok(owned_sequences
            .iter()
            .filter_map(|seq| by_sequence.get(seq).cloned())
            .collect())
    }

    fn bulk_insert_protein_digests(
        &mut self,
        rows: &[(ProteinId, DigestId)],
    ) -> Result<Vec<ProteinDigestId>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let protein_ids: Vec<i64> = rows.iter().map(|(p, _)| p.0).collect();
        let digest_ids: Vec<i64> = rows.iter().map(|(_, d)| d.0).collect();
        let inserted = self
            .client
            .query(
                "INSERT INTO protein_digests (protein_id, digest_id) \
                 SELECT * FROM UNNEST($1::bigint[], $2::bigint[]) \
                 ON CONFLICT (protein_id, digest_id) DO NOTHING \
                 RETURNING protein_id, digest_id, id",
                &[&protein_ids, &digest_ids],
            )
            .map_err(Error::from_postgres)?;
        let mut by_pair: HashMap<(i64, i64), i64> = inserted
            .into_iter()
            .map(|row| ((row.get(0), row.get(1)), row.get(2)))
            .collect();
        // Rows that conflicted are already persisted; fetch their ids.
        let missing: Vec<(i64, i64)> = rows
            .iter()
            .map(|(p, d)| (p.0, d.0))
            .filter(|pair| !by_pair.contains_key(pair))
            .collect();
        if !missing.is_empty() {
            let missing_protein_ids: Vec<i64> = missing.iter().map(|(p, _)| *p).collect();
            let missing_digest_ids: Vec<i64> = missing.iter().map(|(_, d)| *d).collect();
            let existing = self
                .client
                .query(
                    "SELECT protein_id, digest_id, id FROM protein_digests \
                     WHERE (protein_id, digest_id) IN ( \
                         SELECT * FROM UNNEST($1::bigint[], $2::bigint[]) \
                     )",
                    &[&missing_protein_ids, &missing_digest_ids],
                )
                .map_err(Error::from_postgres)?;
            by_pair.extend(
                existing
                    .into_iter()
                    .map(|row| ((row.get(0), row.get(1)), row.get(2))),
            );
        }
        rows.iter()
            .map(|(p, d)| {
                by_pair
                    .get(&(p.0, d.0))
                    .map(|id| ProteinDigestId(*id))
                    .ok_or_else(|| {
                        Error::Other(format!(
                            "could not resolve protein_digest id for protein {} digest {}",
                            p, d
                        ))
                    })
            })
            .collect()
    }

    fn bulk_insert_protein_digest_peptides(
        &mut self,
        rows: &[(ProteinDigestId, PeptideId, i64)],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let protein_digest_ids: Vec<i64> = rows.iter().map(|(pd, _, _)| pd.0).collect();
        let peptide_ids: Vec<i64> = rows.iter().map(|(_, p, _)| p.0).collect();
        let counts: Vec<i64> = rows.iter().map(|(_, _, c)| *c).collect();
        self.client
            .execute(
                "INSERT INTO protein_digest_peptides (protein_digest_id, peptide_id, count) \
                 SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[]) \
                 ON CONFLICT (protein_digest_id, peptide_id) DO NOTHING",
                &[&protein_digest_ids, &peptide_ids, &counts],
            )
            .map_err(Error::from_postgres)?;
        Ok(())
    }

    fn bulk_insert_taxon_proteins(
        &mut self,
        rows: &[(String, ProteinId, String)],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let taxon_ids: Vec<&str> = rows.iter().map(|(t, _, _)| t.as_str()).collect();
        let protein_ids: Vec<i64> = rows.iter().map(|(_, p, _)| p.0).collect();
        let metadata: Vec<&str> = rows.iter().map(|(_, _, m)| m.as_str()).collect();
        self.client
            .execute(
                "INSERT INTO taxon_proteins (taxon_id, protein_id, metadata) \
                 SELECT * FROM UNNEST($1::text[], $2::bigint[], $3::text[])",
                &[&taxon_ids, &protein_ids, &metadata],
            )
            .map_err(Error::from_postgres)?;
        Ok(())
    }

    fn bulk_insert_taxon_digest_peptides(
        &mut self,
        rows: &[(TaxonDigestId, PeptideId, i64)],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let taxon_digest_ids: Vec<i64> = rows.iter().map(|(td, _, _)| td.0).collect();
        let peptide_ids: Vec<i64> = rows.iter().map(|(_, p, _)| p.0).collect();
        let counts: Vec<i64> = rows.iter().map(|(_, _, c)| *c).collect();
        self.client
            .execute(
                "INSERT INTO taxon_digest_peptides (taxon_digest_id, peptide_id, count) \
                 SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[]) \
                 ON CONFLICT (taxon_digest_id, peptide_id) DO UPDATE \
                 SET count = EXCLUDED.count",
                &[&taxon_digest_ids, &peptide_ids, &counts],
            )
            .map_err(Error::from_postgres)?;
        Ok(())
    }

    fn aggregate_and_store_taxon_digest_peptides(
        &mut self,
        taxon_id: &str,
        digest_id: DigestId,
        taxon_digest_id: TaxonDigestId,
        batch_size: i64,
        on_batch: &mut dyn FnMut(usize) -> Result<()>,
    ) -> Result<()> {
        let mut txn = self.client.transaction().map_err(Error::from_postgres)?;
        txn.execute(
            "DECLARE taxon_peptide_cursor CURSOR FOR \
             SELECT pdp.peptide_id, SUM(pdp.count) \
             FROM protein_digest_peptides pdp \
             JOIN protein_digests pd ON pd.id = pdp.protein_digest_id \
             JOIN taxon_proteins tp ON tp.protein_id = pd.protein_id \
             WHERE tp.taxon_id = $1 AND pd.digest_id = $2 \
             GROUP BY pdp.peptide_id",
            &[&taxon_id, &digest_id.0],
        )
        .map_err(Error::from_postgres)?;
        loop {
            let rows = txn
                .query(
                    "FETCH FORWARD $1 FROM taxon_peptide_cursor",
                    &[&batch_size],
                )
                .map_err(Error::from_postgres)?;
            if rows.is_empty() {
                break;
            }
            let peptide_ids: Vec<i64> = rows.iter().map(|row| row.get(0)).collect();
            let counts: Vec<i64> = rows.iter().map(|row| row.get(1)).collect();
            let taxon_digest_ids = vec![taxon_digest_id.0; peptide_ids.len()];
            txn.execute(
                "INSERT INTO taxon_digest_peptides (taxon_digest_id, peptide_id, count) \
                 SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[]) \
                 ON CONFLICT (taxon_digest_id, peptide_id) DO UPDATE \
                 SET count = EXCLUDED.count",
                &[&taxon_digest_ids, &peptide_ids, &counts],
            )
            .map_err(Error::from_postgres)?;
            on_batch(rows.len())?;
        }
        txn.execute("CLOSE taxon_peptide_cursor", &[])
            .map_err(Error::from_postgres)?;
        txn.commit().map_err(Error::from_postgres)?;
        Ok(())
    }

    fn delete_taxon_cascade(&mut self, taxon_id: &str) -> Result<()> {
        let mut txn = self.client.transaction().map_err(Error::from_postgres)?;
        txn.execute(
            "DELETE FROM taxon_digest_peptides WHERE taxon_digest_id IN \
             (SELECT id FROM taxon_digests WHERE taxon_id = $1)",
            &[&taxon_id],
        )
        .map_err(Error::from_postgres)?;
        txn.execute("DELETE FROM taxon_digests WHERE taxon_id = $1", &[&taxon_id])
            .map_err(Error::from_postgres)?;
        txn.execute("DELETE FROM taxon_proteins WHERE taxon_id = $1", &[&taxon_id])
            .map_err(Error::from_postgres)?;
        txn.execute("DELETE FROM taxons WHERE id = $1", &[&taxon_id])
            .map_err(Error::from_postgres)?;
        txn.commit().map_err(Error::from_postgres)?;
        Ok(())
    }

    fn query_peptides_by_distance(
        &mut self,
        query: &str,
        max_distance: u32,
        on_match: &mut dyn FnMut(&str, &str, u32) -> Result<()>,
    ) -> Result<()> {
        // Stream every peptide sequence through a server-side cursor and
        // filter by Levenshtein distance in Rust, rather than requiring a
        // Levenshtein UDF on the connection.
        let mut txn = self.client.transaction().map_err(Error::from_postgres)?;
        txn.execute(
            "DECLARE peptide_scan_cursor CURSOR FOR \
             SELECT p.sequence, t.id \
             FROM peptides p \
             JOIN taxon_digest_peptides tdp ON tdp.peptide_id = p.id \
             JOIN taxon_digests td ON td.id = tdp.taxon_digest_id \
             JOIN taxons t ON t.id = td.taxon_id",
            &[],
        )
        .map_err(Error::from_postgres)?;
        loop {
            let rows = txn
                .query("FETCH FORWARD 1000 FROM peptide_scan_cursor", &[])
                .map_err(Error::from_postgres)?;
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                let sequence: String = row.get(0);
                let taxon_id: String = row.get(1);
                let distance = crate::query::levenshtein(query, &sequence);
                if distance <= max_distance {
                    on_match(&taxon_id, &sequence, distance)?;
                }
            }
        }
        txn.execute("CLOSE peptide_scan_cursor", &[])
            .map_err(Error::from_postgres)?;
        txn.commit().map_err(Error::from_postgres)?;
        Ok(())
    }

    fn individual_peptide_count(&mut self, taxon_digest_id: TaxonDigestId) -> Result<i64> {
        let row = self
            .client
            .query_one(
                "SELECT COUNT(DISTINCT peptide_id) FROM taxon_digest_peptides \
                 WHERE taxon_digest_id = $1",
                &[&taxon_digest_id.0],
            )
            .map_err(Error::from_postgres)?;
        Ok(row.get(0))
    }

    fn common_peptide_count(&mut self, taxon_digest_ids: &[TaxonDigestId]) -> Result<i64> {
        let ids: Vec<i64> = taxon_digest_ids.iter().map(|id| id.0).collect();
        let row = self
            .client
            .query_one(
                "SELECT COUNT(*) FROM ( \
                   SELECT peptide_id FROM taxon_digest_peptides \
                   WHERE taxon_digest_id = ANY($1) \
                   GROUP BY peptide_id \
                   HAVING COUNT(DISTINCT taxon_digest_id) = $2 \
                 ) matched",
                &[&ids, &(taxon_digest_ids.len() as i64)],
            )
            .map_err(Error::from_postgres)?;
        Ok(row.get(0))
    }

    fn union_peptide_count(&mut self, taxon_digest_ids: &[TaxonDigestId]) -> Result<i64> {
        let ids: Vec<i64> = taxon_digest_ids.iter().map(|id| id.0).collect();
        let row = self
            .client
            .query_one(
                "SELECT COUNT(DISTINCT peptide_id) FROM taxon_digest_peptides \
                 WHERE taxon_digest_id = ANY($1)",
                &[&ids],
            )
            .map_err(Error::from_postgres)?;
        Ok(row.get(0))
    }

    fn find_taxon_digests(
        &mut self,
        digest_id: DigestId,
        taxon_ids: &[String],
    ) -> Result<Vec<(Taxon, TaxonDigest)>> {
        let rows = self
            .client
            .query(
                "SELECT t.id, td.id FROM taxon_digests td \
                 JOIN taxons t ON t.id = td.taxon_id \
                 WHERE td.digest_id = $1 AND t.id = ANY($2)",
                &[&digest_id.0, &taxon_ids],
            )
            .map_err(Error::from_postgres)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let taxon_id: String = row.get(0);
                (
                    Taxon {
                        id: taxon_id.clone(),
                    },
                    TaxonDigest {
                        id: TaxonDigestId(row.get(1)),
                        taxon_id,
                        digest_id,
                    },
                )
            })
            .collect())
    }
}
