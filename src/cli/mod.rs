pub mod clear_taxon_data;
pub mod digest_and_ingest;
pub mod generate_redundancy_tables;
pub mod query_by_sequence;

use clap::{Parser, Subcommand};

use clear_taxon_data::ClearTaxonDataArgs;
use digest_and_ingest::DigestAndIngestArgs;
use generate_redundancy_tables::GenerateRedundancyTablesArgs;
use query_by_sequence::QueryBySequenceArgs;

#[derive(Parser)]
#[clap(author, version, about = "In silico proteolytic digestion, ingest, and redundancy analysis over a Postgres store.")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Digest one or more FASTA files and ingest the resulting peptides.
    #[clap(name = "digest_and_ingest")]
    DigestAndIngest(DigestAndIngestArgs),
    /// Compute pairwise peptide-set redundancy tables for a set of taxons.
    #[clap(name = "generate_redundancy_tables")]
    GenerateRedundancyTables(GenerateRedundancyTablesArgs),
    /// Find peptides within a bounded edit distance of a query sequence.
    #[clap(name = "query_by_sequence")]
    QueryBySequence(QueryBySequenceArgs),
    /// Delete a taxon and everything derived from it.
    #[clap(name = "clear_taxon_data")]
    ClearTaxonData(ClearTaxonDataArgs),
}

impl Command {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Command::DigestAndIngest(args) => digest_and_ingest::run(args),
            Command::GenerateRedundancyTables(args) => generate_redundancy_tables::run(args),
            Command::QueryBySequence(args) => query_by_sequence::run(args),
            Command::ClearTaxonData(args) => clear_taxon_data::run(args),
        }
    }
}
