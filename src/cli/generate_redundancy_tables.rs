use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use pepdigest::config;
use pepdigest::digest::DigestDef;
use pepdigest::error::Error;
use pepdigest::redundancy::{compute_redundancy_tables, write_csv_files};
use pepdigest::store::{DigestSpec, PostgresGateway, StoreGateway};

#[derive(Args)]
pub struct GenerateRedundancyTablesArgs {
    #[clap(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    #[clap(
        long = "taxon-ids",
        num_args = 1..,
        conflicts_with = "taxon_id_file",
        required_unless_present = "taxon_id_file"
    )]
    pub taxon_ids: Option<Vec<String>>,

    /// CSV file, one taxon id in the first field of each row.
    #[clap(
        long = "taxon-id-file",
        value_name = "FILE",
        required_unless_present = "taxon_ids"
    )]
    pub taxon_id_file: Option<PathBuf>,
}

pub fn run(args: GenerateRedundancyTablesArgs) -> anyhow::Result<()> {
    let taxon_ids = resolve_taxon_ids(&args)?;

    let database_url = config::database_url()?;
    let mut gateway = PostgresGateway::connect(&database_url).context("connecting to store")?;

    // Always scoped to the default digest; this subcommand never took a
    // digest definition option.
    let def = DigestDef::default();
    let spec = DigestSpec {
        protease_id: &def.protease.id,
        cleavage_rule: &def.protease.cleavage_rule,
        max_missed_cleavages: def.max_missed_cleavages,
        min_acids: def.min_acids,
        max_acids: def.max_acids,
    };
    let digest = gateway
        .find_digest(&spec)?
        .ok_or(Error::DigestNotFound)?;

    let tables = compute_redundancy_tables(&mut gateway, digest.id, &taxon_ids)?;

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating '{}'", args.output_dir.display()))?;
    write_csv_files(&tables, &args.output_dir)?;
    Ok(())
}

fn resolve_taxon_ids(args: &GenerateRedundancyTablesArgs) -> anyhow::Result<Vec<String>> {
    if let Some(ids) = &args.taxon_ids {
        return Ok(ids.clone());
    }
    if let Some(path) = &args.taxon_id_file {
        let file = fs::File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(file);
        let mut ids = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("reading '{}'", path.display()))?;
            if let Some(id) = record.get(0) {
                let id = id.trim();
                if !id.is_empty() {
                    ids.push(id.to_owned());
                }
            }
        }
        return Ok(ids);
    }
    unreachable!("clap requires one of --taxon-ids or --taxon-id-file")
}
