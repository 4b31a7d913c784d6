use std::fs;
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use pepdigest::clear_taxon::clear_taxons;
use pepdigest::config;
use pepdigest::store::PostgresGateway;

#[derive(Args)]
pub struct ClearTaxonDataArgs {
    #[clap(
        long = "taxon-ids",
        num_args = 1..,
        conflicts_with = "taxon_ids_file",
        required_unless_present = "taxon_ids_file"
    )]
    pub taxon_ids: Option<Vec<String>>,

    /// One taxon id per line.
    #[clap(
        long = "taxon-ids-file",
        value_name = "FILE",
        required_unless_present = "taxon_ids"
    )]
    pub taxon_ids_file: Option<PathBuf>,
}

pub fn run(args: ClearTaxonDataArgs) -> anyhow::Result<()> {
    let taxon_ids = resolve_taxon_ids(&args)?;
    if taxon_ids.is_empty() {
        anyhow::bail!("no taxon ids were given");
    }

    println!("You are about to delete the following taxons:\n");
    for id in &taxon_ids {
        println!("{id}");
    }
    println!();
    print!("Type 'yes' and hit enter if this is really what you want to do: ");
    std::io::Write::flush(&mut std::io::stdout()).ok();

    let mut confirmation = String::new();
    std::io::stdin().read_line(&mut confirmation)?;
    if confirmation.trim() != "yes" {
        log::info!("did not receive 'yes', nothing was done");
        return Ok(());
    }

    let database_url = config::database_url()?;
    let mut gateway = PostgresGateway::connect(&database_url).context("connecting to store")?;
    clear_taxons(&mut gateway, &taxon_ids)?;
    Ok(())
}

fn resolve_taxon_ids(args: &ClearTaxonDataArgs) -> anyhow::Result<Vec<String>> {
    if let Some(ids) = &args.taxon_ids {
        return Ok(ids.clone());
    }
    if let Some(path) = &args.taxon_ids_file {
        let file = fs::File::open(path)
            .with_context(|| format!("opening '{}'", path.display()))?;
        return std::io::BufReader::new(file)
            .lines()
            .map(|line| line.map(|l| l.trim().to_owned()).map_err(anyhow::Error::from))
            .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
            .collect();
    }
    unreachable!("clap requires one of --taxon-ids or --taxon-ids-file")
}
