use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Context;
use clap::Args;
use threadpool::ThreadPool;

use pepdigest::config;
use pepdigest::digest::DigestDef;
use pepdigest::ingest::{ingest_file, IngestConfig};
use pepdigest::model::Digest;
use pepdigest::store::{DigestSpec, PostgresGateway, StoreGateway};

#[derive(Args)]
pub struct DigestAndIngestArgs {
    /// JSON file with a Digest definition; defaults to trypsin,
    /// 0 missed cleavages, min 6 acids.
    #[clap(long, value_name = "FILE")]
    pub digest_def: Option<PathBuf>,

    /// One or more FASTA files to ingest.
    #[clap(required = true, num_args = 1..)]
    pub fasta: Vec<PathBuf>,
}

pub fn run(args: DigestAndIngestArgs) -> anyhow::Result<()> {
    let def = config::load_digest_def(args.digest_def.as_deref())
        .context("loading digest definition")?;
    // Compiled once up front just to fail fast on a bad rule; each worker
    // below compiles its own copy since `onig::Regex` isn't `Send`.
    def.compiled_rule().context("compiling cleavage rule")?;

    let database_url = config::database_url()?;
    let mut gateway = PostgresGateway::connect(&database_url).context("connecting to store")?;

    let spec = DigestSpec {
        protease_id: &def.protease.id,
        cleavage_rule: &def.protease.cleavage_rule,
        max_missed_cleavages: def.max_missed_cleavages,
        min_acids: def.min_acids,
        max_acids: def.max_acids,
    };
    let digest = gateway.find_or_create_digest(&spec)?;
    drop(gateway);

    // Files are independent across taxa; Proteins and Peptides are shared
    // and created via natural-key upsert, so distinct workers with distinct
    // store sessions can digest files concurrently.
    let thread_count = num_cpus::get().min(args.fasta.len()).max(1);
    let thread_pool = ThreadPool::new(thread_count);
    let (tx, rx) = mpsc::channel();

    for path in args.fasta.clone() {
        let tx = tx.clone();
        let database_url = database_url.clone();
        let def = def.clone();
        let digest = digest.clone();
        thread_pool.execute(move || {
            let result = run_one(&database_url, &path, &def, &digest);
            tx.send((path, result)).expect("result channel receiver dropped");
        });
    }
    drop(tx);
    thread_pool.join();

    let mut first_error = None;
    for (path, result) in rx {
        if let Err(err) = result {
            let err = err.context(format!("ingesting '{}'", path.display()));
            log::error!("{err:#}");
            first_error.get_or_insert(err);
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn run_one(database_url: &str, path: &PathBuf, def: &DigestDef, digest: &Digest) -> anyhow::Result<()> {
    let cleavage_rule = def.compiled_rule().context("compiling cleavage rule")?;
    let mut gateway = PostgresGateway::connect(database_url).context("connecting to store")?;
    let ingest_config = IngestConfig::default();
    ingest_file(&mut gateway, path, digest, &cleavage_rule, &ingest_config)?;
    Ok(())
}
