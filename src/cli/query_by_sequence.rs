use std::fs;
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use pepdigest::config;
use pepdigest::query::query_by_sequence;
use pepdigest::store::PostgresGateway;

#[derive(Args)]
pub struct QueryBySequenceArgs {
    #[clap(long = "max-distance", default_value_t = 0)]
    pub max_distance: u32,

    #[clap(
        long,
        conflicts_with = "sequence_file",
        required_unless_present = "sequence_file"
    )]
    pub sequence: Option<String>,

    /// One amino-acid sequence per line.
    #[clap(
        long = "sequence-file",
        value_name = "FILE",
        required_unless_present = "sequence"
    )]
    pub sequence_file: Option<PathBuf>,
}

pub fn run(args: QueryBySequenceArgs) -> anyhow::Result<()> {
    let queries = resolve_queries(&args)?;

    let database_url = config::database_url()?;
    let mut gateway = PostgresGateway::connect(&database_url).context("connecting to store")?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    query_by_sequence(&mut gateway, &queries, args.max_distance, &mut handle)?;
    Ok(())
}

fn resolve_queries(args: &QueryBySequenceArgs) -> anyhow::Result<Vec<String>> {
    if let Some(sequence) = &args.sequence {
        return Ok(vec![sequence.clone()]);
    }
    if let Some(path) = &args.sequence_file {
        let file = fs::File::open(path)
            .with_context(|| format!("opening '{}'", path.display()))?;
        return std::io::BufReader::new(file)
            .lines()
            .map(|line| line.map(|l| l.trim().to_owned()).map_err(anyhow::Error::from))
            .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
            .collect();
    }
    unreachable!("clap requires one of --sequence or --sequence-file")
}
