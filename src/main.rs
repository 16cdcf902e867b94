//! lloydkm CLI
//!
//! Clusters the samples of a delimited text file (one sample per line) and prints the resulting centroids.
//! The number of clusters is asked for on stdin when it is not given on the command line.

use std::{io::{self, BufRead, Write}, path::PathBuf, time::Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};

use lloydkm::{DataLoader, KMeans, KMeansConfig, LoadedSamples, Report};

/// Lloyd k-means clustering of delimited numeric data
#[derive(Parser, Debug)]
#[command(name = "lloydkm", version, about)]
struct Cli {
    /// Input file, one sample per line
    path: PathBuf,

    /// Number of clusters (prompted for when omitted)
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Give up when the centroids still move after this many iterations
    #[arg(long, default_value_t = 10_000)]
    max_iter: usize,

    /// Seed for the random generator (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn prompt_clusters() -> Result<usize> {
    print!("Enter the number of clusters: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    line.trim().parse().with_context(|| format!("not a number of clusters: {:?}", line.trim()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if !cli.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got {:?}", cli.delimiter);
    }
    let k = match cli.clusters {
        Some(k) => k,
        None => prompt_clusters()?,
    };

    let started = Instant::now();
    let loaded: LoadedSamples<f64> = DataLoader::new()
        .delimiter(cli.delimiter as u8)
        .load_path(&cli.path)
        .with_context(|| format!("failed to load {}", cli.path.display()))?;
    let (loaded_cnt, skipped_cnt) = (loaded.sample_cnt, loaded.skipped_cnt());
    let kmean = loaded.into_kmeans()?;

    let rnd = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let conf = KMeansConfig::build().random_generator(rnd).build();
    let result = kmean.kmeans_lloyd(k, cli.max_iter, KMeans::init_random_sample, &conf)?;

    print!("{}", Report::new(&result)
        .loaded(loaded_cnt)
        .skipped(skipped_cnt)
        .elapsed(started.elapsed()));
    Ok(())
}
