use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use hashbrown::HashSet;
use lsh::{SignatureMatrix, UniversalHashFamily};
use rayon::prelude::*;

use find_simpairs::{Method, SearchConfig, ShingleSource};

const MAX_HASHES: usize = 100;

#[derive(Parser, Debug)]
#[clap(
    name = "find-simpairs-minhash_acc",
    about = "A program to test mean absolute errors of MinHash signatures."
)]
struct Args {
    /// File path to a TSV file of documents, one `<ignored>\t<id>\t<text>` per line.
    #[clap(short = 'i', long)]
    input_file: PathBuf,

    /// Number of tokens in one shingle (must be more than 0).
    #[clap(short = 'w', long, default_value = "3")]
    shingle_length: usize,

    /// Delimiter for recognizing words as tokens in shingling.
    /// If None, characters are used for tokens.
    #[clap(short = 'd', long)]
    delimiter: Option<char>,

    /// Size of the shingle id domain.
    #[clap(long, default_value = "1000000")]
    num_shingles: usize,

    /// Maximum number of documents to read.
    #[clap(long)]
    max_documents: Option<usize>,

    /// Seed value for random values.
    #[clap(short = 's', long, default_value = "1234")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    find_simpairs_cli::init_tracing();
    let args = Args::parse();

    let mut config = SearchConfig::new(Method::BruteForce, 0.5, args.shingle_length);
    config.delimiter = args.delimiter;
    config.num_shingles = args.num_shingles;
    config.max_documents = args.max_documents;
    config.seed = args.seed;

    let mut source = config.open_tsv(&args.input_file)?;
    let sets: Vec<HashSet<u32>> = source
        .read_all()?
        .into_iter()
        .map(|document| document.shingles)
        .collect();
    let n = sets.len();
    if n < 2 {
        anyhow::bail!("At least two documents are needed, but got {n}.");
    }
    tracing::info!(documents = n, pairs = n * (n - 1) / 2, "loaded documents");

    let start = Instant::now();
    let family = UniversalHashFamily::new(MAX_HASHES, source.num_shingles(), args.seed)?;
    let table = family.table_in_parallel::<u32>()?;
    let signatures = SignatureMatrix::from_sets_in_parallel(&sets, &table)?;
    tracing::info!(
        elapsed_sec = start.elapsed().as_secs_f64(),
        "produced signatures"
    );

    let start = Instant::now();
    let exact: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let sets = &sets;
            (i + 1..n).map(move |j| lsh::jaccard_similarity_of_sets(&sets[i], &sets[j]))
        })
        .collect();
    tracing::info!(
        elapsed_sec = start.elapsed().as_secs_f64(),
        "computed exact similarities"
    );

    println!("num_hashes,mean_absolute_error");
    for num_hashes in 1..=MAX_HASHES {
        let sum_error: f64 = (0..n)
            .into_par_iter()
            .map(|i| {
                let offset = i * (2 * n - i - 1) / 2;
                (i + 1..n)
                    .map(|j| {
                        let estimate = prefix_similarity(&signatures, i, j, num_hashes);
                        (exact[offset + j - i - 1] - estimate).abs()
                    })
                    .sum::<f64>()
            })
            .sum();
        let mae = sum_error / exact.len() as f64;
        println!("{num_hashes},{mae}");
    }

    Ok(())
}

/// Estimates the similarity from the first `num_hashes` signature cells.
fn prefix_similarity(
    signatures: &SignatureMatrix<u32>,
    i: usize,
    j: usize,
    num_hashes: usize,
) -> f64 {
    if signatures.is_empty_row(i) && signatures.is_empty_row(j) {
        return 0.;
    }
    let xs = &signatures.row(i)[..num_hashes];
    let ys = &signatures.row(j)[..num_hashes];
    let agree = xs.iter().zip(ys).filter(|(x, y)| x == y).count();
    agree as f64 / num_hashes as f64
}
