use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use find_simpairs::{Method, SearchConfig, SignatureWidth, Verification};

#[derive(Parser, Debug)]
#[clap(
    name = "find-simpairs",
    about = "A program to find all pairs of similar documents in the Jaccard space."
)]
struct Args {
    /// File path to a TSV file of documents, one `<ignored>\t<id>\t<text>` per line.
    #[clap(short = 'i', long)]
    input_file: PathBuf,

    /// Search method, `bf` (brute force) or `lsh`.
    #[clap(short = 'm', long, default_value = "lsh")]
    method: Method,

    /// Pairs more similar than this value in (0,1) are reported.
    #[clap(short = 't', long)]
    threshold: f64,

    /// Number of tokens in one shingle (must be more than 0).
    #[clap(short = 'w', long)]
    shingle_length: usize,

    /// Delimiter for recognizing words as tokens in shingling.
    /// If None, characters are used for tokens.
    #[clap(short = 'd', long)]
    delimiter: Option<char>,

    /// Size of the shingle id domain.
    #[clap(long, default_value = "1000")]
    num_shingles: usize,

    /// Number of hash functions, required for the lsh method.
    #[clap(long)]
    num_hashes: Option<usize>,

    /// Number of bands dividing the number of hash functions, required for the lsh method.
    #[clap(long)]
    num_bands: Option<usize>,

    /// Number of buckets per band.
    #[clap(long, default_value = "2000")]
    num_buckets: usize,

    /// Seed value for random values.
    #[clap(short = 's', long, default_value = "1234")]
    seed: u64,

    /// Maximum number of documents to read.
    #[clap(long)]
    max_documents: Option<usize>,

    /// Integer width of signature cells, `narrow` (16 bits) or `wide` (32 bits).
    #[clap(long, default_value = "wide")]
    width: SignatureWidth,

    /// Measure confirming candidate pairs, `signatures` or `shingles`.
    #[clap(long, default_value = "signatures")]
    verification: Verification,

    /// File path to write the pairs to. If None, the standard output is used.
    #[clap(short = 'o', long)]
    output_file: Option<PathBuf>,

    /// Disables parallel construction and search.
    #[clap(short = 'p', long)]
    disable_parallel: bool,
}

fn main() -> anyhow::Result<()> {
    find_simpairs_cli::init_tracing();
    let args = Args::parse();

    let mut config = SearchConfig::new(args.method, args.threshold, args.shingle_length);
    config.delimiter = args.delimiter;
    config.num_shingles = args.num_shingles;
    config.num_hashes = args.num_hashes;
    config.num_bands = args.num_bands;
    config.num_buckets = args.num_buckets;
    config.seed = args.seed;
    config.max_documents = args.max_documents;
    config.width = args.width;
    config.verification = args.verification;
    config.in_parallel = !args.disable_parallel;

    let mut source = config.open_tsv(&args.input_file)?;

    tracing::info!(threshold = config.threshold, "searching similar pairs");
    let start = Instant::now();
    let pairs = config.find_similar_pairs(&mut source)?;
    tracing::info!(
        pairs = pairs.len(),
        elapsed_sec = start.elapsed().as_secs_f64(),
        "done"
    );

    let mut writer: Box<dyn Write> = match &args.output_file {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    for pair in &pairs {
        writeln!(writer, "{pair}")?;
    }
    writer.flush()?;

    Ok(())
}
