use clap::Parser;
use rust_python_tree_prune::error::PruneError;
use rust_python_tree_prune::io::{DEFAULT_EXTENSIONS, OutputNaming, discover_tree_files};
use rust_python_tree_prune::pipeline::{PruneConfig, run};
use rust_python_tree_prune::taxon::{DEFAULT_MARKER, Normalizer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Prune a set of gene trees (Newick) down to the taxa present in all of them.
/// Leaf labels are compared after removing a trailing `_gene<N>` suffix.
#[derive(Parser, Debug)]
#[command(name = "tree-prune", version, about = "Prune gene trees to their shared taxa")]
struct Args {
    /// Directory searched for tree files when no --input is given
    #[arg(short = 'd', long = "dir", default_value = ".")]
    dir: PathBuf,

    /// Explicit tree file(s); disables directory discovery
    #[arg(short = 'i', long = "input")]
    inputs: Vec<PathBuf>,

    /// File extension(s) picked up during discovery (".gz" variants included)
    #[arg(short = 'e', long = "ext", default_values_t = DEFAULT_EXTENSIONS.map(String::from))]
    extensions: Vec<String>,

    /// Keep one random leaf per taxon before resolving shared taxa
    #[arg(long = "dedup", default_value_t = false)]
    dedup: bool,

    /// Seed for the deduplication tie-break (reproducible runs)
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Marker preceding the gene index in leaf labels
    #[arg(long = "marker", default_value = DEFAULT_MARKER)]
    marker: String,

    /// Suffix appended to the input stem for output files
    #[arg(long = "suffix", default_value = "_pruned")]
    suffix: String,

    /// Extension of output files
    #[arg(long = "out-ext", default_value = "tree")]
    out_ext: String,

    /// Directory for output files (defaults to each input's directory)
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Gzip-compress output files (appends ".gz")
    #[arg(long = "compress", default_value_t = false)]
    compress: bool,

    /// Quiet mode: suppresses progress messages on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    let naming = OutputNaming {
        suffix: args.suffix.clone(),
        extension: args.out_ext.clone(),
        compress: args.compress,
        dir: args.out_dir.clone(),
    };

    let inputs = if args.inputs.is_empty() {
        match discover_tree_files(&args.dir, &args.extensions, &naming) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("Failed to list tree files: {e}");
                std::process::exit(1);
            }
        }
    } else {
        args.inputs.clone()
    };

    let config = PruneConfig {
        inputs,
        deduplicate: args.dedup,
        seed: args.seed,
        normalizer: Normalizer::new(args.marker.clone()),
        naming,
    };

    let report = match run(&config) {
        Ok(report) => report,
        Err(PruneError::NoInput) => {
            log_if(!args.quiet, "No tree files found.".to_string());
            return;
        }
        Err(e @ PruneError::Parse { .. }) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
        Err(e @ PruneError::Io { .. }) => {
            eprintln!("{e}");
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    log_if(!args.quiet, format!("Loaded {} trees.", report.trees_loaded));
    if args.dedup {
        log_if(!args.quiet, format!("Removed {} duplicate leaves.", report.duplicates_removed));
    }
    log_if(!args.quiet, format!("Found {} shared taxa.", report.shared_taxa.len()));
    if report.is_empty_intersection() {
        eprintln!("Warning: no taxon is shared by all trees; pruned trees are empty.");
    }
    for written in &report.outputs {
        log_if(!args.quiet, format!("Pruned tree saved to: {}", written.output.display()));
    }
}

fn log_if(show: bool, msg: String) {
    if show { println!("{}", msg); }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
