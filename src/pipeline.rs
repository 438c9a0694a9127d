//! Batch orchestration: load every tree, resolve shared taxa, write pruned trees.
//!
//! ```text
//! inputs ──parse (parallel)──► trees ──[deduplicate]──► shared_taxa ──► prune ──► write
//! ```
//!
//! All parses are joined before anything else happens; deduplication,
//! resolution and pruning run sequentially in input order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{PruneError, Result};
use crate::io::{OutputNaming, read_gene_tree, write_gene_tree};
use crate::prune::{deduplicate, prune, shared_taxa};
use crate::taxon::Normalizer;
use crate::tree::GeneTree;

/// Everything a pruning run needs; nothing is read from ambient state.
#[derive(Debug, Clone, Default)]
pub struct PruneConfig {
    /// Tree files to process, in order.
    pub inputs: Vec<PathBuf>,
    /// Keep one random leaf per taxon before resolving shared taxa.
    pub deduplicate: bool,
    /// Seed for the deduplication tie-break; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub normalizer: Normalizer,
    pub naming: OutputNaming,
}

/// One pruned tree written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTree {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Leaves left after pruning.
    pub leaves: usize,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub trees_loaded: usize,
    pub duplicates_removed: usize,
    pub shared_taxa: BTreeSet<String>,
    pub outputs: Vec<WrittenTree>,
}

impl RunReport {
    /// No taxon is common to all trees; every output is an empty tree.
    pub fn is_empty_intersection(&self) -> bool {
        self.shared_taxa.is_empty()
    }
}

/// Parse all files in parallel; any failure aborts the whole batch.
pub fn load_trees(paths: &[PathBuf]) -> Result<Vec<GeneTree>> {
    paths.par_iter().map(read_gene_tree).collect()
}

/// Random source for deduplication, or `None` when it is disabled.
pub fn dedup_rng(enabled: bool, seed: Option<u64>) -> Option<StdRng> {
    enabled.then(|| match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    })
}

/// Outcome of [`prune_to_shared`] on in-memory trees.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneOutcome {
    pub shared_taxa: BTreeSet<String>,
    pub duplicates_removed: usize,
    pub leaves_removed: usize,
}

/// Output path of every input, in input order.
///
/// # Errors
/// `OutputCollision` when two inputs map to the same output file.
pub fn output_paths(inputs: &[PathBuf], naming: &OutputNaming) -> Result<Vec<PathBuf>> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::with_capacity(inputs.len());
    let mut outputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let output = naming.output_path(input);
        if let Some(first) = claimed.insert(output.clone(), input.as_path()) {
            return Err(PruneError::OutputCollision {
                output,
                first: first.to_path_buf(),
                second: input.clone(),
            });
        }
        outputs.push(output);
    }
    Ok(outputs)
}

/// Deduplicate (when `rng` is given), resolve and prune `trees` in place.
///
/// # Errors
/// `EmptyTreeCollection` for an empty slice.
pub fn prune_to_shared(
    trees: &mut [GeneTree],
    normalizer: &Normalizer,
    rng: Option<&mut StdRng>,
) -> Result<PruneOutcome> {
    let mut duplicates_removed = 0;
    if let Some(rng) = rng {
        for tree in trees.iter_mut() {
            duplicates_removed += deduplicate(tree, normalizer, rng)?;
        }
        debug!(duplicates_removed, "deduplicated trees");
    }

    let shared = shared_taxa(trees.iter(), normalizer)?;
    if shared.is_empty() {
        warn!(trees = trees.len(), "no taxon is shared by all trees; every pruned tree will be empty");
    }

    let mut leaves_removed = 0;
    for tree in trees.iter_mut() {
        leaves_removed += prune(tree, &shared, normalizer)?;
    }

    Ok(PruneOutcome { shared_taxa: shared, duplicates_removed, leaves_removed })
}

/// Run the whole batch described by `config`.
///
/// # Errors
/// - `NoInput` when `config.inputs` is empty;
/// - `OutputCollision` when two inputs share an output path, before any
///   file is read;
/// - `Parse` / `Io` for the first file that cannot be read or written.
pub fn run(config: &PruneConfig) -> Result<RunReport> {
    if config.inputs.is_empty() {
        return Err(PruneError::NoInput);
    }
    let output_files = output_paths(&config.inputs, &config.naming)?;

    let mut trees = load_trees(&config.inputs)?;
    info!(trees = trees.len(), "loaded trees");

    let mut rng = dedup_rng(config.deduplicate, config.seed);
    let outcome = prune_to_shared(&mut trees, &config.normalizer, rng.as_mut())?;
    info!(shared = outcome.shared_taxa.len(), leaves_removed = outcome.leaves_removed, "resolved shared taxa");

    if let Some(dir) = &config.naming.dir {
        fs::create_dir_all(dir).map_err(|source| PruneError::Io { path: dir.clone(), source })?;
    }

    let mut outputs = Vec::with_capacity(trees.len());
    for ((input, output), tree) in config.inputs.iter().zip(output_files).zip(&trees) {
        write_gene_tree(&output, tree)?;
        debug!(input = %input.display(), output = %output.display(), leaves = tree.n_leaves(), "wrote pruned tree");
        outputs.push(WrittenTree { input: input.clone(), output, leaves: tree.n_leaves() });
    }

    Ok(RunReport {
        trees_loaded: trees.len(),
        duplicates_removed: outcome.duplicates_removed,
        shared_taxa: outcome.shared_taxa,
        outputs,
    })
}
