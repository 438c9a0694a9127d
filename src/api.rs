//! Python binding layer for shared-taxon pruning.
//!
//! Provides Python functions for pruning gene-tree files, or in-memory
//! Newick strings, to the taxa present in all of them.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::path::PathBuf;

use crate::error::PruneError;
use crate::io::{OutputNaming, parse_gene_tree};
use crate::pipeline::{PruneConfig, dedup_rng, prune_to_shared, run};
use crate::taxon::Normalizer;
use crate::tree::GeneTree;

fn to_py_err(e: PruneError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Prune tree files to their shared taxa and write `<stem><suffix>.tree` files.
///
/// Args:
///     paths: List of Newick tree files
///     dedup: Keep one random leaf per taxon before resolving (default: False)
///     seed: Seed for the deduplication tie-break (default: None)
///     marker: Marker preceding the gene index in leaf labels (default: "_gene")
///     suffix: Suffix appended to output file stems (default: "_pruned")
///
/// Returns:
///     A tuple of (shared_taxa, output_paths)
///
/// Raises:
///     ValueError: If no paths are given, a file cannot be parsed or written
#[pyfunction]
#[pyo3(name = "prune_to_shared", signature = (paths, dedup=false, seed=None, marker="_gene", suffix="_pruned"))]
fn prune_files(
    paths: Vec<String>,
    dedup: bool,
    seed: Option<u64>,
    marker: &str,
    suffix: &str,
) -> PyResult<(Vec<String>, Vec<String>)> {
    let config = PruneConfig {
        inputs: paths.into_iter().map(PathBuf::from).collect(),
        deduplicate: dedup,
        seed,
        normalizer: Normalizer::new(marker),
        naming: OutputNaming { suffix: suffix.to_string(), ..OutputNaming::default() },
    };
    let report = run(&config).map_err(to_py_err)?;

    let outputs = report
        .outputs
        .iter()
        .map(|w| w.output.to_string_lossy().into_owned())
        .collect();
    Ok((report.shared_taxa.into_iter().collect(), outputs))
}

/// Prune Newick strings to their shared taxa.
///
/// Args:
///     newicks: List of Newick strings
///     dedup: Keep one random leaf per taxon before resolving (default: False)
///     seed: Seed for the deduplication tie-break (default: None)
///
/// Returns:
///     A tuple of (shared_taxa, pruned_newicks)
///
/// Raises:
///     ValueError: If the list is empty or a string is not valid Newick
#[pyfunction]
#[pyo3(signature = (newicks, dedup=false, seed=None))]
fn shared_taxa(
    newicks: Vec<String>,
    dedup: bool,
    seed: Option<u64>,
) -> PyResult<(Vec<String>, Vec<String>)> {
    let mut trees: Vec<GeneTree> = newicks
        .iter()
        .enumerate()
        .map(|(idx, newick)| {
            parse_gene_tree(newick)
                .map_err(|e| PyValueError::new_err(format!("Tree {idx} is not valid Newick: {e}")))
        })
        .collect::<PyResult<_>>()?;

    let mut rng = dedup_rng(dedup, seed);
    let outcome = prune_to_shared(&mut trees, &Normalizer::default(), rng.as_mut()).map_err(to_py_err)?;

    let pruned = trees.iter().map(GeneTree::to_newick).collect();
    Ok((outcome.shared_taxa.into_iter().collect(), pruned))
}

/// Python module definition
#[pymodule]
fn rust_python_tree_prune(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(prune_files, m)?)?;
    m.add_function(wrap_pyfunction!(shared_taxa, m)?)?;
    Ok(())
}
