//! Shared-taxon selection and pruning policy.
//!
//! Three operations, always applied in this order by the pipeline:
//!
//! 1. [`deduplicate`] (optional): keep one random leaf per taxon in a tree.
//! 2. [`shared_taxa`]: intersect the taxon sets of all trees.
//! 3. [`prune`]: drop every leaf whose taxon is not shared.
//!
//! Deduplicating before the intersection matters only for the leaf counts
//! (a taxon present twice is still present), but resolving before any
//! pruning guarantees that every tree is cut against the same reference set.
//!
//! # Example
//! ```text
//! A = (x_gene1, y_gene1, z_gene1)
//! B = (x_gene2, y_gene2)
//! C = (x_gene1, w_gene1)
//!
//! shared_taxa([A, B, C]) = {x}
//! prune → A = x_gene1;  B = x_gene2;  C = x_gene1;
//! ```

use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::error::{PruneError, TreeError};
use crate::taxon::Normalizer;
use crate::tree::{GeneTree, NodeId};

/// Taxon identifiers present among a tree's current leaves.
pub fn taxa(tree: &GeneTree, normalizer: &Normalizer) -> BTreeSet<String> {
    tree.leaf_labels()
        .into_iter()
        .map(|label| normalizer.normalize(label).to_string())
        .collect()
}

/// Keep exactly one leaf per taxon, chosen uniformly at random.
///
/// Leaves are grouped by taxon identifier in preorder and groups are visited
/// in identifier order, so a seeded `rng` gives the same survivors on every
/// run. Survivors keep their raw label. Returns the number of leaves removed.
pub fn deduplicate<R: Rng>(
    tree: &mut GeneTree,
    normalizer: &Normalizer,
    rng: &mut R,
) -> Result<usize, TreeError> {
    let mut groups: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for id in tree.leaves() {
        let taxon = normalizer.normalize(tree.label(id).unwrap_or(""));
        groups.entry(taxon).or_default().push(id);
    }

    let mut doomed: Vec<NodeId> = Vec::new();
    for (taxon, members) in &groups {
        if members.len() < 2 {
            continue;
        }
        let survivor = rng.random_range(0..members.len());
        debug!(taxon = %taxon, copies = members.len(), kept = ?tree.label(members[survivor]), "deduplicating taxon");
        doomed.extend(
            members
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != survivor)
                .map(|(_, &id)| id),
        );
    }

    // Collected up front: removals splice internal nodes out of the tree.
    for &id in &doomed {
        tree.remove_leaf(id)?;
    }
    Ok(doomed.len())
}

/// Taxon identifiers present as a leaf in every tree.
///
/// The result does not depend on the order of `trees`.
///
/// # Errors
/// `PruneError::EmptyTreeCollection` when `trees` yields nothing: the
/// intersection of zero sets has no meaningful value here.
pub fn shared_taxa<'a, I>(trees: I, normalizer: &Normalizer) -> Result<BTreeSet<String>, PruneError>
where
    I: IntoIterator<Item = &'a GeneTree>,
{
    let mut sets: Vec<HashSet<&str>> = trees
        .into_iter()
        .map(|tree| {
            tree.leaves()
                .into_iter()
                .map(move |id| normalizer.normalize(tree.label(id).unwrap_or("")))
                .collect()
        })
        .collect();

    if sets.is_empty() {
        return Err(PruneError::EmptyTreeCollection);
    }

    // Start from the smallest set so each pass only shrinks it.
    let smallest = sets
        .iter()
        .enumerate()
        .min_by_key(|(_, set)| set.len())
        .map(|(k, _)| k)
        .unwrap_or(0);
    let mut shared = sets.swap_remove(smallest);
    for set in &sets {
        shared.retain(|taxon| set.contains(taxon));
    }

    Ok(shared.into_iter().map(str::to_string).collect())
}

/// Remove every leaf whose taxon identifier is not in `keep`.
///
/// Returns the number of leaves removed. Pruning twice with the same `keep`
/// removes nothing the second time.
pub fn prune(tree: &mut GeneTree, keep: &BTreeSet<String>, normalizer: &Normalizer) -> Result<usize, TreeError> {
    let doomed: Vec<NodeId> = tree
        .leaves()
        .into_iter()
        .filter(|&id| !keep.contains(normalizer.normalize(tree.label(id).unwrap_or(""))))
        .collect();

    for &id in &doomed {
        tree.remove_leaf(id)?;
    }
    Ok(doomed.len())
}
