//! Error types shared by the tree model, the pruning policy and the pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::tree::NodeId;

/// Failures raised by the in-memory gene tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The Newick text could not be parsed into a tree.
    #[error("invalid Newick: {0}")]
    Parse(String),

    /// The node id is out of range or was already removed.
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    /// `remove_leaf` was called on an internal node.
    #[error("node {0} is not a leaf")]
    NotALeaf(NodeId),
}

/// Failures raised while selecting shared taxa and writing pruned trees.
#[derive(Debug, Error)]
pub enum PruneError {
    /// No input tree files were discovered or given.
    #[error("no tree files found")]
    NoInput,

    /// The shared taxon set was requested for zero trees.
    #[error("cannot resolve shared taxa from an empty tree collection")]
    EmptyTreeCollection,

    /// A discovered input is not a valid tree file.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    /// Two inputs would be written to the same output file.
    #[error("{first:?} and {second:?} would both be written to {output:?}")]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// Reading or writing a tree file failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A structural tree edit failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Convenient alias for fallible results returned by the pruning layer.
pub type Result<T> = std::result::Result<T, PruneError>;
